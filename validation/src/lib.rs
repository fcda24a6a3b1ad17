use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wavedma_core::core::{Bus, BusMaster, BusMasterComponent, BusRequest};
use wavedma_core::device::{ConfigWord, SampleRam, WavePlayer};
use wavedma_machines::registry::PatternEntry;
use wavedma_machines::sample_image::SampleImage;

// --- TracingBus: memory port responder with edge-by-edge recording ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusCycle {
    /// Position in the trace.
    pub edge: u64,
    /// Address presented while the strobe is asserted.
    pub addr: Option<u32>,
    pub write: bool,
    /// Data returned on the acknowledge edge.
    pub ack: Option<u32>,
}

pub struct TracingBus<B> {
    pub inner: B,
    pub cycles: Vec<BusCycle>,
}

pub type TracingRam = TracingBus<SampleRam>;

impl<B> TracingBus<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            cycles: Vec::new(),
        }
    }

    pub fn clear_cycles(&mut self) {
        self.cycles.clear();
    }

    /// Acknowledged reads, in order.
    pub fn acked_addresses(&self) -> Vec<u32> {
        self.cycles
            .iter()
            .filter(|c| c.ack.is_some())
            .filter_map(|c| c.addr)
            .collect()
    }
}

impl<B: Bus<Address = u32, Data = u32>> Bus for TracingBus<B> {
    type Address = u32;
    type Data = u32;

    fn cycle(&mut self, master: BusMaster, request: Option<BusRequest<u32, u32>>) -> Option<u32> {
        let ack = self.inner.cycle(master, request);
        self.cycles.push(BusCycle {
            edge: self.cycles.len() as u64,
            addr: request.map(|r| r.addr),
            write: request.is_some_and(|r| r.is_write()),
            ack,
        });
        ack
    }
}

// --- Memory port protocol ---

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("edge {edge}: address {addr} outside 0..{bound}")]
    OutOfRange { edge: u64, addr: u32, bound: u8 },

    #[error("edge {edge}: request for {expected} changed to {actual} before acknowledge")]
    RequestChanged { edge: u64, expected: u32, actual: u32 },

    #[error("edge {edge}: request for {addr} dropped before acknowledge")]
    RequestDropped { edge: u64, addr: u32 },

    #[error("edge {edge}: write to {addr} on a read-only port")]
    UnexpectedWrite { edge: u64, addr: u32 },
}

/// Verify a memory port trace: every request is held unchanged until it is
/// acknowledged, only reads are issued, and every address is below `bound`.
pub fn check_protocol(cycles: &[BusCycle], bound: u8) -> Result<(), ProtocolViolation> {
    let mut pending: Option<u32> = None;
    for cycle in cycles {
        let edge = cycle.edge;
        match (pending, cycle.addr) {
            (Some(addr), None) => return Err(ProtocolViolation::RequestDropped { edge, addr }),
            (Some(expected), Some(actual)) if actual != expected => {
                return Err(ProtocolViolation::RequestChanged {
                    edge,
                    expected,
                    actual,
                });
            }
            _ => {}
        }
        if let Some(addr) = cycle.addr {
            if cycle.write {
                return Err(ProtocolViolation::UnexpectedWrite { edge, addr });
            }
            if addr >= u32::from(bound) {
                return Err(ProtocolViolation::OutOfRange { edge, addr, bound });
            }
        }
        pending = match (cycle.addr, cycle.ack) {
            (Some(addr), None) => Some(addr),
            _ => None,
        };
    }
    Ok(())
}

// --- Running the controller against a traced responder ---

/// Output and memory traffic of one run.
pub struct Recording {
    /// (edges after the configuration write, DAC code) per driven sample.
    pub samples: Vec<(u64, u8)>,
    pub trace: Vec<BusCycle>,
    pub stall_cycles: u64,
}

/// One edge: controller first, then the configuration port.
pub fn clock<B: Bus<Address = u32, Data = u32> + 'static>(
    player: &mut WavePlayer,
    bus: &mut B,
    host: Option<BusRequest<u32, u32>>,
) -> (bool, Option<u32>) {
    let driven = player.tick_with_bus(bus, BusMaster::Sequencer);
    let ack = player.cycle(BusMaster::Host, host);
    (driven, ack)
}

/// Five edges in reset, five out.
pub fn reset_pulse<B: Bus<Address = u32, Data = u32> + 'static>(
    player: &mut WavePlayer,
    bus: &mut B,
) {
    player.set_reset(true);
    for _ in 0..5 {
        clock(player, bus, None);
    }
    player.set_reset(false);
    for _ in 0..5 {
        clock(player, bus, None);
    }
}

/// Reset a fresh controller, write `word`, then clock until `count` samples
/// are driven or `max_edges` edges pass.
pub fn record_playback<B: Bus<Address = u32, Data = u32> + 'static>(
    bus: &mut TracingBus<B>,
    word: ConfigWord,
    count: usize,
    max_edges: u64,
) -> Recording {
    let mut player = WavePlayer::new();
    reset_pulse(&mut player, bus);
    bus.clear_cycles();

    clock(&mut player, bus, Some(BusRequest::write(0, word.to_bits())));
    let written_at = player.cycles();

    let mut samples = Vec::with_capacity(count);
    for _ in 0..max_edges {
        if samples.len() == count {
            break;
        }
        if clock(&mut player, bus, None).0 {
            samples.push((player.cycles() - written_at, player.dac()));
        }
    }
    Recording {
        samples,
        trace: bus.cycles.clone(),
        stall_cycles: player.stall_cycles(),
    }
}

/// Expected samples for a configuration written on edge 0 and left alone,
/// against a responder that acknowledges after `latency` wait edges.
///
/// The first word lands `latency + 1` edges after the write and its first
/// byte is driven immediately. Each following word is requested on the edge
/// after its predecessor is loaded, so a word boundary falls at the later of
/// four sample periods and `latency + 1` edges after the previous one.
pub fn reference_samples(
    ram: &[u8],
    period: u16,
    max_address: u8,
    latency: u32,
    count: usize,
) -> Vec<(u64, u8)> {
    if max_address == 0 {
        return Vec::new();
    }
    let period = u64::from(period.max(1));
    let fetch = u64::from(latency) + 1;
    let mut samples = Vec::with_capacity(count);
    let mut boundary = fetch;
    let mut word = 0usize;
    while samples.len() < count {
        for k in 0..4usize {
            if samples.len() == count {
                break;
            }
            let byte = ram.get(word * 4 + k).copied().unwrap_or(0);
            samples.push((boundary + k as u64 * period, byte));
        }
        boundary = (boundary + 4 * period).max(boundary + fetch);
        word = (word + 1) % usize::from(max_address);
    }
    samples
}

// --- JSON playback vectors ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackCase {
    pub name: String,
    pub period: u16,
    pub max_address: u8,
    pub latency: u32,
    pub ram: Vec<u8>,
    /// (edges after the configuration write, DAC code)
    pub samples: Vec<(u64, u8)>,
}

impl PlaybackCase {
    pub fn config(&self) -> ConfigWord {
        ConfigWord::new(self.period, self.max_address, true)
    }

    /// Edge budget comfortably past the last expected sample.
    pub fn edge_budget(&self) -> u64 {
        self.samples.last().map_or(0, |&(edge, _)| edge) + 1024
    }

    /// Run the case on a fresh controller and traced RAM.
    pub fn replay(&self) -> Recording {
        let mut ram = SampleRam::new(self.latency);
        ram.load_bytes(&self.ram);
        let mut bus = TracingBus::new(ram);
        record_playback(
            &mut bus,
            self.config(),
            self.samples.len(),
            self.edge_budget(),
        )
    }
}

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed vector file: {0}")]
    Json(#[from] serde_json::Error),
}

fn build_case(
    name: String,
    ram: Vec<u8>,
    period: u16,
    max_address: u8,
    latency: u32,
) -> PlaybackCase {
    let count = usize::from(max_address) * 8 + 3;
    PlaybackCase {
        samples: reference_samples(&ram, period, max_address, latency, count),
        name,
        period,
        max_address,
        latency,
        ram,
    }
}

/// A random table and configuration. Latency ranges past one word's worth
/// of sample periods so some cases stall at word boundaries.
pub fn generate_case(rng: &mut impl Rng, name: String) -> PlaybackCase {
    let period: u16 = rng.gen_range(0..=24);
    let max_address: u8 = rng.gen_range(1..=24);
    let latency = rng.gen_range(0..=4 * u32::from(period.max(1)) + 12);
    let mut ram = vec![0u8; usize::from(max_address) * 4];
    rng.fill(&mut ram[..]);
    build_case(name, ram, period, max_address, latency)
}

/// A registered pattern played back as a case.
pub fn pattern_case(
    pattern: &PatternEntry,
    len: usize,
    period: u16,
    latency: u32,
) -> Result<PlaybackCase, wavedma_machines::SampleLoadError> {
    let image = SampleImage::from_pattern(pattern, len)?;
    let ram: Vec<u8> = image.playback_order().collect();
    Ok(build_case(
        format!("{}/{len}", pattern.name),
        ram,
        period,
        image.max_address(),
        latency,
    ))
}

pub fn write_vectors(path: &Path, cases: &[PlaybackCase]) -> Result<(), VectorError> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    serde_json::to_writer(&mut encoder, cases)?;
    encoder.finish()?.flush()?;
    Ok(())
}

pub fn read_vectors(path: &Path) -> Result<Vec<PlaybackCase>, VectorError> {
    let file = File::open(path)?;
    let cases = serde_json::from_reader(GzDecoder::new(BufReader::new(file)))?;
    Ok(cases)
}

// --- RampResponder: address-agnostic streaming responder ---

/// Memory responder that ignores the address and returns the next four
/// values of a ramp from `start` to `end` (wrapping back to `start`), low
/// byte first, on every acknowledged read. Acknowledges after `delay` wait
/// edges.
pub struct RampResponder {
    start: u16,
    end: u16,
    next: u16,
    delay: u32,
    waited: u32,
    served: u64,
}

impl RampResponder {
    pub fn new(delay: u32) -> Self {
        Self::with_range(0, 255, delay)
    }

    pub fn with_range(start: u8, end: u8, delay: u32) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            next: start.into(),
            delay,
            waited: 0,
            served: 0,
        }
    }

    /// Words handed out so far.
    pub fn served(&self) -> u64 {
        self.served
    }

    fn next_word(&mut self) -> u32 {
        let mut word = 0u32;
        for i in 0..4 {
            if self.next > self.end {
                self.next = self.start;
            }
            word |= u32::from(self.next as u8) << (i * 8);
            self.next += 1;
        }
        word
    }
}

impl Bus for RampResponder {
    type Address = u32;
    type Data = u32;

    fn cycle(&mut self, _master: BusMaster, request: Option<BusRequest<u32, u32>>) -> Option<u32> {
        let Some(request) = request else {
            self.waited = 0;
            return None;
        };
        if self.waited < self.delay {
            self.waited += 1;
            return None;
        }
        self.waited = 0;
        if request.is_write() {
            return None;
        }
        self.served += 1;
        Some(self.next_word())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_cycle(edge: u64, addr: u32, ack: Option<u32>) -> BusCycle {
        BusCycle {
            edge,
            addr: Some(addr),
            write: false,
            ack,
        }
    }

    fn idle_cycle(edge: u64) -> BusCycle {
        BusCycle {
            edge,
            addr: None,
            write: false,
            ack: None,
        }
    }

    #[test]
    fn ramp_words_pack_low_byte_first() {
        let mut ramp = RampResponder::new(0);
        assert_eq!(ramp.next_word(), 0x0302_0100);
        assert_eq!(ramp.next_word(), 0x0706_0504);
    }

    #[test]
    fn ramp_wraps_inside_a_word() {
        let mut ramp = RampResponder::with_range(10, 13, 0);
        assert_eq!(ramp.next_word(), 0x0D0C_0B0A);
        let mut ramp = RampResponder::with_range(0, 5, 0);
        ramp.next_word();
        assert_eq!(ramp.next_word(), 0x0100_0504);
    }

    #[test]
    fn ramp_wraps_at_255() {
        let mut ramp = RampResponder::new(0);
        for _ in 0..63 {
            ramp.next_word();
        }
        assert_eq!(ramp.next_word(), 0xFFFE_FDFC);
        assert_eq!(ramp.next_word(), 0x0302_0100);
    }

    #[test]
    fn ramp_delay_counts_wait_edges() {
        let mut ramp = RampResponder::new(2);
        let req = Some(BusRequest::read(7));
        assert_eq!(ramp.cycle(BusMaster::Sequencer, req), None);
        assert_eq!(ramp.cycle(BusMaster::Sequencer, req), None);
        assert_eq!(ramp.cycle(BusMaster::Sequencer, req), Some(0x0302_0100));
        assert_eq!(ramp.served(), 1);
    }

    #[test]
    fn protocol_accepts_held_request() {
        let trace = [
            idle_cycle(0),
            read_cycle(1, 3, None),
            read_cycle(2, 3, None),
            read_cycle(3, 3, Some(9)),
            read_cycle(4, 4, Some(1)),
            idle_cycle(5),
        ];
        assert_eq!(check_protocol(&trace, 5), Ok(()));
    }

    #[test]
    fn protocol_flags_dropped_request() {
        let trace = [read_cycle(0, 3, None), idle_cycle(1)];
        assert_eq!(
            check_protocol(&trace, 5),
            Err(ProtocolViolation::RequestDropped { edge: 1, addr: 3 })
        );
    }

    #[test]
    fn protocol_flags_changed_request() {
        let trace = [read_cycle(0, 3, None), read_cycle(1, 4, None)];
        assert_eq!(
            check_protocol(&trace, 5),
            Err(ProtocolViolation::RequestChanged {
                edge: 1,
                expected: 3,
                actual: 4
            })
        );
    }

    #[test]
    fn protocol_flags_out_of_range() {
        let trace = [read_cycle(0, 5, Some(0))];
        assert_eq!(
            check_protocol(&trace, 5),
            Err(ProtocolViolation::OutOfRange {
                edge: 0,
                addr: 5,
                bound: 5
            })
        );
    }

    #[test]
    fn reference_first_word_lands_after_latency() {
        let ram: Vec<u8> = (1..=8).collect();
        let samples = reference_samples(&ram, 20, 2, 4, 5);
        assert_eq!(
            samples,
            vec![(5, 1), (25, 2), (45, 3), (65, 4), (85, 5)]
        );
    }

    #[test]
    fn reference_stretches_starved_boundary() {
        let ram = [0u8; 12];
        let edges: Vec<u64> = reference_samples(&ram, 4, 3, 20, 9)
            .into_iter()
            .map(|(edge, _)| edge)
            .collect();
        assert_eq!(edges, vec![21, 25, 29, 33, 42, 46, 50, 54, 63]);
    }

    #[test]
    fn reference_zero_bound_plays_nothing() {
        assert!(reference_samples(&[1, 2, 3, 4], 4, 0, 0, 10).is_empty());
    }
}
