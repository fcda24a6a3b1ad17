#![allow(dead_code)]

use wavedma_core::core::{Bus, BusMaster, BusMasterComponent, BusRequest};
use wavedma_core::device::{ConfigWord, SampleRam, WavePlayer};

/// Controller wired straight to a sample RAM, clocked one edge at a time.
/// The configuration port is driven directly, with no address decoding.
pub struct Rig {
    pub player: WavePlayer,
    pub ram: SampleRam,
}

impl Rig {
    pub fn new(latency: u32) -> Self {
        let mut rig = Self {
            player: WavePlayer::new(),
            ram: SampleRam::new(latency),
        };
        rig.reset_pulse();
        rig
    }

    pub fn with_bytes(latency: u32, bytes: &[u8]) -> Self {
        let mut rig = Self::new(latency);
        rig.ram.load_bytes(bytes);
        rig
    }

    /// One clock edge: controller first, then the configuration port samples
    /// `host`. Returns whether a sample was driven and the port's acknowledge.
    pub fn edge(&mut self, host: Option<BusRequest<u32, u32>>) -> (bool, Option<u32>) {
        let driven = self
            .player
            .tick_with_bus(&mut self.ram, BusMaster::Sequencer);
        let ack = self.player.cycle(BusMaster::Host, host);
        (driven, ack)
    }

    /// Write the configuration register. Returns whether the write edge
    /// itself drove a sample.
    pub fn write_config(&mut self, word: ConfigWord) -> bool {
        let (driven, ack) = self.edge(Some(BusRequest::write(0, word.to_bits())));
        assert!(ack.is_some(), "configuration write not acknowledged");
        driven
    }

    pub fn read_config(&mut self) -> ConfigWord {
        let (_, ack) = self.edge(Some(BusRequest::read(0)));
        ConfigWord::from_bits(ack.expect("configuration read not acknowledged"))
    }

    /// Run `cycles` edges, returning how many samples were driven.
    pub fn run(&mut self, cycles: usize) -> usize {
        (0..cycles).filter(|_| self.edge(None).0).count()
    }

    pub fn reset_pulse(&mut self) {
        self.player.set_reset(true);
        self.run(5);
        self.player.set_reset(false);
        self.run(5);
    }

    /// Clock until `count` samples have been driven. Returns the edge number
    /// and DAC code of each one.
    pub fn capture(&mut self, count: usize) -> Vec<(u64, u8)> {
        let mut samples = Vec::with_capacity(count);
        let mut idle = 0;
        while samples.len() < count {
            if self.edge(None).0 {
                samples.push((self.player.cycles(), self.player.dac()));
                idle = 0;
            } else {
                idle += 1;
                assert!(idle < 1_000_000, "no sample driven for {idle} edges");
            }
        }
        samples
    }

    pub fn capture_codes(&mut self, count: usize) -> Vec<u8> {
        self.capture(count).into_iter().map(|(_, code)| code).collect()
    }
}

/// Consecutive byte values starting at `start`, wrapping at 256.
pub fn ramp_bytes(start: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| start.wrapping_add(i as u8)).collect()
}

/// Differences between consecutive edge numbers.
pub fn gaps(samples: &[(u64, u8)]) -> Vec<u64> {
    samples.windows(2).map(|w| w[1].0 - w[0].0).collect()
}
