use thiserror::Error;
use tracing::{trace, warn};

use wavedma_core::core::{Bus, BusMaster, BusMasterComponent, BusRequest};
use wavedma_core::device::{ConfigWord, PlayerState, SampleRam, WavePlayer};

use crate::sample_image::SampleImage;

pub const DEFAULT_CONFIG_BASE: u32 = 0x3000_0000;
pub const DEFAULT_TIMEOUT_CYCLES: u32 = 10;
pub const DEFAULT_STARVE_CYCLES: u64 = 1 << 20;

/// Width of the configuration window in bytes. The register is mirrored
/// across it.
const CONFIG_WINDOW: u32 = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("host access to 0x{addr:08X} not acknowledged within {cycles} cycles")]
    BusTimeout { addr: u32, cycles: u32 },

    #[error("no sample driven for {cycles} cycles")]
    Starved { cycles: u64 },
}

/// Board wiring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    /// Host address of the configuration register.
    pub config_base: u32,
    /// Host transactions fail after this many unacknowledged edges.
    pub timeout_cycles: u32,
    /// Wait edges before the sample RAM acknowledges.
    pub ack_latency: u32,
    /// `capture_ticks` gives up after this many edges without a sample.
    pub starve_cycles: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            config_base: DEFAULT_CONFIG_BASE,
            timeout_cycles: DEFAULT_TIMEOUT_CYCLES,
            ack_latency: 0,
            starve_cycles: DEFAULT_STARVE_CYCLES,
        }
    }
}

/// One DAC update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Samples driven since reset, counting from 0.
    pub tick: u64,
    /// Edge on which the sample was driven.
    pub cycle: u64,
    /// RAM word the byte came from.
    pub address: u8,
    pub dac: u8,
}

/// Playback controller, sample RAM and host bus on a common clock.
///
/// Host map:
///
/// | Address              | Device                 |
/// |----------------------|------------------------|
/// | config_base + 0..3   | Configuration register |
/// | anything else        | unmapped (no ack)      |
///
/// The controller's memory port is wired straight to the sample RAM.
pub struct WaveBoard {
    player: WavePlayer,
    ram: SampleRam,
    config: BoardConfig,
    ticks: u64,
    last_sample: Option<Sample>,
}

impl WaveBoard {
    pub fn new(config: BoardConfig) -> Self {
        Self {
            player: WavePlayer::new(),
            ram: SampleRam::new(config.ack_latency),
            config,
            ticks: 0,
            last_sample: None,
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn player(&self) -> &WavePlayer {
        &self.player
    }

    pub fn ram(&self) -> &SampleRam {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut SampleRam {
        &mut self.ram
    }

    pub fn load_image(&mut self, image: &SampleImage) {
        self.ram.load_bytes(image.bytes());
    }

    pub fn cycles(&self) -> u64 {
        self.player.cycles()
    }

    /// Samples driven since the last reset.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_sample(&self) -> Option<Sample> {
        self.last_sample
    }

    pub fn set_reset(&mut self, asserted: bool) {
        self.player.set_reset(asserted);
    }

    /// Hold reset for five edges, then release it for five.
    pub fn reset_pulse(&mut self) {
        self.set_reset(true);
        self.run_cycles(5);
        self.set_reset(false);
        self.run_cycles(5);
    }

    /// One edge with the host bus idle. Returns true if a sample was driven.
    pub fn clock(&mut self) -> bool {
        self.edge(None).0
    }

    pub fn run_cycles(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.clock();
        }
    }

    /// Clock until `count` more samples have been driven.
    pub fn capture_ticks(&mut self, count: usize) -> Result<Vec<Sample>, BoardError> {
        let mut samples = Vec::with_capacity(count);
        let mut idle = 0u64;
        while samples.len() < count {
            if self.clock() {
                samples.extend(self.last_sample);
                idle = 0;
            } else {
                idle += 1;
                if idle >= self.config.starve_cycles {
                    return Err(BoardError::Starved { cycles: idle });
                }
            }
        }
        Ok(samples)
    }

    pub fn host_write(&mut self, addr: u32, data: u32) -> Result<(), BoardError> {
        self.host_transaction(BusRequest::write(addr, data)).map(|_| ())
    }

    pub fn host_read(&mut self, addr: u32) -> Result<u32, BoardError> {
        self.host_transaction(BusRequest::read(addr))
    }

    /// Write the configuration register at `config_base`.
    pub fn configure(&mut self, word: ConfigWord) -> Result<(), BoardError> {
        self.host_write(self.config.config_base, word.to_bits())
    }

    pub fn read_config(&mut self) -> Result<ConfigWord, BoardError> {
        self.host_read(self.config.config_base).map(ConfigWord::from_bits)
    }

    /// Arm playback of `max_address` words at `period` cycles per sample.
    pub fn start(&mut self, period: u16, max_address: u8) -> Result<(), BoardError> {
        self.configure(ConfigWord::new(period, max_address, true))
    }

    /// Clear the run bit, keeping the other fields.
    pub fn stop(&mut self) -> Result<(), BoardError> {
        let word = ConfigWord {
            run: false,
            ..self.player.config()
        };
        self.configure(word)
    }

    pub fn is_running(&self) -> bool {
        self.player.state() == PlayerState::Running
    }

    /// Hold the request on the host bus until acknowledged or timed out.
    fn host_transaction(&mut self, request: BusRequest<u32, u32>) -> Result<u32, BoardError> {
        for _ in 0..self.config.timeout_cycles {
            if let (_, Some(data)) = self.edge(Some(request)) {
                trace!(addr = request.addr, data, write = request.is_write(), "host ack");
                return Ok(data);
            }
        }
        warn!(
            addr = request.addr,
            cycles = self.config.timeout_cycles,
            "host bus timeout"
        );
        Err(BoardError::BusTimeout {
            addr: request.addr,
            cycles: self.config.timeout_cycles,
        })
    }

    fn decodes_config(&self, addr: u32) -> bool {
        addr.wrapping_sub(self.config.config_base) < CONFIG_WINDOW
    }

    /// Controller first, then the configuration port samples the host strobe.
    fn edge(&mut self, host: Option<BusRequest<u32, u32>>) -> (bool, Option<u32>) {
        let was_reset = self.player.reset_asserted();
        let driven = self
            .player
            .tick_with_bus(&mut self.ram, BusMaster::Sequencer);
        if was_reset {
            self.ticks = 0;
            self.last_sample = None;
        }
        if driven {
            let sample = Sample {
                tick: self.ticks,
                cycle: self.player.cycles(),
                address: self.player.snapshot().current_address,
                dac: self.player.dac(),
            };
            self.ticks += 1;
            self.last_sample = Some(sample);
        }

        let ack = match host {
            Some(request) if self.decodes_config(request.addr) => {
                self.player.cycle(BusMaster::Host, Some(request))
            }
            _ => None,
        };
        (driven, ack)
    }
}

impl Default for WaveBoard {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}
