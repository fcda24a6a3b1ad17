//! Persistent settings, read from TOML and overridden by the command line.
//!
//! ```toml
//! [bus]
//! config_base = 0x30000000
//! timeout_cycles = 10
//!
//! [memory]
//! ack_latency = 4
//!
//! [playback]
//! period = 20
//! ticks = 512
//! pattern = "ramp"
//! length = 256
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;
use wavedma_machines::board::{BoardConfig, DEFAULT_CONFIG_BASE, DEFAULT_TIMEOUT_CYCLES};

use crate::cli::Args;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub bus: BusSettings,
    pub memory: MemorySettings,
    pub playback: PlaybackSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusSettings {
    pub config_base: u32,
    pub timeout_cycles: u32,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            config_base: DEFAULT_CONFIG_BASE,
            timeout_cycles: DEFAULT_TIMEOUT_CYCLES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemorySettings {
    pub ack_latency: u32,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self { ack_latency: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackSettings {
    pub period: u16,
    /// `None` plays the whole table.
    pub max_address: Option<u8>,
    pub ticks: usize,
    pub pattern: String,
    pub length: usize,
    /// Takes precedence over `pattern`.
    pub sample_file: Option<PathBuf>,
    pub expected_crc32: Option<u32>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            period: 20,
            max_address: None,
            ticks: 512,
            pattern: "ramp".to_string(),
            length: 256,
            sample_file: None,
            expected_crc32: None,
        }
    }
}

/// `<config dir>/wavedma/settings.toml`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("wavedma").join("settings.toml"))
}

impl Settings {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load `path` if given (it must exist), otherwise the default settings
    /// file if present, otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_path().filter(|p| p.is_file()) {
                Some(path) => path,
                None => {
                    debug!("no settings file, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings: {}", path.display()))?;
        let settings = Self::parse(&text)
            .with_context(|| format!("invalid settings: {}", path.display()))?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Command-line values win over file values.
    pub fn apply(&mut self, args: &Args) {
        if let Some(base) = args.config_base {
            self.bus.config_base = base;
        }
        if let Some(timeout) = args.timeout_cycles {
            self.bus.timeout_cycles = timeout;
        }
        if let Some(latency) = args.latency {
            self.memory.ack_latency = latency;
        }

        let playback = &mut self.playback;
        if let Some(period) = args.period {
            playback.period = period;
        }
        if args.max_address.is_some() {
            playback.max_address = args.max_address;
        }
        if let Some(ticks) = args.ticks {
            playback.ticks = ticks;
        }
        if let Some(pattern) = &args.pattern {
            playback.pattern = pattern.clone();
            playback.sample_file = None;
        }
        if let Some(length) = args.length {
            playback.length = length;
        }
        if let Some(file) = &args.sample_file {
            playback.sample_file = Some(file.clone());
        }
        if args.expected_crc32.is_some() {
            playback.expected_crc32 = args.expected_crc32;
        }
    }

    pub fn board_config(&self) -> BoardConfig {
        BoardConfig {
            config_base: self.bus.config_base,
            timeout_cycles: self.bus.timeout_cycles,
            ack_latency: self.memory.ack_latency,
            ..BoardConfig::default()
        }
    }
}
