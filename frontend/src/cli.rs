use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Debug, Parser)]
#[command(
    name = "wavedma",
    version,
    about = "Play a waveform table through the DMA playback board and dump the DAC output"
)]
pub struct Args {
    /// Settings file (default: <config dir>/wavedma/settings.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Built-in waveform to play (see --list-patterns).
    #[arg(long, conflicts_with = "sample_file")]
    pub pattern: Option<String>,

    /// Samples to render from the pattern.
    #[arg(long)]
    pub length: Option<usize>,

    /// Raw 8-bit sample table to play instead of a pattern.
    #[arg(long)]
    pub sample_file: Option<PathBuf>,

    /// Reject the table unless its CRC-32 matches (e.g. 0xCBF43926).
    #[arg(long, value_parser = parse_u32)]
    pub expected_crc32: Option<u32>,

    /// Bus cycles per sample.
    #[arg(long)]
    pub period: Option<u16>,

    /// Words to play before wrapping (default: the whole table).
    #[arg(long)]
    pub max_address: Option<u8>,

    /// Wait cycles before the sample RAM acknowledges a read.
    #[arg(long)]
    pub latency: Option<u32>,

    /// Number of samples to capture.
    #[arg(long)]
    pub ticks: Option<usize>,

    /// Host address of the configuration register.
    #[arg(long, value_parser = parse_u32)]
    pub config_base: Option<u32>,

    /// Host bus timeout in cycles.
    #[arg(long)]
    pub timeout_cycles: Option<u32>,

    /// Write the trace here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the samples as raw signed 16-bit little-endian PCM.
    #[arg(long)]
    pub pcm: Option<PathBuf>,

    /// Also write a PNG plot of the DAC codes.
    #[arg(long)]
    pub png: Option<PathBuf>,

    /// List the built-in patterns and exit.
    #[arg(long)]
    pub list_patterns: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a decimal or `0x`-prefixed hex number. Underscores are ignored.
pub fn parse_u32(s: &str) -> Result<u32, String> {
    let cleaned = s.replace('_', "");
    let parsed = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => cleaned.parse(),
    };
    parsed.map_err(|e| format!("invalid number {s:?}: {e}"))
}
