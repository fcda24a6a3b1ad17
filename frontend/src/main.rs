use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use tracing::{Level, info, warn};
use wavedma_machines::board::WaveBoard;
use wavedma_machines::registry;

mod cli;
mod config;
mod output;
mod plot;
mod source;

use cli::Args;
use config::Settings;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.list_patterns {
        for entry in registry::all() {
            println!("{:<10} {}", entry.name, entry.description);
        }
        return Ok(());
    }

    let mut settings = Settings::load(args.config.as_deref())?;
    settings.apply(&args);

    let image = source::load_image(&settings.playback)?;
    let max_address = settings
        .playback
        .max_address
        .unwrap_or_else(|| image.max_address());
    ensure!(max_address > 0, "max_address 0 leaves playback idle");
    if max_address > image.max_address() {
        warn!(
            max_address,
            table_words = image.max_address(),
            "bound extends past the table; the excess words play as zeros"
        );
    }

    let mut board = WaveBoard::new(settings.board_config());
    board.reset_pulse();
    board.load_image(&image);
    board
        .start(settings.playback.period, max_address)
        .context("failed to arm playback")?;
    info!(
        period = settings.playback.period,
        max_address,
        latency = settings.memory.ack_latency,
        "playback armed"
    );

    let samples = board
        .capture_ticks(settings.playback.ticks)
        .context("playback stalled")?;
    info!(
        samples = samples.len(),
        cycles = board.cycles(),
        stall_cycles = board.player().stall_cycles(),
        "capture complete"
    );

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            output::write_trace(&mut BufWriter::new(file), &samples)?;
        }
        None => output::write_trace(&mut std::io::stdout().lock(), &samples)?,
    }
    if let Some(path) = &args.pcm {
        output::write_pcm(path, &samples)?;
        info!(path = %path.display(), "wrote PCM");
    }
    if let Some(path) = &args.png {
        let codes: Vec<u8> = samples.iter().map(|s| s.dac).collect();
        plot::write_png(path, &codes)?;
        info!(path = %path.display(), "wrote plot");
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}
