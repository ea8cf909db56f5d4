#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a seeded Dice Roll session headlessly.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use dice_roll_cli::{FileConfig, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Plays a seeded Dice Roll session without a window.
#[derive(Debug, Parser)]
#[command(name = "dice-roll", version, about)]
struct Args {
    /// TOML file with `[session]`, `[board]` and `[spawning]` tables.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides `session.seed`.
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides `session.frames`.
    #[arg(long)]
    frames: Option<u32>,
    /// Overrides `session.frame_ms`.
    #[arg(long = "frame-ms")]
    frame_ms: Option<u32>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

/// Entry point for the Dice Roll command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = FileConfig::load(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.session.seed = seed;
    }
    if let Some(frames) = args.frames {
        config.session.frames = frames;
    }
    if let Some(frame_ms) = args.frame_ms {
        config.session.frame_ms = frame_ms;
    }
    info!(
        seed = config.session.seed,
        frames = config.session.frames,
        frame_ms = config.session.frame_ms,
        "starting session"
    );

    let mut session = Session::new(&config);
    let mut events = Vec::new();
    let summary = session.run(config.session.frames, &mut events);

    info!(
        frames = summary.frames,
        tick = summary.tick,
        score = summary.score,
        dice = summary.dice,
        spawned = summary.spawned,
        despawned = summary.despawned,
        events = events.len(),
        "session finished"
    );
    println!(
        "tick {} score {} ({} dice on board)",
        summary.tick, summary.score, summary.dice
    );
    Ok(())
}
