//! RetroBot Headless Runner
//!
//! Runs a script against a shell on the simulated clock and prints every
//! message as a JSON line. Useful for reproducing a session exactly.
//!
//! # Usage
//!
//! ```bash
//! # From a file, fixed seed
//! retrobot-headless --seed 42 session.txt
//!
//! # From stdin, on Christmas morning
//! echo "wait 600" | retrobot-headless --start 2024-12-25T09:00:00
//!
//! # With verbose logging (stderr)
//! RUST_LOG=debug retrobot-headless session.txt
//! ```
//!
//! See [`retrobot_core::script`] for the script format. The shell is started
//! before the first line runs; `wait` is the only way time moves.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDateTime;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use retrobot_core::script::{parse_script, ScriptStep};
use retrobot_core::{
    load_config_from_path, Collaborators, ConfigOverrides, EffectBoard, MemoryStorage, Shell,
    Silent, StampedMessage,
};

/// Drive RetroBot from a script
#[derive(Debug, Parser)]
#[command(name = "retrobot-headless", version, about)]
struct Args {
    /// Script file (stdin when omitted)
    script: Option<PathBuf>,

    /// RNG seed
    #[arg(long, env = "RETROBOT_SEED")]
    seed: Option<u64>,

    /// Config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Local time at simulated zero
    #[arg(long, default_value = "2024-01-02T12:00:00")]
    start: NaiveDateTime,

    /// Extra milliseconds to run after the last line
    #[arg(long, default_value_t = 0)]
    settle_ms: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("retrobot_core=warn".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let source = match &args.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let steps = parse_script(&source)?;

    let mut config = load_config_from_path(
        args.config
            .clone()
            .or_else(retrobot_core::config::default_config_path),
    )?;
    ConfigOverrides {
        seed: args.seed,
        ..ConfigOverrides::default()
    }
    .apply(&mut config);
    info!(steps = steps.len(), seed = ?config.seed, "Running script");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut shell = Shell::new(
        config,
        Collaborators {
            storage: Arc::new(MemoryStorage::new()),
            sound: Box::new(Silent),
            targets: Box::new(EffectBoard::window()),
        },
        tx,
    )?
    .with_start_time(args.start);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    shell.start();
    flush(&mut rx, &mut out)?;

    for step in steps {
        match step {
            ScriptStep::Event(event) => shell.handle_event(event),
            ScriptStep::Wait(ms) => shell.advance_by(ms),
        }
        flush(&mut rx, &mut out)?;
        if shell.is_quit() {
            return Ok(());
        }
    }

    if args.settle_ms > 0 {
        shell.advance_by(args.settle_ms);
        flush(&mut rx, &mut out)?;
    }
    Ok(())
}

fn flush(
    rx: &mut mpsc::UnboundedReceiver<StampedMessage>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    while let Ok(msg) = rx.try_recv() {
        serde_json::to_writer(&mut *out, &msg)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
