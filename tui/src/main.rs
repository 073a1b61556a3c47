//! RetroBot Terminal
//!
//! ```bash
//! retrobot-tui                      # saved state in the platform data dir
//! retrobot-tui --memory --seed 7    # throwaway session
//! retrobot-tui --transfer-dir ~/backup   # Ctrl+E / Ctrl+O data files
//! RUST_LOG=retrobot_core=debug retrobot-tui
//! ```
//!
//! Logs go to `retrobot-tui.log` in the data directory; the terminal belongs
//! to the UI.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use crossterm::event::{DisableFocusChange, EnableFocusChange};
use crossterm::execute;
use tracing::info;

use retrobot_core::{
    load_config_from_path, ConfigOverrides, FileStorage, MemoryStorage, Storage,
};
use retrobot_tui::App;

/// RetroBot, the 8-bit desktop assistant, in your terminal
#[derive(Debug, Parser)]
#[command(name = "retrobot-tui", version, about)]
struct Args {
    /// Config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// RNG seed
    #[arg(long, env = "RETROBOT_SEED")]
    seed: Option<u64>,

    /// Where state is saved
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Where Ctrl+E writes and Ctrl+O reads tab data files
    #[arg(long, env = "RETROBOT_TRANSFER_DIR")]
    transfer_dir: Option<PathBuf>,

    /// Keep nothing between runs
    #[arg(long)]
    memory: bool,

    /// No terminal bell
    #[arg(long)]
    mute: bool,

    /// Log file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.clone())?;

    let mut config = load_config_from_path(
        args.config
            .clone()
            .or_else(retrobot_core::config::default_config_path),
    )?;
    ConfigOverrides {
        storage_dir: args.storage_dir.clone(),
        seed: args.seed,
        ..ConfigOverrides::default()
    }
    .apply(&mut config);

    let storage: Arc<dyn Storage> = if args.memory {
        Arc::new(MemoryStorage::new())
    } else {
        match config.storage_dir.clone().or_else(FileStorage::default_dir) {
            Some(dir) => {
                info!(dir = %dir.display(), "Using file storage");
                Arc::new(FileStorage::new(dir))
            }
            None => {
                tracing::warn!("No data directory, state will not be saved");
                Arc::new(MemoryStorage::new())
            }
        }
    };

    let start = chrono::Local::now().naive_local();
    let mut app = App::new(config, storage, start, args.mute)?;
    if let Some(dir) = args
        .transfer_dir
        .clone()
        .or_else(|| dirs::data_dir().map(|p| p.join("retrobot")))
    {
        app = app.with_transfer_dir(dir);
    }

    let mut terminal = ratatui::init();
    execute!(io::stdout(), EnableFocusChange)?;

    app.start();
    let result = app.run(&mut terminal).await;

    execute!(io::stdout(), DisableFocusChange)?;
    ratatui::restore();

    if let Some(goodbye) = app.goodbye() {
        println!("{goodbye}");
    }
    result
}

fn init_logging(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(|| {
        dirs::data_dir()
            .map(|p| p.join("retrobot"))
            .unwrap_or_else(std::env::temp_dir)
            .join("retrobot-tui.log")
    });
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("retrobot_core=info".parse()?),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
