use clap::Parser;

use std::path::PathBuf;

use calypso_config::{Overrides, SharedConfig, load_or_default};
use calypso_core::debug;
use calypso_hlr::{HlrError, HlrStore, listing};

/// Print every subscriber in the HLR as a table
#[derive(Parser, Debug)]
#[command(author, version)]
struct Args {
    /// Path to the HLR SQLite database
    #[arg(long)]
    hlr_path: Option<PathBuf>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(args: &Args) -> SharedConfig {
    let overrides = Overrides {
        hlr_path: args.hlr_path.clone(),
        ..Overrides::default()
    };
    match load_or_default(args.config.as_deref()).and_then(|c| c.with_overrides(&overrides)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let args = Args::parse();
    std::process::exit(run(args));
}

fn run(args: Args) -> i32 {
    let cfg = load_config(&args);
    let _log_guard = debug::setup_logging_default(cfg.config().debug_log.clone());
    let config = cfg.config();

    tracing::debug!("subscriber-list: reading {}", config.hlr.path.display());
    let records = match HlrStore::open(&config.hlr.path, config.hlr.number_column).and_then(|s| s.list_subscribers()) {
        Ok(r) => r,
        Err(e @ (HlrError::Missing(_) | HlrError::Open(_))) => {
            tracing::debug!("subscriber-list: open failed: {:?}", e);
            eprintln!("ERROR: {}", e);
            return 1;
        }
        Err(e) => {
            tracing::warn!("subscriber-list: query failed on {}", config.hlr.path.display());
            eprintln!("ERROR: could not read subscribers: {}", e);
            return 1;
        }
    };
    tracing::info!("subscriber-list: {} subscribers", records.len());
    print!("{}", listing::render_table(&records));
    0
}
