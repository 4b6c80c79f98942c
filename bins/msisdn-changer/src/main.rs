use clap::Parser;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use calypso_config::{Overrides, SharedConfig, load_or_default};
use calypso_console::{Console, TelnetConsole};
use calypso_core::{Extension, SubscriberId, debug};
use calypso_hlr::HlrStore;
use calypso_ops::{MsisdnChanger, MutationPath};

#[derive(Parser, Debug)]
#[command(author, version, about = "Update the registered number (MSISDN) of a subscriber")]
struct Args {
    /// Subscriber ID (positive integer)
    #[arg(allow_hyphen_values = true)]
    subscriber_id: String,

    /// New extension/MSISDN (4-15 characters, alphanumeric plus * and #)
    extension: String,

    /// OpenBSC console host
    #[arg(long)]
    host: Option<String>,

    /// OpenBSC console port
    #[arg(long)]
    port: Option<u16>,

    /// Path to the HLR SQLite database
    #[arg(long)]
    hlr_path: Option<PathBuf>,

    /// Only use console commands, skip the direct database update
    #[arg(long, conflicts_with = "db_only")]
    console_only: bool,

    /// Only update the database directly, skip console commands
    #[arg(long)]
    db_only: bool,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(args: &Args) -> SharedConfig {
    let overrides = Overrides {
        host: args.host.clone(),
        port: args.port,
        hlr_path: args.hlr_path.clone(),
    };
    match load_or_default(args.config.as_deref()).and_then(|c| c.with_overrides(&overrides)) {
        Ok(c) => c,
        Err(e) => {
            println!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let args = Args::parse();
    std::process::exit(run(args));
}

fn run(args: Args) -> i32 {
    // Validation messages go to stdout; callers only read stdout
    let id = match SubscriberId::parse(&args.subscriber_id) {
        Ok(id) => id,
        Err(e) => {
            println!("Error: {}", e);
            return 1;
        }
    };
    let number = match Extension::parse(&args.extension) {
        Ok(n) => n,
        Err(e) => {
            println!("Error: {}", e);
            return 1;
        }
    };

    let cfg = load_config(&args);
    let _log_guard = debug::setup_logging_default(cfg.config().debug_log.clone());

    let strategy = if args.console_only {
        vec![MutationPath::Console]
    } else if args.db_only {
        vec![MutationPath::Store]
    } else {
        vec![MutationPath::Console, MutationPath::Store]
    };
    let stop = Arc::new(AtomicBool::new(false));
    let s = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || s.store(true, Ordering::SeqCst)) {
        tracing::warn!("failed to set Ctrl+C handler: {}", e);
    }
    let changer = MsisdnChanger::new(strategy).with_stop_flag(stop);

    let config = cfg.config();
    let mut console = if changer.uses(MutationPath::Console) {
        match TelnetConsole::open(&config.console) {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!("console unavailable, skipping console path: {}", e);
                None
            }
        }
    } else {
        None
    };

    let hlr_path: &Path = &config.hlr.path;
    let result = changer.run(
        console.as_mut().map(|c| c as &mut dyn Console),
        || HlrStore::open(hlr_path, config.hlr.number_column),
        id,
        &number,
    );
    if let Some(mut c) = console.take() {
        c.close();
    }

    println!("{}", result.status_line(id));
    result.exit_code()
}
