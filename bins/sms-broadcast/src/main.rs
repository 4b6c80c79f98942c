use clap::Parser;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use calypso_config::{Overrides, SharedConfig, load_or_default};
use calypso_console::{Console, TelnetConsole};
use calypso_core::{Extension, debug};
use calypso_hlr::HlrStore;
use calypso_ops::{OpsError, SmsBroadcast, ThreadPacer};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Send an SMS to every subscriber",
    long_about = "Sends a message from the given extension to every subscriber with a registered number"
)]
struct Args {
    /// Sender extension; must already exist unless --provision-sender is given
    extension: String,

    /// Message text; multiple words are joined with spaces
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    message: Vec<String>,

    /// Bind an unknown sender extension to the sentinel subscriber instead of failing
    #[arg(long)]
    provision_sender: bool,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    hlr_path: Option<PathBuf>,

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
    let cfg = load_config(&args);
    let _log_guard = debug::setup_logging_default(cfg.config().debug_log.clone());
    let config = cfg.config();

    let sender = match Extension::parse_existing(&args.extension) {
        Ok(s) => s,
        Err(e) => {
            println!("Error: {}", e);
            return 1;
        }
    };
    let text = args.message.join(" ");

    let targets = match HlrStore::open(&config.hlr.path, config.hlr.number_column).and_then(|s| s.broadcast_targets()) {
        Ok(t) => t,
        Err(e) => {
            println!("ERROR: {}", e);
            return 1;
        }
    };

    let mut console = match TelnetConsole::open(&config.console) {
        Ok(c) => c,
        Err(e) => {
            println!("ERROR: {}", e);
            return 1;
        }
    };

    let stop = Arc::new(AtomicBool::new(false));
    let s = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || s.store(true, Ordering::SeqCst)) {
        tracing::warn!("failed to set Ctrl+C handler: {}", e);
    }

    let mut broadcast = SmsBroadcast::new(config.pacing.command_delay);
    if args.provision_sender {
        broadcast = broadcast.provision_sender(config.identity.sentinel_imsi.clone());
    }
    let result = broadcast.run(&mut console, &targets, &sender, &text, &ThreadPacer, &stop);
    console.close();

    match result {
        Ok(report) => {
            for failure in &report.failed {
                println!("Failed: subscriber {}: {}", failure.target, failure.reason);
            }
            println!("SMS SENT! {} delivered, {} failed", report.delivered.len(), report.failed.len());
            if report.interrupted {
                println!("Operation cancelled by user");
                return OpsError::Interrupted.exit_code();
            }
            0
        }
        Err(e) => {
            println!("ERROR: {}", e);
            e.exit_code()
        }
    }
}
