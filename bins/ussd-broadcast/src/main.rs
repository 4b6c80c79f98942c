use clap::Parser;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use calypso_config::{Overrides, SharedConfig, load_or_default};
use calypso_core::{Extension, debug};
use calypso_hlr::HlrStore;
use calypso_ops::{OpsError, TelnetConnector, ThreadPacer, UssdBroadcast, UssdMessage};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Send a USSD notification to every subscriber",
    long_about = "Primes every subscriber with silent SMS, then sends each one a USSD notification in its own console session"
)]
struct Args {
    /// USSD notification type (0, 1 or 2)
    #[arg(value_parser = clap::value_parser!(u8).range(0..=2))]
    ussd_type: u8,

    /// Notification text; multiple words are joined with spaces
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    message: Vec<String>,

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
    let text = args.message.join(" ");

    let targets = match HlrStore::open(&config.hlr.path, config.hlr.number_column).and_then(|s| s.broadcast_targets()) {
        Ok(t) => t,
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

    println!("USSD Delivery Results:");
    let mut connector = TelnetConnector::new(config.console.clone());
    let broadcast = UssdBroadcast::new(config.identity.sentinel_imsi.clone(), &config.pacing);
    let message = UssdMessage {
        ussd_type: args.ussd_type,
        text: &text,
    };
    let mut print_result = |ext: &Extension, delivered: bool| {
        if delivered {
            println!("USSD success: {}", ext);
        } else {
            println!("USSD failed: {}", ext);
        }
    };

    match broadcast.run(&mut connector, &targets, message, &ThreadPacer, &stop, &mut print_result) {
        Ok(report) => {
            tracing::info!("ussd: {} delivered, {} failed", report.delivered.len(), report.failed.len());
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
