use clap::Parser;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use calypso_config::{Overrides, SharedConfig, load_or_default};
use calypso_console::{Console, TelnetConsole};
use calypso_core::{Extension, debug};
use calypso_ops::{FloodJob, OpsError, SmsFlood, SpoofNumberGenerator, ThreadPacer};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Send repeated SMS to one subscriber from random sender numbers",
    long_about = "Each message is sent from a freshly generated number bound to the sentinel subscriber. Stops at the first rejected command."
)]
struct Args {
    /// Extension of the receiving subscriber
    target_extension: String,

    /// Number of messages to send
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    repeat_count: u32,

    /// Message text; multiple words are joined with spaces
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    message: Vec<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(args: &Args) -> SharedConfig {
    let overrides = Overrides {
        host: args.host.clone(),
        port: args.port,
        hlr_path: None,
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
    let target = match Extension::parse_existing(&args.target_extension) {
        Ok(t) => t,
        Err(e) => {
            println!("Error: {}", e);
            return 1;
        }
    };

    let cfg = load_config(&args);
    let _log_guard = debug::setup_logging_default(cfg.config().debug_log.clone());
    let config = cfg.config();
    let text = args.message.join(" ");

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

    let flood = SmsFlood::new(config.identity.sentinel_imsi.clone(), config.pacing.flood_delay);
    let mut generator = SpoofNumberGenerator::from_config(&config.identity);
    let job = FloodJob {
        target: &target,
        repeats: args.repeat_count,
        text: &text,
    };
    let mut announce = |spoof: &Extension| println!("Sending SMS from {}...", spoof);
    let result = flood.run(&mut console, job, &mut generator, &ThreadPacer, &stop, &mut announce);
    console.close();

    match result {
        Ok(report) if report.interrupted => {
            println!("Operation cancelled by user after {} messages", report.senders.len());
            OpsError::Interrupted.exit_code()
        }
        Ok(report) => {
            println!("Done: {} messages sent to {}", report.senders.len(), target);
            0
        }
        Err(OpsError::NotFound(_)) => {
            println!("Phone with extension {} not found ;(", target);
            1
        }
        Err(OpsError::Command { response, .. }) => {
            println!("{}", response);
            1
        }
        Err(e) => {
            println!("ERROR: {}", e);
            e.exit_code()
        }
    }
}
