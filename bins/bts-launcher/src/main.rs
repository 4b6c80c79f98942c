use clap::{Parser, Subcommand, ValueEnum};

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use calypso_config::{SharedConfig, load_or_default};
use calypso_core::{Extension, SubscriberId, debug};
use calypso_launcher::{Action, EditTarget, LaunchContext, Launcher, Script};
use crossbeam_channel::RecvTimeoutError;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Operator launcher for the lab GSM network",
    long_about = "Starts the network scripts, edits their configuration and runs the subscriber tools"
)]
struct Args {
    /// TOML config file, also forwarded to the tools
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run a start script in a terminal
    Start { script: ScriptArg },
    /// Open a configuration file or script in the editor
    Edit { file: EditArg },
    /// Show all subscribers
    List,
    /// Delete the subscriber database
    RemoveDb {
        /// Confirm the removal
        #[arg(long)]
        yes: bool,
    },
    /// Send the configured test SMS to every subscriber
    TestSms,
    /// Send a USSD notification to every subscriber
    Ussd {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Flood one subscriber with SMS from random numbers
    Flood {
        target: String,
        repeats: u32,
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Change the number of a subscriber
    Spoof { id: String, number: String },
    /// Open Wireshark on the capture interface
    Wireshark,
    /// Stream captured SMS until Ctrl+C
    Capture,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScriptArg {
    Trx2,
    Transceiver,
    Nitb,
    Osmobts,
    Console,
    Trx,
}

impl From<ScriptArg> for Script {
    fn from(s: ScriptArg) -> Self {
        match s {
            ScriptArg::Trx2 => Script::Trx2,
            ScriptArg::Transceiver => Script::Transceiver,
            ScriptArg::Nitb => Script::Nitb,
            ScriptArg::Osmobts => Script::OsmoBts,
            ScriptArg::Console => Script::Console,
            ScriptArg::Trx => Script::Trx,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EditArg {
    OpenbscCfg,
    OsmobtsCfg,
    TransceiverSh,
    TrxSh,
    Trx2Sh,
}

impl From<EditArg> for EditTarget {
    fn from(e: EditArg) -> Self {
        match e {
            EditArg::OpenbscCfg => EditTarget::OpenBscCfg,
            EditArg::OsmobtsCfg => EditTarget::OsmoBtsCfg,
            EditArg::TransceiverSh => EditTarget::TransceiverSh,
            EditArg::TrxSh => EditTarget::TrxSh,
            EditArg::Trx2Sh => EditTarget::Trx2Sh,
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> SharedConfig {
    match load_or_default(path) {
        Ok(c) => c,
        Err(e) => {
            println!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Maps a subcommand to its launcher action, validating operator input up front
fn action_for(cmd: Cmd) -> Result<Action, String> {
    let action = match cmd {
        Cmd::Start { script } => Action::StartScript(script.into()),
        Cmd::Edit { file } => Action::EditFile(file.into()),
        Cmd::List => Action::ListSubscribers,
        Cmd::RemoveDb { yes } => Action::RemoveDatabase { confirmed: yes },
        Cmd::TestSms => Action::TestSmsBroadcast,
        Cmd::Ussd { message } => Action::UssdBroadcast { text: message.join(" ") },
        Cmd::Flood { target, repeats, message } => Action::SmsFlood {
            target: Extension::parse_existing(&target).map_err(|e| e.to_string())?,
            repeats,
            text: message.join(" "),
        },
        Cmd::Spoof { id, number } => Action::SpoofMsisdn {
            id: SubscriberId::parse(&id).map_err(|e| e.to_string())?,
            number: Extension::parse(&number).map_err(|e| e.to_string())?,
        },
        Cmd::Wireshark => Action::Wireshark,
        Cmd::Capture => return Err("capture runs until interrupted, not as an action".to_string()),
    };
    Ok(action)
}

fn main() {
    let args = Args::parse();
    std::process::exit(run(args));
}

fn run(args: Args) -> i32 {
    let cfg = load_config(args.config.as_deref());
    let _log_guard = debug::setup_logging_default(cfg.config().debug_log.clone());
    let ctx = LaunchContext::new(&cfg.config(), args.config.clone());
    let mut launcher = Launcher::new(cfg, ctx);

    let action = match args.command {
        Cmd::Capture => return run_capture(&mut launcher),
        cmd => action_for(cmd),
    };
    let action = match action {
        Ok(a) => a,
        Err(e) => {
            println!("Error: {}", e);
            return 1;
        }
    };

    let failed = Arc::new(AtomicBool::new(false));
    let f = failed.clone();
    let handle = launcher.run(action, move |outcome| {
        println!("{}", outcome.title());
        println!("{}", outcome.text());
        if outcome.is_failure() {
            f.store(true, Ordering::SeqCst);
        }
    });
    match handle {
        Ok(h) => h.wait(),
        Err(e) => {
            println!("Error: {}", e);
            return 1;
        }
    }
    if failed.load(Ordering::SeqCst) { 1 } else { 0 }
}

fn run_capture(launcher: &mut Launcher) -> i32 {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)) {
        tracing::warn!("failed to set Ctrl+C handler: {}", e);
    }

    if let Err(e) = launcher.start_capture() {
        println!("Error: {}", e);
        return 1;
    }
    println!("Capturing SMS, press Ctrl+C to stop");

    while running.load(Ordering::SeqCst) {
        let Some(worker) = launcher.capture() else {
            break;
        };
        match worker.recv_timeout(Duration::from_millis(200)) {
            Ok(line) => println!("{}", line),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::info!("capture output ended");
                break;
            }
        }
    }

    match launcher.stop_capture() {
        Ok(()) => 0,
        Err(e) => {
            println!("Error: {}", e);
            1
        }
    }
}
