//! Operator panel actions and the process each one starts.

use std::path::{Path, PathBuf};

use calypso_config::{CfgLauncher, ToolConfig};
use calypso_core::{Extension, SubscriberId};

/// Start scripts living in the work directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Trx2,
    Transceiver,
    Nitb,
    OsmoBts,
    Console,
    Trx,
}

impl Script {
    pub fn file_name(self) -> &'static str {
        match self {
            Script::Trx2 => "trx2.sh",
            Script::Transceiver => "transceiver.sh",
            Script::Nitb => "nitb.sh",
            Script::OsmoBts => "osmobts.sh",
            Script::Console => "console.sh",
            Script::Trx => "trx.sh",
        }
    }
}

/// Files opened in the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    OpenBscCfg,
    OsmoBtsCfg,
    TransceiverSh,
    TrxSh,
    Trx2Sh,
}

impl EditTarget {
    pub fn file_name(self) -> &'static str {
        match self {
            EditTarget::OpenBscCfg => "open-bsc.cfg",
            EditTarget::OsmoBtsCfg => "osmo-bts.cfg",
            EditTarget::TransceiverSh => "transceiver.sh",
            EditTarget::TrxSh => "trx.sh",
            EditTarget::Trx2Sh => "trx2.sh",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StartScript(Script),
    EditFile(EditTarget),
    ListSubscribers,
    /// Deletes the HLR file. Refused unless `confirmed`.
    RemoveDatabase { confirmed: bool },
    /// Test SMS from the configured extension to every subscriber
    TestSmsBroadcast,
    UssdBroadcast { text: String },
    SmsFlood { target: Extension, repeats: u32, text: String },
    SpoofMsisdn { id: SubscriberId, number: Extension },
    Wireshark,
}

impl Action {
    /// Title of the result window the action reports to
    pub fn title(&self) -> &'static str {
        match self {
            Action::StartScript(_) => "Start",
            Action::EditFile(_) => "Edit",
            Action::ListSubscribers => "SUBSCRIBERS",
            Action::RemoveDatabase { .. } => "Database Removed",
            Action::TestSmsBroadcast => "SMS Status",
            Action::UssdBroadcast { .. } => "USSD Delivery Report",
            Action::SmsFlood { .. } => "SMS Flood",
            Action::SpoofMsisdn { .. } => "MSISDN Change Status",
            Action::Wireshark => "Wireshark",
        }
    }

    /// Report heading for actions whose output is framed by the subscriber listing
    pub fn report_kind(&self) -> Option<&'static str> {
        match self {
            Action::UssdBroadcast { .. } => Some("USSD"),
            _ => None,
        }
    }

    /// Process to start for this action. None for actions handled in-process.
    pub fn command(&self, ctx: &LaunchContext) -> Option<LaunchSpec> {
        let cfg = &ctx.launcher;
        let spec = match self {
            Action::StartScript(script) => ctx
                .elevated(&cfg.terminal)
                .args(["--".to_string(), format!("./{}", script.file_name())])
                .detached(),
            Action::EditFile(target) => ctx
                .elevated(&cfg.editor)
                .arg(cfg.workdir.join(target.file_name()).display().to_string())
                .detached(),
            Action::ListSubscribers => ctx.tool("subscriber-list").captured(),
            Action::RemoveDatabase { .. } => return None,
            Action::TestSmsBroadcast => ctx
                .tool("sms-broadcast")
                .args([cfg.test_sms_extension.clone(), cfg.test_sms_text.clone()])
                .captured(),
            Action::UssdBroadcast { text } => ctx
                .tool("ussd-broadcast")
                .args([cfg.ussd_type.to_string(), text.clone()])
                .captured(),
            // Runs in a terminal so the operator can watch and interrupt it
            Action::SmsFlood { target, repeats, text } => ctx
                .elevated(&cfg.terminal)
                .arg("--".to_string())
                .args(ctx.tool_argv("sms-flood"))
                .args([target.to_string(), repeats.to_string(), text.clone()])
                .detached(),
            Action::SpoofMsisdn { id, number } => ctx.tool("msisdn-changer").args([id.to_string(), number.to_string()]).captured(),
            Action::Wireshark => ctx
                .elevated("wireshark")
                .args(["-i", cfg.capture_interface.as_str(), "-k", "-f", "", "-Y", "gsm_ipa"].map(str::to_string))
                .detached(),
        };
        Some(spec)
    }
}

/// Everything an action needs to build its command line
#[derive(Debug, Clone)]
pub struct LaunchContext {
    pub launcher: CfgLauncher,
    pub hlr_path: PathBuf,
    /// Forwarded to the tools as `--config`
    pub config_path: Option<PathBuf>,
    /// Where the tool binaries live
    pub tools_dir: PathBuf,
}

impl LaunchContext {
    pub fn new(cfg: &ToolConfig, config_path: Option<PathBuf>) -> Self {
        let tools_dir = cfg.launcher.tools_dir.clone().unwrap_or_else(current_exe_dir);
        Self {
            launcher: cfg.launcher.clone(),
            hlr_path: cfg.hlr.path.clone(),
            config_path,
            tools_dir,
        }
    }

    /// `program` prefixed by the configured elevation argv, run in the work directory
    fn elevated(&self, program: &str) -> LaunchSpec {
        let mut argv = self.launcher.elevate.clone();
        argv.push(program.to_string());
        let program = argv.remove(0);
        LaunchSpec {
            program,
            args: argv,
            cwd: Some(self.launcher.workdir.clone()),
            mode: LaunchMode::Detached,
        }
    }

    /// Tool binary path plus the forwarded config option
    fn tool_argv(&self, name: &str) -> Vec<String> {
        let mut argv = vec![self.tools_dir.join(name).display().to_string()];
        if let Some(p) = &self.config_path {
            argv.push("--config".to_string());
            argv.push(p.display().to_string());
        }
        argv
    }

    fn tool(&self, name: &str) -> LaunchSpec {
        let mut argv = self.tool_argv(name);
        let program = argv.remove(0);
        self.elevated(&program).args(argv)
    }
}

fn current_exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Started and left running
    Detached,
    /// Waited for; stdout and stderr are collected
    Captured,
}

/// A fully resolved process invocation. Each argument is passed as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub mode: LaunchMode,
}

impl LaunchSpec {
    pub fn new(program: impl Into<String>, mode: LaunchMode) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            mode,
        }
    }

    pub fn arg(mut self, arg: String) -> Self {
        self.args.push(arg);
        self
    }

    pub fn args<I: IntoIterator<Item = String>>(mut self, args: I) -> Self {
        self.args.extend(args);
        self
    }

    fn detached(mut self) -> Self {
        self.mode = LaunchMode::Detached;
        self
    }

    fn captured(mut self) -> Self {
        self.mode = LaunchMode::Captured;
        self
    }

    /// Command line for log output
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|a| if a.is_empty() || a.contains(char::is_whitespace) { format!("{:?}", a) } else { a.to_string() })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
