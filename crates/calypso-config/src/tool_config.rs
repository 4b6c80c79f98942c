use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use calypso_core::Imsi;
use serde::Deserialize;

use crate::ConfigError;

/// Column of the `Subscriber` table that holds the registered number.
/// OpenBSC NITB calls it `extension`, osmo-hlr style databases call it `msisdn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum NumberColumn {
    #[default]
    Extension,
    Msisdn,
}

impl NumberColumn {
    /// Column identifier as it appears in SQL. Only ever one of two literals.
    pub fn column_name(self) -> &'static str {
        match self {
            NumberColumn::Extension => "extension",
            NumberColumn::Msisdn => "msisdn",
        }
    }
}

/// Controller VTY (telnet console) connection settings
#[derive(Debug, Clone)]
pub struct CfgConsole {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    /// Upper bound on waiting for a prompt after each command
    pub read_timeout: Duration,
    pub user_prompt: String,
    pub privileged_prompt: String,
}

impl Default for CfgConsole {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 4242,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
            user_prompt: "OpenBSC> ".to_string(),
            privileged_prompt: "OpenBSC# ".to_string(),
        }
    }
}

/// Subscriber database (HLR file owned by the controller)
#[derive(Debug, Clone)]
pub struct CfgHlr {
    pub path: PathBuf,
    pub number_column: NumberColumn,
}

impl Default for CfgHlr {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/root/.osmocom/hlr.sqlite3"),
            number_column: NumberColumn::default(),
        }
    }
}

/// Delays that keep the controller's command queue from overflowing
#[derive(Debug, Clone)]
pub struct CfgPacing {
    /// Between subscribers within a bulk pass
    pub command_delay: Duration,
    /// Between the priming and notify passes of the USSD broadcast
    pub settle_delay: Duration,
    /// Between flood iterations
    pub flood_delay: Duration,
    /// Silent SMS sent per subscriber when priming
    pub silent_sms_count: u32,
}

impl Default for CfgPacing {
    fn default() -> Self {
        Self {
            command_delay: Duration::from_millis(200),
            settle_delay: Duration::from_millis(3000),
            flood_delay: Duration::from_millis(1000),
            silent_sms_count: 2,
        }
    }
}

/// Sender identity used for bulk messaging
#[derive(Debug, Clone)]
pub struct CfgIdentity {
    pub sentinel_imsi: Imsi,
    pub spoof_prefixes: Vec<String>,
    /// Random digits appended to the chosen prefix
    pub spoof_digits: usize,
}

impl Default for CfgIdentity {
    fn default() -> Self {
        Self {
            sentinel_imsi: Imsi::sentinel(),
            spoof_prefixes: ["091", "092", "093", "094"].iter().map(|s| s.to_string()).collect(),
            spoof_digits: 7,
        }
    }
}

/// External programs and paths driven by the launcher
#[derive(Debug, Clone)]
pub struct CfgLauncher {
    /// Directory holding the controller config files and start scripts
    pub workdir: PathBuf,
    /// Directory holding the tool binaries. None: next to the running executable.
    pub tools_dir: Option<PathBuf>,
    pub terminal: String,
    pub editor: String,
    /// Prefix argv for privileged programs, e.g. ["sudo"]. Empty to run directly.
    pub elevate: Vec<String>,
    pub capture_program: String,
    pub capture_interface: String,
    pub capture_stop_timeout: Duration,
    pub ussd_type: u8,
    pub test_sms_extension: String,
    pub test_sms_text: String,
}

impl Default for CfgLauncher {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("/root/.osmocom"),
            tools_dir: None,
            terminal: "gnome-terminal".to_string(),
            editor: "featherpad".to_string(),
            elevate: vec!["sudo".to_string()],
            capture_program: "tshark".to_string(),
            capture_interface: "lo".to_string(),
            capture_stop_timeout: Duration::from_secs(5),
            ussd_type: 1,
            test_sms_extension: "111".to_string(),
            test_sms_text: "SMStestSMS".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ToolConfig {
    pub debug_log: Option<String>,
    pub console: CfgConsole,
    pub hlr: CfgHlr,
    pub pacing: CfgPacing,
    pub identity: CfgIdentity,
    pub launcher: CfgLauncher,
}

impl ToolConfig {
    /// Validate that all configuration fields hold usable values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.console.host.trim().is_empty() {
            return Err(ConfigError::Invalid("console.host must not be empty"));
        }
        if self.console.port == 0 {
            return Err(ConfigError::Invalid("console.port must be non-zero"));
        }
        if self.console.user_prompt.is_empty() || self.console.privileged_prompt.is_empty() {
            return Err(ConfigError::Invalid("console prompts must not be empty"));
        }
        if self.console.user_prompt == self.console.privileged_prompt {
            return Err(ConfigError::Invalid("console.user_prompt and console.privileged_prompt must differ"));
        }
        if self.console.read_timeout.is_zero() || self.console.connect_timeout.is_zero() {
            return Err(ConfigError::Invalid("console timeouts must be non-zero"));
        }
        if self.identity.spoof_prefixes.is_empty() {
            return Err(ConfigError::Invalid("identity.spoof_prefixes must not be empty"));
        }
        if self
            .identity
            .spoof_prefixes
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(ConfigError::Invalid("identity.spoof_prefixes must be digit strings"));
        }
        if !(1..=12).contains(&self.identity.spoof_digits) {
            return Err(ConfigError::Invalid("identity.spoof_digits must be between 1 and 12"));
        }
        // Generated numbers go through the same validation as user input, whichever prefix is drawn
        let prefix_lens = self.identity.spoof_prefixes.iter().map(|p| p.len());
        let shortest = prefix_lens.clone().min().unwrap_or(0) + self.identity.spoof_digits;
        let longest = prefix_lens.max().unwrap_or(0) + self.identity.spoof_digits;
        if shortest < 4 || longest > 15 {
            return Err(ConfigError::Invalid("spoof prefix plus digits must be 4-15 characters long"));
        }
        if self.launcher.capture_program.is_empty() || self.launcher.terminal.is_empty() || self.launcher.editor.is_empty() {
            return Err(ConfigError::Invalid("launcher programs must not be empty"));
        }
        Ok(())
    }
}

/// Shared, read-only configuration handed to every component.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    cfg: Arc<ToolConfig>,
}

impl SharedConfig {
    /// Check config for validity before returning the SharedConfig object
    pub fn from_config(cfg: ToolConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { cfg: Arc::new(cfg) })
    }

    /// Access immutable config.
    pub fn config(&self) -> Arc<ToolConfig> {
        Arc::clone(&self.cfg)
    }
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub hlr_path: Option<PathBuf>,
}

impl SharedConfig {
    /// Copy of this config with `overrides` applied, validated again
    pub fn with_overrides(&self, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut cfg = ToolConfig::clone(&self.cfg);
        if let Some(host) = &overrides.host {
            cfg.console.host = host.clone();
        }
        if let Some(port) = overrides.port {
            cfg.console.port = port;
        }
        if let Some(path) = &overrides.hlr_path {
            cfg.hlr.path = path.clone();
        }
        Self::from_config(cfg)
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            cfg: Arc::new(ToolConfig::default()),
        }
    }
}
