use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use calypso_core::Imsi;
use serde::Deserialize;
use toml::Value;

use super::tool_config::{CfgConsole, CfgHlr, CfgIdentity, CfgLauncher, CfgPacing, NumberColumn, SharedConfig, ToolConfig};
use crate::ConfigError;

pub const EXPECTED_CONFIG_VERSION: &str = "0.1";

/// Build `SharedConfig` from a TOML configuration string
pub fn from_toml_str(toml_str: &str) -> Result<SharedConfig, ConfigError> {
    let root: TomlConfigRoot = toml::from_str(toml_str)?;

    // Various sanity checks
    if root.config_version != EXPECTED_CONFIG_VERSION {
        return Err(ConfigError::Version {
            found: root.config_version,
            expected: EXPECTED_CONFIG_VERSION,
        });
    }
    reject_extra("", &root.extra)?;
    if let Some(ref c) = root.console {
        reject_extra("console", &c.extra)?;
    }
    if let Some(ref h) = root.hlr {
        reject_extra("hlr", &h.extra)?;
    }
    if let Some(ref p) = root.pacing {
        reject_extra("pacing", &p.extra)?;
    }
    if let Some(ref i) = root.identity {
        reject_extra("identity", &i.extra)?;
    }
    if let Some(ref l) = root.launcher {
        reject_extra("launcher", &l.extra)?;
    }

    // Start from defaults and apply whatever the file provides
    let mut cfg = ToolConfig {
        debug_log: root.debug_log,
        ..ToolConfig::default()
    };
    if let Some(c) = root.console {
        apply_console_patch(&mut cfg.console, c);
    }
    if let Some(h) = root.hlr {
        apply_hlr_patch(&mut cfg.hlr, h);
    }
    if let Some(p) = root.pacing {
        apply_pacing_patch(&mut cfg.pacing, p);
    }
    if let Some(i) = root.identity {
        apply_identity_patch(&mut cfg.identity, i)?;
    }
    if let Some(l) = root.launcher {
        apply_launcher_patch(&mut cfg.launcher, l);
    }

    SharedConfig::from_config(cfg)
}

/// Build `SharedConfig` from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<SharedConfig, ConfigError> {
    let mut contents = String::new();
    let mut reader = BufReader::new(reader);
    reader.read_to_string(&mut contents)?;
    from_toml_str(&contents)
}

/// Build `SharedConfig` from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SharedConfig, ConfigError> {
    let f = File::open(path)?;
    from_reader(f)
}

/// Loads the given file, or falls back to built-in defaults when no file is given
pub fn load_or_default(path: Option<&Path>) -> Result<SharedConfig, ConfigError> {
    match path {
        Some(p) => from_file(p),
        None => Ok(SharedConfig::default()),
    }
}

fn reject_extra(section: &str, extra: &HashMap<String, Value>) -> Result<(), ConfigError> {
    if extra.is_empty() {
        return Ok(());
    }
    Err(ConfigError::UnknownFields {
        section: if section.is_empty() { "top-level".to_string() } else { section.to_string() },
        fields: sorted_keys(extra).join(", "),
    })
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<&str> {
    let mut v: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
    v.sort_unstable();
    v
}

fn apply_console_patch(dst: &mut CfgConsole, src: ConsoleDto) {
    if let Some(v) = src.host {
        dst.host = v;
    }
    if let Some(v) = src.port {
        dst.port = v;
    }
    if let Some(v) = src.connect_timeout_secs {
        dst.connect_timeout = Duration::from_secs(v);
    }
    if let Some(v) = src.read_timeout_secs {
        dst.read_timeout = Duration::from_secs(v);
    }
    if let Some(v) = src.user_prompt {
        dst.user_prompt = v;
    }
    if let Some(v) = src.privileged_prompt {
        dst.privileged_prompt = v;
    }
}

fn apply_hlr_patch(dst: &mut CfgHlr, src: HlrDto) {
    if let Some(v) = src.path {
        dst.path = v;
    }
    if let Some(v) = src.number_column {
        dst.number_column = v;
    }
}

fn apply_pacing_patch(dst: &mut CfgPacing, src: PacingDto) {
    if let Some(v) = src.command_delay_ms {
        dst.command_delay = Duration::from_millis(v);
    }
    if let Some(v) = src.settle_delay_ms {
        dst.settle_delay = Duration::from_millis(v);
    }
    if let Some(v) = src.flood_delay_ms {
        dst.flood_delay = Duration::from_millis(v);
    }
    if let Some(v) = src.silent_sms_count {
        dst.silent_sms_count = v;
    }
}

fn apply_identity_patch(dst: &mut CfgIdentity, src: IdentityDto) -> Result<(), ConfigError> {
    if let Some(v) = src.sentinel_imsi {
        dst.sentinel_imsi = Imsi::parse(&v).map_err(|_| ConfigError::Invalid("identity.sentinel_imsi must be 5-15 digits"))?;
    }
    if let Some(v) = src.spoof_prefixes {
        dst.spoof_prefixes = v;
    }
    if let Some(v) = src.spoof_digits {
        dst.spoof_digits = v;
    }
    Ok(())
}

fn apply_launcher_patch(dst: &mut CfgLauncher, src: LauncherDto) {
    if let Some(v) = src.workdir {
        dst.workdir = v;
    }
    if src.tools_dir.is_some() {
        dst.tools_dir = src.tools_dir;
    }
    if let Some(v) = src.terminal {
        dst.terminal = v;
    }
    if let Some(v) = src.editor {
        dst.editor = v;
    }
    if let Some(v) = src.elevate {
        dst.elevate = v;
    }
    if let Some(v) = src.capture_program {
        dst.capture_program = v;
    }
    if let Some(v) = src.capture_interface {
        dst.capture_interface = v;
    }
    if let Some(v) = src.capture_stop_timeout_secs {
        dst.capture_stop_timeout = Duration::from_secs(v);
    }
    if let Some(v) = src.ussd_type {
        dst.ussd_type = v;
    }
    if let Some(v) = src.test_sms_extension {
        dst.test_sms_extension = v;
    }
    if let Some(v) = src.test_sms_text {
        dst.test_sms_text = v;
    }
}

/// ----------------------- DTOs for input shape -----------------------

#[derive(Deserialize)]
struct TomlConfigRoot {
    config_version: String,
    debug_log: Option<String>,

    #[serde(default)]
    console: Option<ConsoleDto>,

    #[serde(default)]
    hlr: Option<HlrDto>,

    #[serde(default)]
    pacing: Option<PacingDto>,

    #[serde(default)]
    identity: Option<IdentityDto>,

    #[serde(default)]
    launcher: Option<LauncherDto>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct ConsoleDto {
    host: Option<String>,
    port: Option<u16>,
    connect_timeout_secs: Option<u64>,
    read_timeout_secs: Option<u64>,
    user_prompt: Option<String>,
    privileged_prompt: Option<String>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct HlrDto {
    path: Option<PathBuf>,
    number_column: Option<NumberColumn>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct PacingDto {
    command_delay_ms: Option<u64>,
    settle_delay_ms: Option<u64>,
    flood_delay_ms: Option<u64>,
    silent_sms_count: Option<u32>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct IdentityDto {
    sentinel_imsi: Option<String>,
    spoof_prefixes: Option<Vec<String>>,
    spoof_digits: Option<usize>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct LauncherDto {
    workdir: Option<PathBuf>,
    tools_dir: Option<PathBuf>,
    terminal: Option<String>,
    editor: Option<String>,
    elevate: Option<Vec<String>>,
    capture_program: Option<String>,
    capture_interface: Option<String>,
    capture_stop_timeout_secs: Option<u64>,
    ussd_type: Option<u8>,
    test_sms_extension: Option<String>,
    test_sms_text: Option<String>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}
