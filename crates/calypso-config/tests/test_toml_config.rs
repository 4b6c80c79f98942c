use std::io::Write;
use std::time::Duration;

use calypso_config::{ConfigError, NumberColumn, from_file, from_toml_str, load_or_default};

const FULL_CONFIG: &str = r#"
config_version = "0.1"
debug_log = "/tmp/calypso.log"

[console]
host = "10.0.0.2"
port = 4243
read_timeout_secs = 3
user_prompt = "NITB> "
privileged_prompt = "NITB# "

[hlr]
path = "/var/lib/osmocom/hlr.sqlite3"
number_column = "Msisdn"

[pacing]
command_delay_ms = 50
settle_delay_ms = 500
flood_delay_ms = 0
silent_sms_count = 1

[identity]
sentinel_imsi = "606059999999999"
spoof_prefixes = ["0218"]
spoof_digits = 6

[launcher]
workdir = "/opt/bts"
elevate = []
capture_interface = "any"
"#;

#[test]
fn test_full_config() {
    let shared = from_toml_str(FULL_CONFIG).expect("valid config");
    let cfg = shared.config();
    assert_eq!(cfg.debug_log.as_deref(), Some("/tmp/calypso.log"));
    assert_eq!(cfg.console.host, "10.0.0.2");
    assert_eq!(cfg.console.port, 4243);
    assert_eq!(cfg.console.read_timeout, Duration::from_secs(3));
    // Not given, so default
    assert_eq!(cfg.console.connect_timeout, Duration::from_secs(10));
    assert_eq!(cfg.console.user_prompt, "NITB> ");
    assert_eq!(cfg.hlr.number_column, NumberColumn::Msisdn);
    assert_eq!(cfg.pacing.command_delay, Duration::from_millis(50));
    assert_eq!(cfg.pacing.flood_delay, Duration::ZERO);
    assert_eq!(cfg.pacing.silent_sms_count, 1);
    assert_eq!(cfg.identity.sentinel_imsi.as_str(), "606059999999999");
    assert_eq!(cfg.identity.spoof_prefixes, vec!["0218".to_string()]);
    assert!(cfg.launcher.elevate.is_empty());
    assert_eq!(cfg.launcher.capture_interface, "any");
    assert_eq!(cfg.launcher.terminal, "gnome-terminal");
}

#[test]
fn test_minimal_config_uses_defaults() {
    let shared = from_toml_str("config_version = \"0.1\"\n").unwrap();
    let cfg = shared.config();
    assert_eq!(cfg.console.host, "localhost");
    assert_eq!(cfg.console.port, 4242);
    assert_eq!(cfg.hlr.path.to_str(), Some("/root/.osmocom/hlr.sqlite3"));
}

#[test]
fn test_wrong_version_rejected() {
    let err = from_toml_str("config_version = \"0.5\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Version { .. }), "{err}");
}

#[test]
fn test_unknown_fields_rejected() {
    let err = from_toml_str("config_version = \"0.1\"\nfoo = 1\nbar = 2\n").unwrap_err();
    match err {
        ConfigError::UnknownFields { section, fields } => {
            assert_eq!(section, "top-level");
            assert_eq!(fields, "bar, foo");
        }
        other => panic!("unexpected error {other}"),
    }

    let err = from_toml_str("config_version = \"0.1\"\n[console]\nhots = \"x\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::UnknownFields { ref section, .. } if section == "console"));
}

#[test]
fn test_invalid_values_rejected() {
    let err = from_toml_str("config_version = \"0.1\"\n[identity]\nsentinel_imsi = \"12ab\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = from_toml_str("config_version = \"0.1\"\n[console]\nport = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = from_toml_str("config_version = \"0.1\"\n[hlr]\nnumber_column = \"Imei\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_from_file_and_default() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "config_version = \"0.1\"\n[console]\nport = 5000").unwrap();
    let shared = from_file(file.path()).unwrap();
    assert_eq!(shared.config().console.port, 5000);

    let shared = load_or_default(None).unwrap();
    assert_eq!(shared.config().console.port, 4242);

    assert!(matches!(from_file("/nonexistent/calypso.toml"), Err(ConfigError::Io(_))));
}
