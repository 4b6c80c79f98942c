//! Configuration management for the Calypso BTS operator tools
//!
//! This crate provides configuration loading and parsing:
//! - TOML configuration file parsing with strict field checking
//! - Typed configuration sections with built-in defaults

pub mod tool_config;
pub mod toml_config;

pub use tool_config::*;
pub use toml_config::{from_file, from_reader, from_toml_str, load_or_default};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unrecognized config_version: {found}, expect {expected}")]
    Version { found: String, expected: &'static str },

    #[error("unrecognized fields in {section}: {fields}")]
    UnknownFields { section: String, fields: String },

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}
