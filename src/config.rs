// src/config.rs

//! Manages server configuration: loading and validation.

use crate::core::SpinelNetError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use strum_macros::{Display, EnumString};

/// The protocol spoken on accepted connections.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Protocol {
    /// Every line is written straight back to the client.
    #[default]
    Echo,
    /// Inline `PING` / `SELECT` commands answered with canonical replies.
    Ping,
}

/// A raw representation of the config file before validation.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    protocol: Protocol,
    #[serde(default = "default_databases")]
    databases: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    6399
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_databases() -> usize {
    16
}

/// Represents the final, validated server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub protocol: Protocol,
    /// The number of logical databases a client may `SELECT`.
    pub databases: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            protocol: Protocol::default(),
            databases: default_databases(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        let raw_config: RawConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from '{path}'"))?;

        let config = Config {
            host: raw_config.host,
            port: raw_config.port,
            log_level: raw_config.log_level,
            protocol: raw_config.protocol,
            databases: raw_config.databases,
        };

        config.validate()?;
        Ok(config)
    }

    /// The `host:port` address the listener binds to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<(), SpinelNetError> {
        if self.port == 0 {
            return Err(SpinelNetError::Config("port cannot be 0".into()));
        }
        if self.host.trim().is_empty() {
            return Err(SpinelNetError::Config("host cannot be empty".into()));
        }
        if self.databases == 0 {
            return Err(SpinelNetError::Config("databases cannot be 0".into()));
        }
        if self.log_level.trim().is_empty() {
            return Err(SpinelNetError::Config("log_level cannot be empty".into()));
        }
        Ok(())
    }
}
