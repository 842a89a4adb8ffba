//! Configuration management for toolreg
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! Environment overrides, applied after the file:
//!
//! | Variable | Field |
//! |---|---|
//! | `TOOLREG_MCP_ENDPOINT` | `mcp.endpoint` |
//! | `TOOLREG_MCP_CLIENT_NAME` | `mcp.client_name` |
//! | `TOOLREG_CONNECT_TIMEOUT_SECONDS` | `mcp.connect_timeout_seconds` |
//! | `TOOLREG_READ_TIMEOUT_SECONDS` | `mcp.read_timeout_seconds` |
//! | `TOOLREG_BIND_ADDRESS` | `server.bind_address` |
//! | `TOOLREG_LOG_LEVEL` | `logging.level` |
//! | `TOOLREG_JSON_LOGS` | `logging.json_format` |

use crate::error::{Result, ToolregError};
use crate::registry::ToolRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

/// Main configuration structure for toolreg
///
/// Holds the remote MCP endpoint settings, the inbound HTTP server
/// settings, logging, and the registered tool table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote MCP server settings
    #[serde(default)]
    pub mcp: McpConfig,
    /// Inbound HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Registered tools, addressable by number or id
    #[serde(default)]
    pub tools: Vec<ToolRecord>,
}

/// Remote MCP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    /// Full URL of the MCP endpoint, e.g. `http://host:3001/mcp`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Value of the `X-Client-Name` header
    #[serde(default)]
    pub client_name: Option<String>,

    /// TCP connect timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Whole-request timeout, including reading an SSE body
    #[serde(default = "default_read_timeout")]
    pub read_timeout_seconds: u64,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:3001/mcp".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    30
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            client_name: None,
            connect_timeout_seconds: default_connect_timeout(),
            read_timeout_seconds: default_read_timeout(),
        }
    }
}

/// Inbound HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the invoke endpoint listens on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `toolreg=debug`. `RUST_LOG` wins
    /// when set.
    #[serde(default)]
    pub level: Option<String>,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json_format: bool,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged. The result is not validated; call [`Config::validate`].
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - Parsed command-line arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    /// Parse a configuration file without applying any overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ToolregError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ToolregError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ToolregError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(endpoint) = std::env::var("TOOLREG_MCP_ENDPOINT") {
            tracing::debug!(endpoint = %endpoint, "Env override: TOOLREG_MCP_ENDPOINT");
            self.mcp.endpoint = endpoint;
        }

        if let Ok(client_name) = std::env::var("TOOLREG_MCP_CLIENT_NAME") {
            tracing::debug!(client_name = %client_name, "Env override: TOOLREG_MCP_CLIENT_NAME");
            self.mcp.client_name = Some(client_name);
        }

        if let Ok(timeout) = std::env::var("TOOLREG_CONNECT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.mcp.connect_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid TOOLREG_CONNECT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(timeout) = std::env::var("TOOLREG_READ_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.mcp.read_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid TOOLREG_READ_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(bind) = std::env::var("TOOLREG_BIND_ADDRESS") {
            tracing::debug!(bind = %bind, "Env override: TOOLREG_BIND_ADDRESS");
            self.server.bind_address = bind;
        }

        if let Ok(level) = std::env::var("TOOLREG_LOG_LEVEL") {
            tracing::debug!(level = %level, "Env override: TOOLREG_LOG_LEVEL");
            self.logging.level = Some(level);
        }

        if let Ok(json_logs) = std::env::var("TOOLREG_JSON_LOGS") {
            match json_logs.parse::<bool>() {
                Ok(v) => {
                    self.logging.json_format = v;
                    tracing::debug!(json_logs = v, "Env override: TOOLREG_JSON_LOGS");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for TOOLREG_JSON_LOGS: {}", json_logs);
                }
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            self.logging.level = Some("debug".to_string());
        }
        if cli.json_logs {
            self.logging.json_format = true;
        }
        if let crate::cli::Commands::Serve {
            bind: Some(bind), ..
        } = &cli.command
        {
            self.server.bind_address = bind.clone();
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns [`ToolregError::Config`] naming the first failed check.
    pub fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.mcp.endpoint).map_err(|e| {
            ToolregError::Config(format!("mcp.endpoint is not a valid URL: {}", e))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ToolregError::Config(format!(
                "mcp.endpoint must use http or https, got: {}",
                endpoint.scheme()
            ))
            .into());
        }

        for (name, value) in [
            ("mcp.connect_timeout_seconds", self.mcp.connect_timeout_seconds),
            ("mcp.read_timeout_seconds", self.mcp.read_timeout_seconds),
        ] {
            if value == 0 || value > 600 {
                return Err(ToolregError::Config(format!(
                    "{} must be between 1 and 600",
                    name
                ))
                .into());
            }
        }

        if self.server.bind_address.parse::<SocketAddr>().is_err() {
            return Err(ToolregError::Config(format!(
                "server.bind_address is not a socket address: {}",
                self.server.bind_address
            ))
            .into());
        }

        let mut ids = HashSet::new();
        for tool in &self.tools {
            if tool.name.trim().is_empty() {
                return Err(ToolregError::Config(format!(
                    "tool with id {} has an empty name",
                    tool.id
                ))
                .into());
            }
            if !ids.insert(tool.id) {
                return Err(
                    ToolregError::Config(format!("duplicate tool id: {}", tool.id)).into(),
                );
            }
        }

        Ok(())
    }
}
