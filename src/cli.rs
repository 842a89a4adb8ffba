//! Command-line interface definition for toolreg
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands to serve the invoke endpoint, call a single tool,
//! and probe the remote MCP server.

use clap::{Parser, Subcommand};

/// toolreg - invoke registered tools on a remote MCP server
///
/// Resolves tool numbers against the configured registry and forwards
/// calls over MCP (JSON-RPC over HTTP, JSON or SSE responses).
#[derive(Parser, Debug, Clone)]
#[command(name = "toolreg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Available commands for toolreg
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the HTTP invoke endpoint
    Serve {
        /// Address to bind, overriding `server.bind_address`
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Invoke one tool and print the result as JSON
    Call {
        /// Tool number, or tool id when no tool has that number
        #[arg(short, long)]
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long)]
        args: Option<String>,

        /// Caller session token
        #[arg(short, long, env = "TOOLREG_SESSION", hide_env_values = true)]
        session: Option<String>,
    },

    /// Check whether the MCP endpoint is reachable
    Ping {
        /// Session token to send with the probe
        #[arg(short, long, env = "TOOLREG_SESSION", hide_env_values = true)]
        session: Option<String>,
    },
}
