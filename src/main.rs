//! toolreg - invoke registered tools on a remote MCP server
//!
#![doc = "Main entry point for the toolreg binary."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use toolreg::cli::{Cli, Commands};
use toolreg::commands;
use toolreg::config::{Config, LoggingConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    init_tracing(&config.logging);

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Serve { .. } => {
            commands::serve::run_serve(config).await?;
            Ok(())
        }
        Commands::Call {
            tool,
            args,
            session,
        } => {
            tracing::debug!(tool = %tool, "Invoking tool from CLI");
            let result = commands::call::run_call(config, tool, args, session).await?;
            if result.is_error {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Ping { session } => {
            if !commands::ping::run_ping(config, session).await? {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let default_level = logging.level.as_deref().unwrap_or("toolreg=info");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.json_format {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
