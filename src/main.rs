//! irflow - connection check for an IR-Flow server
//!
//! Loads the client configuration, connects and prints the version the
//! server reports.
//!
//! # Configuration
//!
//! Pass the path of an INI file with an `[IRFlowAPI]` section as the first
//! argument, or set the `IRFLOW_*` environment variables (a `.env` file is
//! read when present):
//!
//! - `IRFLOW_ADDRESS`: Server FQDN or IP address
//! - `IRFLOW_API_USER`: API user
//! - `IRFLOW_API_KEY`: API key of that user
//!
//! # Usage
//!
//! ```bash
//! ./irflow api.conf
//!
//! IRFLOW_ADDRESS=irflow.example.com IRFLOW_API_USER=api IRFLOW_API_KEY=xxx ./irflow
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use irflow_client::{client::IrFlowClient, config::Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("irflow=info,irflow_client=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting irflow v{}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::from_env().context("Failed to load configuration from environment")?,
    };

    tracing::debug!("Configuration loaded, base_url: {}", config.base_url());

    let client = IrFlowClient::new(&config).context("Failed to create IR-Flow client")?;

    let version = client
        .get_version()
        .await
        .map_err(|e| anyhow::anyhow!(e.sanitized_display(config.api_key())))
        .context("Failed to reach the IR-Flow server")?;

    println!("IR-Flow {} at {}", version, client.base_url());

    Ok(())
}
