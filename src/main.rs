//! Session-injecting reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                    SESSION PROXY                     │
//!                     │                                                      │
//!  Client Request     │  ┌─────────┐   ┌─────────┐   ┌───────────────┐       │
//!  ───────────────────┼─▶│  http   │──▶│ routing │──▶│  relay +      │───────┼──▶ Backend
//!                     │  │ server  │   │classify │   │  redirects    │       │
//!                     │  └─────────┘   └────┬────┘   └───────┬───────┘       │
//!                     │                     │                │               │
//!                     │          static / config.js   security::headers      │
//!                     │                               (session cookie in,    │
//!                     │                                Set-Cookie out)       │
//!                     │                                                      │
//!                     │  startup: config → backend → session login → bind    │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use bz_session_proxy::config::{load_config, ConfigError};
use bz_session_proxy::http::HttpServer;
use bz_session_proxy::lifecycle::{signals, startup, Shutdown};
use bz_session_proxy::observability::{logging, metrics};
use bz_session_proxy::resilience::TimeoutPolicy;

#[derive(Parser, Debug)]
#[command(name = "bz-session-proxy", version, about = "Session-injecting reverse proxy for Bugzilla")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "proxy.toml")]
    config: PathBuf,

    /// Named configuration to run (defaults to `default_config`)
    config_name: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let (name, site) = match config.select(cli.config_name.as_deref()) {
        Ok(selected) => selected,
        Err(e @ (ConfigError::UnknownConfig(_) | ConfigError::NoConfigName)) => {
            eprintln!("Usage: bz-session-proxy [--config <file>] [<config_name>]");
            eprintln!("{} ({})", e, cli.config.display());
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("{}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability.log_level);
    tracing::info!(config = %name, backend = %site.bugzilla_url, "bz-session-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let state = match startup::prepare(&config, &site).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let listener = match startup::bind(&site).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(state, TimeoutPolicy::from_config(&config.timeouts));
    if let Err(e) = server.run(listener, shutdown.subscribe()).await {
        tracing::error!(error = %e, "Server failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
