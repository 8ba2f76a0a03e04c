//! Podcheck server: entry point.
//!
//! Serves the login, redirect and verification endpoints with configuration
//! from a TOML file or defaults.

mod api;
mod config;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use podcheck_pipeline::{HttpFetcher, OidcLogin, Orchestrator, Pipeline};

use api::AppState;
use config::{LoggingConfig, PodcheckConfig};

/// Podcheck verification server
#[derive(Parser, Debug)]
#[command(name = "podcheck-server", version, about = "Podcheck verification server")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "podcheck.toml")]
    config: PathBuf,

    /// Override the listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match logging.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.init {
        let config = PodcheckConfig::default();
        config.save(&args.config)?;
        println!("wrote default config to {}", args.config.display());
        return Ok(());
    }

    let mut config = PodcheckConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging);
    tracing::info!("podcheck server v{}", env!("CARGO_PKG_VERSION"));

    let pipeline_config = config.pipeline();
    let timeout = pipeline_config.fetch.timeout();
    let redirect_target = config.redirect_target()?;

    let fetcher = Arc::new(HttpFetcher::new(timeout)?);
    let provider_client = reqwest::Client::builder().timeout(timeout).build()?;
    let mut login = OidcLogin::new(provider_client, config.auth.client_name.clone())
        .with_scope(config.auth.scope.clone());
    if let Some(client_id) = &config.auth.client_id {
        login = login.with_client_id(client_id.clone());
    }
    let login = Arc::new(login);

    let orchestrator = Orchestrator::new(
        Pipeline::new(fetcher, &pipeline_config),
        login,
        redirect_target.clone(),
    )
    .with_default_issuer(config.auth.default_issuer.clone())
    .with_default_credit_resource(pipeline_config.default_credit_resource.clone());

    let state = Arc::new(AppState {
        orchestrator,
        redirect_target,
    });

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
        tracing::info!("received shutdown signal");
    };

    api::serve(listener, state, shutdown).await?;
    tracing::info!("podcheck server exited cleanly");
    Ok(())
}
