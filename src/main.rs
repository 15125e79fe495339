use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gatekeeper::config::GatekeeperConfig;
use gatekeeper::http::HttpServer;
use gatekeeper::ratelimit::{AdmissionController, EvictionSweep, WindowedCounterStore};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Admission controller service for AI-backed endpoints.
#[derive(Parser, Debug)]
#[command(name = "gatekeeper", version)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override the HTTP listen address
    #[arg(long)]
    http_addr: Option<SocketAddr>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match args.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_thread_ids(true)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .init(),
    }

    info!("Starting Gatekeeper Admission Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Misconfigured limits are fatal
    let mut config = GatekeeperConfig::load(args.config.as_deref())?;
    if let Some(addr) = args.http_addr {
        config.server.http_addr = addr;
    }
    let policy = config.limits.policy()?;
    info!(
        http_addr = %config.server.http_addr,
        cooldown_ms = config.limits.cooldown_ms,
        max_per_hour = policy.max_per_hour,
        max_per_day = policy.max_per_day,
        reset_zone = %policy.daily_reset_zone,
        "Configuration loaded"
    );

    let store = Arc::new(WindowedCounterStore::new());
    let controller = Arc::new(AdmissionController::new(Arc::clone(&store), policy));
    info!("Admission controller initialized");

    let sweep = EvictionSweep::new(store, config.limits.sweep_interval()).start();

    let subject_header = config.guard.header_name()?;
    let server = HttpServer::new(config.server.http_addr, controller, subject_header);
    let served = server.serve_with_shutdown(shutdown_signal()).await;

    sweep.stop().await;
    served?;

    info!("Gatekeeper Admission Service stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
