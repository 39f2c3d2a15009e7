//! Commit Server - Main entry point
//!
//! This binary loads configuration from the environment, then runs the HTTP
//! server until SIGINT or SIGTERM.

use anyhow::{Context, Result};
use chrono::Local;
use commit_server::{
    api::{app_router, AppState},
    core::{init_metrics, AppConfig},
    providers::build_http_client,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Custom time formatter that uses local timezone (respects TZ environment variable)
struct LocalTime;

impl tracing_subscriber::fmt::time::FormatTime for LocalTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%d %H:%M:%S"))
    }
}

fn init_tracing() {
    // Check if NO_COLOR environment variable is set (for file logging without ANSI codes)
    let no_color = std::env::var("NO_COLOR").is_ok();
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let base_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,commit_server=debug".to_string());

    // Always suppress noisy HTTP library logs regardless of RUST_LOG setting
    let filter_str = format!(
        "{},hyper=warn,hyper::proto=warn,h2=warn,reqwest=warn",
        base_filter
    );
    let filter = tracing_subscriber::EnvFilter::new(filter_str);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_timer(LocalTime)
                    .with_current_span(true),
            )
            .init();
    } else if no_color {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_timer(LocalTime)
                    .with_ansi(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_timer(LocalTime))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before reading any environment variables)
    dotenvy::dotenv().ok();

    init_tracing();
    init_metrics();

    let config = AppConfig::from_env()?;
    tracing::debug!(providers = ?config.providers, "Provider configuration");

    let host: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid value for HOST: {:?}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);
    let grace = Duration::from_secs(config.shutdown_grace_secs);

    let http_client = build_http_client()?;
    let state = Arc::new(AppState::new(config, http_client));

    tracing::info!(
        env = %state.config.server.env,
        default_provider = %state.provider_service.default_provider(),
        allowlisted_ips = state.access_guard.len(),
        "Starting commit server on {}",
        addr
    );
    tracing::info!("Generation endpoint: POST /");
    tracing::info!("Metrics endpoint: /metrics");

    let app = app_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Fires once the signal arrives so the grace-period clock can start.
    let (signal_tx, signal_rx) = oneshot::channel::<()>();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signal_tx.send(());
    });

    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut server => {
            result??;
        }
        Ok(()) = signal_rx => {
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result??,
                Err(_) => tracing::warn!(
                    grace_secs = grace.as_secs(),
                    "In-flight requests did not finish within the grace period, exiting"
                ),
            }
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}
