//! Room Server
//!
//! Real-time spatial audio room server.
//!
//! # Servers
//!
//! - WebSocket server for clients at `/ws` (default: 0.0.0.0:5000)
//! - HTTP server for health and metrics (default: 0.0.0.0:8081)
//!
//! # Startup Flow
//!
//! 1. Initialize tracing from `RUST_LOG` / `ROOMS_LOG_JSON`
//! 2. Load configuration from environment
//! 3. Initialize Prometheus metrics recorder
//! 4. Spawn the controller actor
//! 5. Start health HTTP server
//! 6. Start WebSocket server and mark ready
//! 7. Wait for shutdown signal

#![warn(clippy::pedantic)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use common::config::{ObservabilityConfig, DEFAULT_LOG_FILTER};
use room_server::actors::RoomControllerHandle;
use room_server::config::Config;
use room_server::coordinator::CoordinatorSettings;
use room_server::liveness::KeepaliveSettings;
use room_server::observability::{health_router, init_metrics_recorder, HealthState};
use room_server::transport::ws_router;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Period of the status log line.
const STATUS_REPORT_INTERVAL: Duration = Duration::from_secs(60);

/// Time given to connection tasks to flush and close after shutdown.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let vars: HashMap<String, String> = std::env::vars().collect();
    let observability = ObservabilityConfig::from_vars(&vars);

    let filter = EnvFilter::try_new(&observability.log_level)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            observability
                .json_logs
                .then(|| tracing_subscriber::fmt::layer().json()),
        )
        .with((!observability.json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    info!("Starting Room Server");

    let config = Config::from_vars(&vars).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        server_id = %config.server_id,
        bind_address = %config.bind_address,
        health_bind_address = %config.health_bind_address,
        grid_width = config.grid_width,
        grid_height = config.grid_height,
        keepalive_interval_seconds = config.keepalive_interval_seconds,
        keepalive_timeout_seconds = config.keepalive_timeout_seconds,
        sink_buffer_limit_bytes = config.sink_buffer_limit_bytes,
        "Configuration loaded successfully"
    );

    // Must happen before any metrics are recorded
    let prometheus_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        e
    })?;
    info!("Prometheus metrics recorder initialized");

    let health_state = Arc::new(HealthState::new());

    let controller_handle = RoomControllerHandle::new(
        config.server_id.clone(),
        CoordinatorSettings::from(&config),
    );
    info!("Actor system initialized");

    // Child of the controller's token so cancelling the controller stops every server
    let shutdown_token = controller_handle.child_token();

    let health_addr: SocketAddr = config.health_bind_address.parse().map_err(|e| {
        error!(error = %e, addr = %config.health_bind_address, "Invalid health bind address");
        format!("Invalid health bind address: {e}")
    })?;
    let health_listener = TcpListener::bind(health_addr).await.map_err(|e| {
        error!(error = %e, addr = %health_addr, "Failed to bind health server");
        format!("Failed to bind health server to {health_addr}: {e}")
    })?;

    let health_app = health_router(Arc::clone(&health_state), Some(prometheus_handle));
    let health_shutdown_token = shutdown_token.child_token();
    tokio::spawn(async move {
        info!(addr = %health_addr, "Health server starting");
        let server = axum::serve(health_listener, health_app).with_graceful_shutdown(async move {
            health_shutdown_token.cancelled().await;
            info!("Health server shutting down");
        });
        if let Err(e) = server.await {
            error!(error = %e, "Health server failed");
        }
    });

    let ws_addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!(error = %e, addr = %config.bind_address, "Invalid bind address");
        format!("Invalid bind address: {e}")
    })?;
    let ws_listener = TcpListener::bind(ws_addr).await.map_err(|e| {
        error!(error = %e, addr = %ws_addr, "Failed to bind WebSocket server");
        format!("Failed to bind WebSocket server to {ws_addr}: {e}")
    })?;

    let ws_app = ws_router(
        controller_handle.clone(),
        KeepaliveSettings::from(&config),
    );
    let ws_shutdown_token = shutdown_token.child_token();
    tokio::spawn(async move {
        info!(addr = %ws_addr, "WebSocket server starting");
        let server = axum::serve(ws_listener, ws_app).with_graceful_shutdown(async move {
            ws_shutdown_token.cancelled().await;
            info!("WebSocket server shutting down");
        });
        if let Err(e) = server.await {
            error!(error = %e, "WebSocket server failed");
        }
    });

    health_state.set_ready();

    let status_token = shutdown_token.child_token();
    let status_handle = controller_handle.clone();
    tokio::spawn(async move {
        run_status_reporter(status_handle, status_token).await;
    });

    info!("Room Server running - press Ctrl+C to shutdown");
    shutdown_signal().await;

    info!("Shutdown signal received, initiating graceful shutdown...");

    // Not ready first so load balancers stop routing new clients here
    health_state.set_not_ready();

    match controller_handle.shutdown().await {
        Ok(closed) => info!(connections_closed = closed, "Connections closed"),
        Err(e) => warn!(error = %e, "Actor system shutdown error"),
    }

    shutdown_token.cancel();
    tokio::time::sleep(SHUTDOWN_GRACE_PERIOD).await;
    controller_handle.cancel();

    info!("Room Server shutdown complete");
    Ok(())
}

/// Periodically log controller status.
async fn run_status_reporter(controller: RoomControllerHandle, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(STATUS_REPORT_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                match controller.get_status().await {
                    Ok(status) => info!(
                        connections = status.connections,
                        rooms = status.rooms,
                        members = status.members,
                        mailbox_depth = status.mailbox_depth,
                        "Server status"
                    ),
                    Err(e) => warn!(error = %e, "Status query failed"),
                }
            }
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed. This is acceptable because
/// without signal handlers, we cannot gracefully shut down the service.
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
