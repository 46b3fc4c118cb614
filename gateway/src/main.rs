//! Warden gateway
//!
//! Serves the admin and biz gRPC services behind the audit and authorization
//! layers, plus an HTTP endpoint for health checks and metrics.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use warden_gateway::{config::GatewayConfig, server, EventHub, StatTracker};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = GatewayConfig::default();
    let acl = config.acl.load().context("Failed to load ACL")?;
    if acl.is_empty() {
        warn!("ACL is empty, every call will be denied");
    }
    info!(
        "Starting Warden gateway on {} ({} consumers in ACL)",
        config.listen_addr,
        acl.len()
    );

    let hub = Arc::new(EventHub::new(config.event_buffer));
    let stats = Arc::new(StatTracker::new());
    let gateway = server::Gateway::new(acl, hub, stats);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    let admin_addr: SocketAddr = config
        .admin_addr
        .parse()
        .context("Invalid admin listen address")?;
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = server::http::serve_admin(admin_addr, shutdown).await {
                warn!("Admin HTTP server failed: {}", e);
            }
        }
    });

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Listening on {} failed", config.listen_addr))?;

    gateway
        .serve(listener, shutdown)
        .await
        .context("gRPC server error")?;

    info!("Gateway stopped");
    Ok(())
}
