//! Startup orchestration.
//!
//! # Responsibilities
//! - Build subsystems from a validated configuration, in dependency order
//! - Start the optional metrics exporter
//! - Bind the listener last, so traffic only arrives when ready
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The cache is constructed here and injected into the proxy

use tokio::net::TcpListener;

use crate::cache::ResponseCache;
use crate::config::ProxyConfig;
use crate::error::AppError;
use crate::http::{HttpServer, ProxyServer, UpstreamClient};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::PathPolicy;

/// Assemble the proxy from configuration without binding any socket.
pub async fn build_proxy(config: &ProxyConfig) -> Result<ProxyServer, AppError> {
    let policy = PathPolicy::new(config.cache.no_cache.iter().cloned())?;
    let cache = ResponseCache::open(&config.cache.dir).await?;
    let upstream = UpstreamClient::new(&config.upstream.url, config.timeouts.request())?;

    tracing::info!(
        upstream = %upstream.base(),
        cache_dir = %cache.root().display(),
        no_cache = ?policy.patterns().collect::<Vec<_>>(),
        timeout_secs = config.timeouts.request_secs,
        "Proxy configured"
    );

    Ok(ProxyServer::new(cache, policy, upstream, config.limits.max_body_bytes))
}

/// Run the proxy until SIGINT/SIGTERM.
pub async fn run(config: ProxyConfig) -> Result<(), AppError> {
    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address)?;
    }

    let proxy = build_proxy(&config).await?;
    let server = HttpServer::new(proxy);

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    server.run(listener, server_shutdown).await?;
    tracing::info!("Proxy server stopped");
    Ok(())
}
