//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all route
//! - Wire up middleware (request tracing)
//! - Serve on a bound listener until shutdown is signalled

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::http::proxy::ProxyServer;

/// HTTP server for the caching proxy.
pub struct HttpServer {
    router: Router,
    proxy: Arc<ProxyServer>,
}

impl HttpServer {
    /// Create a server that dispatches every request to `proxy`.
    pub fn new(proxy: ProxyServer) -> Self {
        let proxy = Arc::new(proxy);
        let router = Self::build_router(proxy.clone());
        Self { router, proxy }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(proxy: Arc<ProxyServer>) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(proxy)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    /// The router, for embedding or driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn proxy(&self) -> &ProxyServer {
        &self.proxy
    }

    /// Run the server, accepting connections on the given listener until a
    /// shutdown signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.proxy.upstream().base(),
            cache_dir = %self.proxy.cache().root().display(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every method, every path.
async fn proxy_handler(State(proxy): State<Arc<ProxyServer>>, request: Request<Body>) -> Response {
    proxy.handle(request).await
}
