//! Axum-based HTTP server.

use axum::routing::{any, get};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers::{self, drafts, proposals, snapshots};
use crate::AppState;

/// Build the router with every endpoint.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/api/proposals", get(proposals::list))
        .route("/api/cron-proposals", any(proposals::cron))
        .route("/api/transparency/dao", get(snapshots::dao))
        .route("/api/stabilizer/balances", get(snapshots::stabilizer))
        .route("/api/drafts", get(drafts::list).post(drafts::create))
        .route(
            "/api/drafts/:id",
            get(drafts::get).put(drafts::update).delete(drafts::delete),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct ApiServer {
    pub listen: SocketAddr,
}

impl ApiServer {
    pub fn new(listen: SocketAddr) -> Self {
        Self { listen }
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn serve(
        &self,
        state: AppState,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.listen).await?;
        info!(addr = %listener.local_addr()?, "api server listening");
        axum::serve(listener, router(state))
            .with_graceful_shutdown(shutdown)
            .await
    }
}
