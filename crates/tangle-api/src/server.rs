//! HTTP front end.
//!
//! `POST /` takes a command object, `GET /health` reports liveness. The
//! server runs until its shutdown channel fires, then drains in-flight
//! requests.

use crate::dispatcher::CommandDispatcher;
use crate::domain::access::AccessPolicy;
use crate::domain::config::{ConfigError, NodeConfig};
use crate::node::NodeContext;
use crate::transport::{DrainBody, ResponseTransport};
use axum::extract::{ConnectInfo, DefaultBodyLimit, Request, State};
use axum::http::Response;
use axum::middleware::{self, Next};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use bytes::Bytes;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Server lifecycle errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

/// When the request head arrived, before any of the body was read.
#[derive(Debug, Clone, Copy)]
struct Received(Instant);

/// Handler state shared across requests
#[derive(Clone)]
struct AppState {
    dispatcher: Arc<CommandDispatcher>,
    transport: ResponseTransport,
}

/// The node's HTTP API.
pub struct ApiServer {
    addr: SocketAddr,
    max_body_size: usize,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: &NodeConfig, context: Arc<NodeContext>) -> Result<Self, ServerError> {
        config.validate()?;
        let access = AccessPolicy::from_config(&config.access);
        Ok(Self {
            addr: config.api_addr(),
            max_body_size: config.api.max_body_size,
            state: AppState {
                dispatcher: Arc::new(CommandDispatcher::new(context, access)),
                transport: ResponseTransport::new(&config.api)?,
            },
        })
    }

    pub fn dispatcher(&self) -> Arc<CommandDispatcher> {
        Arc::clone(&self.state.dispatcher)
    }

    /// Routes and middleware, without a listener.
    pub fn router(&self) -> Router {
        let layers = ServiceBuilder::new()
            .layer(middleware::from_fn(stamp_received))
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.max_body_size));

        Router::new()
            .route("/", post(handle_command))
            .route("/health", get(health_check))
            .layer(layers)
            .with_state(self.state.clone())
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr,
                source,
            })
    }

    /// Serve on `listener` until `shutdown` fires or is dropped.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: oneshot::Receiver<()>,
    ) -> Result<(), ServerError> {
        let local = listener.local_addr().map_err(ServerError::Serve)?;
        info!(addr = %local, "API server listening");

        let app = self.router();
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
            info!("Received shutdown signal");
        })
        .await
        .map_err(ServerError::Serve)?;

        info!(
            requests = self.state.dispatcher.request_count(),
            "API server stopped"
        );
        Ok(())
    }

    /// Bind and serve.
    pub async fn run(self, shutdown: oneshot::Receiver<()>) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }
}

async fn stamp_received(mut request: Request, next: Next) -> axum::response::Response {
    request.extensions_mut().insert(Received(Instant::now()));
    next.run(request).await
}

async fn handle_command(
    State(state): State<AppState>,
    ConnectInfo(origin): ConnectInfo<SocketAddr>,
    Extension(Received(received)): Extension<Received>,
    body: Bytes,
) -> Response<DrainBody> {
    let outcome = state.dispatcher.dispatch(&body, origin).await;
    state.transport.respond(outcome, received)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "tangle-api",
        "version": crate::VERSION,
    }))
}
