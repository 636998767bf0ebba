//! # dashkit_api
//!
//! HTTP surface for Dashkit: the envelope dispatch endpoint and the
//! byte-range resource endpoint.

pub mod config;
pub mod error;
pub mod handlers;
pub mod resource;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use dashkit_core::Dispatcher;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{dispatch, resource as resource_handlers};
use crate::resource::ResourceProvider;

/// Dispatch endpoint path.
pub const DISPATCH_PATH: &str = "/";
/// Resource endpoint path.
pub const RESOURCE_PATH: &str = "/resource/{*path}";

/// Shared application state passed to all handlers.
pub struct AppState<S> {
    pub dispatcher: Arc<Dispatcher<S>>,
    /// Backing source of the resource endpoint; `None` answers 404.
    pub resources: Option<Arc<dyn ResourceProvider>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            resources: self.resources.clone(),
        }
    }
}

impl<S> AppState<S>
where
    S: Send + Sync + 'static,
{
    pub fn new(dispatcher: Dispatcher<S>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            resources: None,
        }
    }

    pub fn with_resources(mut self, provider: impl ResourceProvider + 'static) -> Self {
        self.resources = Some(Arc::new(provider));
        self
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router<S>(state: AppState<S>) -> Router
where
    S: Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(DISPATCH_PATH, post(dispatch::dispatch_handler::<S>))
        .route(RESOURCE_PATH, get(resource_handlers::resource_handler::<S>))
        .layer(cors)
        .with_state(state)
}

/// Bind `config` and serve until Ctrl-C.
pub async fn serve<S>(config: &ServerConfig, state: AppState<S>) -> ApiResult<()>
where
    S: Send + Sync + 'static,
{
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ApiError::Bind {
            addr: addr.clone(),
            source,
        })?;
    let local_addr = listener.local_addr()?;

    info!(addr = %local_addr, "dashkit server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("dashkit server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
