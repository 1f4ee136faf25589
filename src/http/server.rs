//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all mock handler
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Resolve each request to a route and run its action
//! - Swap in a new resolver when a reloaded config arrives
//! - Graceful shutdown on broadcast signal

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::actions::{Executor, Query};
use crate::codec::CodecRegistry;
use crate::config::MockConfig;
use crate::http::request::{decoded_path, request_id, RequestUuid};
use crate::observability::metrics;
use crate::routing::{Resolver, RouteError, RouteTableError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Current routes; replaced wholesale on reload.
    pub resolver: Arc<ArcSwap<Resolver>>,
    pub executor: Executor,
}

/// HTTP server for the mock data store.
pub struct HttpServer {
    router: Router,
    config: MockConfig,
    state: AppState,
    codecs: Arc<CodecRegistry>,
}

impl HttpServer {
    /// Create a new HTTP server; fails when the configured routes do not resolve.
    pub fn new(config: MockConfig) -> Result<Self, RouteTableError> {
        let codecs = Arc::new(CodecRegistry::default());
        let resolver = Resolver::from_config(&config, codecs.clone())?;

        tracing::info!(
            routes = resolver.table().len(),
            dynamic_route = resolver.dynamic_enabled(),
            db_root = %config.storage.db_root,
            "Route table built"
        );

        let state = AppState {
            resolver: Arc::new(ArcSwap::from_pointee(resolver)),
            executor: Executor::default(),
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            config,
            state,
            codecs,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &MockConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(mock_handler))
            .route("/{*path}", any(mock_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(RequestUuid))
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configs received on `config_updates` replace the route table; listener,
    /// timeout and limit settings keep their startup values.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<MockConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        tokio::spawn(apply_config_updates(
            self.state.resolver.clone(),
            self.codecs.clone(),
            config_updates,
        ));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Rebuild and swap the resolver for every validated config received.
async fn apply_config_updates(
    resolver: Arc<ArcSwap<Resolver>>,
    codecs: Arc<CodecRegistry>,
    mut updates: mpsc::UnboundedReceiver<MockConfig>,
) {
    while let Some(config) = updates.recv().await {
        match Resolver::from_config(&config, codecs.clone()) {
            Ok(next) => {
                let routes = next.table().len();
                resolver.store(Arc::new(next));
                tracing::info!(routes, "Route table reloaded");
            }
            Err(e) => {
                tracing::error!(error = %e, "Reloaded config rejected. Keeping current routes.");
            }
        }
    }
}

/// Catch-all handler: resolve the route, run its action, encode the reply.
async fn mock_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&headers);
    let query = Query::parse(uri.query());
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let resolved = match decoded_path(&uri) {
        Some(path) => state
            .resolver
            .load()
            .resolve(&path, method.as_str(), content_type, query),
        None => Err(RouteError::NotFound {
            method: method.to_string(),
            path: uri.path().to_string(),
        }),
    };
    let resolved = match resolved {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %uri.path(),
                error = %e,
                "Request not routed"
            );
            metrics::record_request(method.as_str(), e.status().as_u16(), "none", start_time);
            return e.into_response();
        }
    };

    let route = resolved.route;
    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %uri.path(),
        route = %route.label(),
        action = %route.action,
        dynamic = resolved.dynamic,
        "Route matched"
    );

    match state.executor.execute(&route, &resolved.query, &body).await {
        Ok(reply) => {
            metrics::record_request(method.as_str(), 200, route.action.as_str(), start_time);
            reply.into_response()
        }
        Err(e) => {
            metrics::record_request(method.as_str(), e.status().as_u16(), route.action.as_str(), start_time);
            e.into_response()
        }
    }
}
