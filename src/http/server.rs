//! HTTP gateway setup and request handling.
//!
//! # Responsibilities
//! - Create the Axum router with the multiply route and health route
//! - Wire up middleware (CORS, tracing, request ID)
//! - Decode JSON bodies into call arguments
//! - Forward each request to the RPC service and relay the result
//! - Map failures to HTTP statuses

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, State},
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::HttpConfig;
use crate::http::cors::cors_middleware;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::GatewayError;
use crate::observability::metrics;
use crate::rpc::{CallArguments, CallResult, RpcClient};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: RpcClient,
    pub method: Arc<str>,
}

/// The HTTP side of the gateway.
pub struct HttpServer {
    router: Router,
    config: HttpConfig,
}

impl HttpServer {
    /// Create a new gateway that forwards to `client`.
    pub fn new(config: HttpConfig, client: RpcClient) -> Self {
        let state = AppState {
            client,
            method: Arc::from(config.method.as_str()),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &HttpConfig, state: AppState) -> Router {
        // Layered on the method router so the 405 fallback also passes
        // through CORS and OPTIONS is answered before it.
        let mut rpc_route = post(multiply_handler).fallback(method_not_allowed);
        if config.cors {
            rpc_route = rpc_route.layer(middleware::from_fn(cors_middleware));
        }

        Router::new()
            .route(&config.route, rpc_route)
            .route("/healthz", get(healthz))
            .with_state(state)
            .layer(middleware::from_fn(record_metrics))
            .layer(DefaultBodyLimit::disable())
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                        tracing::info_span!(
                            "http",
                            method = %req.method(),
                            path = %req.uri().path(),
                            request_id = %request_id(req.headers()),
                        )
                    }))
                    .layer(propagate_request_id_layer()),
            )
    }

    /// The fully layered router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            route = %self.config.route,
            cors = self.config.cors,
            "HTTP gateway listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP gateway received shutdown signal, draining");
            })
            .await?;

        tracing::info!("HTTP gateway stopped");
        Ok(())
    }
}

/// Decode the JSON body, call the RPC service, and relay the result.
async fn multiply_handler(State(state): State<AppState>, body: Bytes) -> Response {
    match forward(&state, &body).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            match &e {
                GatewayError::Decode(_) | GatewayError::EmptyBody => tracing::debug!(error = %e, "Rejected request body"),
                _ => tracing::warn!(error = %e, upstream = %state.client.addr(), "RPC forwarding failed"),
            }
            e.into_response()
        }
    }
}

/// Count every response by status, including 405s and preflights.
async fn record_metrics(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let response = next.run(req).await;
    metrics::record_request(response.status().as_u16(), start);
    response
}

async fn forward(state: &AppState, body: &[u8]) -> Result<CallResult, GatewayError> {
    // Only the first JSON value counts; anything after it is ignored.
    let args = match serde_json::Deserializer::from_slice(body)
        .into_iter::<CallArguments>()
        .next()
    {
        Some(args) => args?,
        None => return Err(GatewayError::EmptyBody),
    };
    tracing::debug!(a = args.a, b = args.b, method = %state.method, "Forwarding RPC call");

    let result = state.client.call(&state.method, &args).await?;
    Ok(result)
}

async fn method_not_allowed() -> GatewayError {
    GatewayError::MethodNotAllowed
}

async fn healthz() -> &'static str {
    "ok"
}
