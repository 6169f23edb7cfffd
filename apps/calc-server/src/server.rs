use std::any::Any;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{HeaderName, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use calc_bootstrap::ServerConfig;
use calc_errors::Problem;
use calculator::CalculatorModule;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::field::Empty;

fn request_id_header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

/// Assemble the application router: module routes, probes, fallback and
/// the HTTP middleware stack.
pub fn build_router(cfg: &ServerConfig, module: &CalculatorModule) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(|| async { "ok" }));
    let router = module.register_rest(router).fallback(not_found);
    apply_middleware_stack(router, cfg)
}

fn apply_middleware_stack(router: Router, cfg: &ServerConfig) -> Router {
    // Registered innermost first; the last layer runs first.
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            Duration::from_secs(cfg.request_timeout_secs),
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<Body>| {
                    let rid = req
                        .headers()
                        .get(request_id_header())
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("n/a");
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        uri = %req.uri().path(),
                        request_id = %rid,
                        status = Empty,
                        latency_ms = Empty,
                    )
                })
                .on_response(
                    |res: &Response, latency: Duration, span: &tracing::Span| {
                        span.record("status", res.status().as_u16());
                        span.record("latency_ms", latency.as_millis());
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(PropagateRequestIdLayer::new(request_id_header()))
        .layer(SetRequestIdLayer::new(request_id_header(), MakeRequestUuid))
}

async fn health() -> &'static str {
    "OK"
}

async fn not_found(uri: Uri) -> Problem {
    calc_errors::not_found("Not found")
        .with_code("NOT_FOUND")
        .with_instance(uri.path())
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Request handler panicked");

    calc_errors::internal_error("Internal server error")
        .with_code("INTERNAL_ERROR")
        .into_response()
}

/// Parse the configured bind address.
///
/// # Errors
/// Returns an error if `bind_addr` is not a socket address.
pub fn parse_bind_address(bind_addr: &str) -> Result<SocketAddr> {
    bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{bind_addr}': {e}"))
}

/// Serve `router` on `listener` until `cancel` fires, then drain in-flight
/// requests.
///
/// # Errors
/// Returns an error if the server fails while accepting connections.
pub async fn serve(listener: TcpListener, router: Router, cancel: CancellationToken) -> Result<()> {
    let shutdown = async move {
        cancel.cancelled().await;
        tracing::info!("HTTP server shutting down gracefully");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}
