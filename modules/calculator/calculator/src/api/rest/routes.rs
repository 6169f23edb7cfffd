use std::sync::Arc;

use axum::{
    Extension, Router, middleware,
    routing::{get, post},
};

use super::handlers;
use super::session::{SessionState, session_middleware};
use crate::domain::service::Service;

/// Mount the calculator routes onto `router`.
///
/// Only the session-scoped routes pass through the session middleware, so
/// the page and the API document never set a cookie.
pub fn register_routes(router: Router, service: Arc<Service>, sessions: SessionState) -> Router {
    let api = Router::new()
        .route("/calculate", post(handlers::compute))
        .route(
            "/history",
            get(handlers::get_history).delete(handlers::clear_history),
        )
        .route_layer(middleware::from_fn_with_state(sessions, session_middleware))
        .layer(Extension(service));

    router
        .merge(api)
        .route("/", get(handlers::index))
        .route("/openapi.json", get(handlers::openapi_json))
}
