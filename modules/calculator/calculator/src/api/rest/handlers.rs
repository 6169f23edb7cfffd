use std::sync::Arc;

use axum::{
    Extension, Json,
    body::Bytes,
    http::{HeaderMap, HeaderValue, StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
};
use calc_errors::Problem;
use serde_json::Value;
use tracing::info;
use utoipa::OpenApi;

use super::dto::{ComputationEntryDto, ComputeRequest, MessageResponse};
use super::error::invalid_payload;
use super::openapi::ApiDoc;
use super::session::Session;
use crate::domain::service::Service;
use crate::domain::validator::payload_from_form;

pub type ApiResult<T> = Result<T, Problem>;

/// Set to `false` on a compute response whose entry was not written to history.
pub const HISTORY_PERSISTED: &str = "x-history-persisted";

const REQUEST_ID: &str = "x-request-id";

const INDEX_HTML: &str = include_str!("index.html");

/// Attach the request path and id to a problem.
fn in_context(problem: Problem, uri: &Uri, headers: &HeaderMap) -> Problem {
    let problem = problem.with_instance(uri.path());
    match headers.get(REQUEST_ID).and_then(|v| v.to_str().ok()) {
        Some(id) => problem.with_trace_id(id),
        None => problem,
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    content_type(headers).is_some_and(|mime| {
        mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
    })
}

fn is_form(headers: &HeaderMap) -> bool {
    content_type(headers).is_some_and(|mime| mime == "application/x-www-form-urlencoded")
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let mime = raw.split(';').next()?.trim().to_ascii_lowercase();
    Some(mime)
}

/// Decode the body of a compute request into a payload for validation.
///
/// JSON bodies are parsed as-is. Anything else is read as a form; a body
/// that is not url-encoded yields no fields at all.
fn decode_payload(headers: &HeaderMap, body: &[u8]) -> Result<Value, Problem> {
    if is_json(headers) {
        return serde_json::from_slice(body).map_err(|e| {
            info!(error = %e, "Unparseable JSON body");
            invalid_payload()
        });
    }

    let pairs = if is_form(headers) {
        serde_urlencoded::from_bytes::<Vec<(String, String)>>(body).map_err(|e| {
            info!(error = %e, "Unparseable form body");
            invalid_payload()
        })?
    } else {
        Vec::new()
    };
    Ok(payload_from_form(pairs))
}

/// Compute `a op b` and record it in the session's history
#[utoipa::path(
    post,
    path = "/calculate",
    tag = "calculator",
    request_body(
        content = ComputeRequest,
        description = "JSON object or url-encoded form with fields `a`, `b` and `op`"
    ),
    responses(
        (status = 201, description = "Computation recorded", body = ComputationEntryDto),
        (status = 400, description = "Invalid input or division by zero", body = Problem, content_type = "application/problem+json"),
        (status = 500, description = "Computation error", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn compute(
    Session(session): Session,
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let payload = decode_payload(&headers, &body).map_err(|p| in_context(p, &uri, &headers))?;

    let outcome = svc
        .compute(&session, &payload)
        .await
        .map_err(|e| in_context(e.into(), &uri, &headers))?;

    let mut response = (
        StatusCode::CREATED,
        Json(ComputationEntryDto::from(outcome.entry)),
    )
        .into_response();
    if !outcome.persisted {
        response
            .headers_mut()
            .insert(HISTORY_PERSISTED, HeaderValue::from_static("false"));
    }
    Ok(response)
}

/// History of the calling session, oldest first
#[utoipa::path(
    get,
    path = "/history",
    tag = "calculator",
    responses(
        (status = 200, description = "Session history", body = Vec<ComputationEntryDto>)
    )
)]
pub async fn get_history(
    Session(session): Session,
    Extension(svc): Extension<Arc<Service>>,
) -> Json<Vec<ComputationEntryDto>> {
    let entries = svc.history(&session).await;
    Json(entries.into_iter().map(ComputationEntryDto::from).collect())
}

/// Delete the history of the calling session
#[utoipa::path(
    delete,
    path = "/history",
    tag = "calculator",
    responses(
        (status = 200, description = "History cleared", body = MessageResponse),
        (status = 500, description = "History could not be deleted", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn clear_history(
    Session(session): Session,
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    headers: HeaderMap,
) -> ApiResult<Json<MessageResponse>> {
    svc.clear_history(&session)
        .await
        .map_err(|e| in_context(e.into(), &uri, &headers))?;
    Ok(Json(MessageResponse::new("history cleared")))
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
