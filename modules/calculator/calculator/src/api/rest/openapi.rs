use calc_errors::Problem;
use utoipa::OpenApi;

use super::dto::{ComputationEntryDto, ComputeRequest, MessageResponse};
use super::handlers;

#[derive(OpenApi)]
#[openapi(
    info(title = "Calcspot calculator API"),
    paths(handlers::compute, handlers::get_history, handlers::clear_history),
    components(schemas(ComputeRequest, ComputationEntryDto, MessageResponse, Problem)),
    tags((name = "calculator", description = "Arithmetic with per-session history"))
)]
pub struct ApiDoc;
