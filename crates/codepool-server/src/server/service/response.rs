use crate::server::telemetry::{
    increment_pool_empty, increment_races_lost, increment_store_faults,
};
use axum::{
    Json,
    http::{
        HeaderValue, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, RETRY_AFTER,
        },
    },
    response::{IntoResponse, Response},
};
use codepool::PopError;
use serde::Serialize;

pub const NO_CODES_LEFT: &str = "No codes left";
pub const STORE_UNAVAILABLE: &str = "Store unavailable";
pub const TOO_MUCH_CONTENTION: &str = "Too much contention, retry";
pub const SHUTTING_DOWN: &str = "Service is shutting down";
pub const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";

/// Seconds a caller should wait before retrying a transient failure.
const RETRY_AFTER_SECS: &str = "1";

#[derive(Serialize)]
struct CodeBody<'a> {
    code: &'a str,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

fn with_cors(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

fn error(status: StatusCode, message: &str) -> Response {
    with_cors((status, Json(ErrorBody { error: message })).into_response())
}

fn transient(message: &str) -> Response {
    let mut response = error(StatusCode::SERVICE_UNAVAILABLE, message);
    response
        .headers_mut()
        .insert(RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
    response
}

/// `200 {"code": "..."}`
pub struct Dispensed(pub String);

impl IntoResponse for Dispensed {
    fn into_response(self) -> Response {
        with_cors(Json(CodeBody { code: &self.0 }).into_response())
    }
}

/// Maps a failed pop onto its HTTP response.
pub struct ApiError(pub PopError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            PopError::Empty => {
                increment_pool_empty();
                error(StatusCode::NOT_FOUND, NO_CODES_LEFT)
            }
            PopError::Store(e) => {
                increment_store_faults();
                tracing::error!(error = %e, "Pop failed on the store");
                error(StatusCode::INTERNAL_SERVER_ERROR, STORE_UNAVAILABLE)
            }
            PopError::RaceLost { attempts } => {
                increment_races_lost();
                tracing::warn!(attempts, "Pop lost every race for the pool");
                transient(TOO_MUCH_CONTENTION)
            }
            PopError::Shutdown => transient(SHUTTING_DOWN),
            e => {
                tracing::error!(error = %e, "Unexpected pop failure");
                error(StatusCode::INTERNAL_SERVER_ERROR, STORE_UNAVAILABLE)
            }
        }
    }
}

/// CORS preflight: `200` with an empty body.
pub fn preflight() -> Response {
    (
        StatusCode::OK,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
        .into_response()
}

/// `405` with a plain-text body.
pub fn method_not_allowed() -> Response {
    with_cors((StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED).into_response())
}
