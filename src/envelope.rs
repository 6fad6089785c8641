use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::error;

use crate::{consts::CORS_HEADER, handler_error::HandlerError};

/// 200 JSON with CORS headers
pub fn json<T: Serialize>(body: T) -> Response {
  (CORS_HEADER, Json(body)).into_response()
}

/// 204, CORS headers, no body
pub fn preflight() -> Response {
  (StatusCode::NO_CONTENT, CORS_HEADER).into_response()
}

pub fn api_not_found() -> Response {
  (StatusCode::NOT_FOUND, CORS_HEADER, "API endpoint not found").into_response()
}

/// Flatten anything that escaped the handler into a 500. Only the message
/// goes to the client.
pub fn internal_error(e: HandlerError) -> Response {
  error!(error = %e, "worker error");

  (
    StatusCode::INTERNAL_SERVER_ERROR,
    CORS_HEADER,
    format!("Internal Server Error: {e}")
  ).into_response()
}

/// ISO-8601 in UTC with milliseconds, e.g. `2026-10-19T08:30:00.000Z`
pub fn timestamp(now: DateTime<Utc>) -> String {
  now.to_rfc3339_opts(SecondsFormat::Millis, true)
}
