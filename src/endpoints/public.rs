use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::envelope::{json, timestamp};

#[derive(Serialize)]
struct PublicResponse {
  message: &'static str,
  timestamp: String
}

#[derive(Serialize)]
struct HealthResponse {
  status: &'static str,
  timestamp: String
}

/// `GET /api/public`
pub fn public(now: DateTime<Utc>) -> Response {
  json(PublicResponse {
    message: "This is public data from the Cloudflare Worker",
    timestamp: timestamp(now)
  })
}

/// `GET /api/health`
pub fn health(now: DateTime<Utc>) -> Response {
  json(HealthResponse {
    status: "healthy",
    timestamp: timestamp(now)
  })
}
