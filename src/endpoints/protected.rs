use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{auth::AccessClaims, envelope::{json, timestamp}};

#[derive(Serialize)]
struct ProtectedResponse<'a> {
  message: &'static str,
  timestamp: String,
  user: User<'a>
}

/// Echo of the caller's identity. Absent claims are left out rather than
/// sent as `null`.
#[derive(Serialize)]
struct User<'a> {
  sub: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  email: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  name: Option<&'a str>
}

/// `GET /api/protected`, once the bearer token has been verified
pub fn protected(claims: &AccessClaims, now: DateTime<Utc>) -> Response {
  json(ProtectedResponse {
    message: "This is protected data from the Cloudflare Worker API",
    timestamp: timestamp(now),
    user: User {
      sub: &claims.sub,
      email: claims.email.as_deref(),
      name: claims.name.as_deref()
    }
  })
}
