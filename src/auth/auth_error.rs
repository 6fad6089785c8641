use axum::{http::StatusCode, response::{IntoResponse, Response}};
use surrealdb_jsonwebtoken::{errors::Error as JwtError, Algorithm};

use crate::{auth::jwks::JwksError, consts::CORS_HEADER};

/// Why a protected request was turned away. Rendered as the reason after
/// `Unauthorized: ` in the 401 body.
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
  #[error("No token provided")]
  MissingToken,
  #[error("Authorization header is not visible ASCII")]
  HeaderEncoding,
  #[error(r#"unsupported "alg" (JWS Algorithm) header value: {0:?}"#)]
  UnsupportedAlgorithm(Algorithm),
  #[error(transparent)]
  Jwks(#[from] JwksError),
  #[error("invalid token: {0}")]
  Invalid(JwtError),
  #[error(r#""exp" claim timestamp check failed"#)]
  Expired,
  #[error(r#""nbf" claim timestamp check failed"#)]
  NotYetValid,
}

impl IntoResponse for AuthError {
  fn into_response(self) -> Response {
    (
      StatusCode::UNAUTHORIZED,
      CORS_HEADER,
      format!("Unauthorized: {self}")
    ).into_response()
  }
}
