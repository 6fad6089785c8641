mod auth_error;
mod jwks;
mod verify;

pub use auth_error::AuthError;
pub use jwks::{HttpJwksFetcher, JwksError, JwksFetcher, JwksSlot, RemoteJwkSet};
pub use verify::{verify_token, AccessClaims, Expected};

use axum::{http::{header, Request}, response::{IntoResponse, Response}};
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::{config::Config, handler_error::HandlerError};

const BEARER_PREFIX: &str = "Bearer ";

/// Outcome of checking a protected request's credentials
pub enum AuthOutcome {
  Verified(AccessClaims),
  /// A finished 401 to hand back as is
  Rejected(Response),
}

/// Check the request's `Authorization` header against the identity provider.
///
/// The JWKS handle is created in `slot` on first use. Configuration problems
/// are returned as errors; everything wrong with the credential itself comes
/// back as `AuthOutcome::Rejected`.
pub async fn require_auth<B, F>(
  req: &Request<B>,
  config: &Config,
  slot: &JwksSlot<F>,
  now: DateTime<Utc>
) -> Result<AuthOutcome, HandlerError>
where
  F: JwksFetcher + Default + 'static
{
  let Some(value) = req.headers().get(header::AUTHORIZATION) else {
    return Ok(reject(AuthError::MissingToken))
  };

  let Ok(value) = value.to_str() else {
    return Ok(reject(AuthError::HeaderEncoding))
  };

  let jwks = slot.get_or_init(config)?;
  let issuer = config.issuer()?;
  let expected = Expected {
    issuer: &issuer,
    audience: config.audience()?
  };

  match verify_token(bearer_token(value), jwks, &expected, now.timestamp()).await {
    Ok(claims) => Ok(AuthOutcome::Verified(claims)),
    Err(e) => Ok(reject(e))
  }
}

/// Strips a case-sensitive `Bearer ` prefix. Anything else is taken to be
/// the bare token.
pub fn bearer_token(value: &str) -> &str {
  value.strip_prefix(BEARER_PREFIX).unwrap_or(value)
}

fn reject(e: AuthError) -> AuthOutcome {
  warn!(error = %e, "JWT verification failed");
  AuthOutcome::Rejected(e.into_response())
}
