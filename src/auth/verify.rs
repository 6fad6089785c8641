use serde::{Deserialize, Serialize};
use surrealdb_jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

use crate::auth::{auth_error::AuthError, jwks::{JwksFetcher, RemoteJwkSet}};

/// Claims read from a verified access token.
///
/// `email` and `name` are ID token claims; Auth0 only puts them in access
/// tokens when a login action adds them, so both are optional.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AccessClaims {
  pub sub: String,
  pub exp: i64,
  #[serde(default)]
  pub nbf: Option<i64>,
  #[serde(default)]
  pub iat: Option<i64>,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub name: Option<String>,
}

/// What a token has to match besides its signature
pub struct Expected<'a> {
  pub issuer: &'a str,
  pub audience: &'a str,
}

/// Verify an RS256 access token against the remote key set.
///
/// `now` is unix seconds. Timestamps are compared without leeway: a token
/// whose `exp` is not strictly in the future, or whose `nbf` is, is
/// rejected. A token without a `kid` is checked against the set's only
/// signing key.
pub async fn verify_token<F: JwksFetcher + 'static>(
  token: &str,
  jwks: &RemoteJwkSet<F>,
  expected: &Expected<'_>,
  now: i64
) -> Result<AccessClaims, AuthError> {
  let header = decode_header(token).map_err(AuthError::Invalid)?;

  // checked before any key lookup so HS256 tokens never trigger a fetch
  if header.alg != Algorithm::RS256 {
    return Err(AuthError::UnsupportedAlgorithm(header.alg))
  }

  let jwk = jwks.key(header.kid.as_deref(), now).await?;
  let key = DecodingKey::from_jwk(&jwk).map_err(AuthError::Invalid)?;

  let mut validation = Validation::new(Algorithm::RS256);
  // the library reads std::time, which doesn't exist on wasm32
  validation.validate_exp = false;
  validation.validate_nbf = false;
  validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
  validation.set_issuer(&[expected.issuer]);
  // matches a string `aud` or any element of an array `aud`
  validation.set_audience(&[expected.audience]);

  let claims = decode::<AccessClaims>(token, &key, &validation)
    .map_err(AuthError::Invalid)?
    .claims;

  if claims.exp <= now {
    return Err(AuthError::Expired)
  }

  if claims.nbf.is_some_and(|nbf| nbf > now) {
    return Err(AuthError::NotYetValid)
  }

  Ok(claims)
}
