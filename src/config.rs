use url::Url;
use worker::Env;

use crate::{consts::{ASSET_MANIFEST, AUTH0_AUDIENCE, AUTH0_DOMAIN}, handler_error::HandlerError};

/// Settings taken from the worker's bindings.
///
/// Every value is optional at load time so that a half-configured
/// deployment keeps its other routes working; the route that needs a
/// missing or broken value reports it as an internal error.
#[derive(Clone, Debug, Default)]
pub struct Config {
  auth0_domain: Option<String>,
  auth0_audience: Option<String>,
  asset_manifest: Option<String>,
}

impl Config {
  pub fn new(domain: impl Into<String>, audience: impl Into<String>) -> Self {
    Self {
      auth0_domain: Some(domain.into()),
      auth0_audience: Some(audience.into()),
      asset_manifest: None,
    }
  }

  /// Read `AUTH0_DOMAIN` and `AUTH0_AUDIENCE` as plain vars, falling back
  /// to secrets of the same name. `ASSET_MANIFEST` is kept unparsed.
  pub fn from_env(env: &Env) -> Self {
    Self {
      auth0_domain: binding(env, AUTH0_DOMAIN),
      auth0_audience: binding(env, AUTH0_AUDIENCE),
      asset_manifest: binding(env, ASSET_MANIFEST),
    }
  }

  #[cfg(test)]
  pub fn with_asset_manifest(mut self, raw: impl Into<String>) -> Self {
    self.asset_manifest = Some(raw.into());
    self
  }

  /// Raw JSON of the asset manifest, if one is bound
  pub fn asset_manifest(&self) -> Option<&str> {
    self.asset_manifest.as_deref()
  }

  /// Bare identity provider host, no scheme
  pub fn domain(&self) -> Result<&str, HandlerError> {
    self.auth0_domain
      .as_deref()
      .ok_or(HandlerError::MissingBinding(AUTH0_DOMAIN))
  }

  pub fn audience(&self) -> Result<&str, HandlerError> {
    self.auth0_audience
      .as_deref()
      .ok_or(HandlerError::MissingBinding(AUTH0_AUDIENCE))
  }

  /// `https://{domain}/`, trailing slash included
  pub fn issuer(&self) -> Result<String, HandlerError> {
    Ok(self.base_url()?.to_string())
  }

  /// `https://{domain}/.well-known/jwks.json`
  pub fn jwks_url(&self) -> Result<Url, HandlerError> {
    let domain = self.domain()?;

    self.base_url()?
      .join(".well-known/jwks.json")
      .map_err(|source| HandlerError::InvalidDomain {
        domain: domain.to_string(),
        source
      })
  }

  fn base_url(&self) -> Result<Url, HandlerError> {
    let domain = self.domain()?;

    Url::parse(&format!("https://{domain}/"))
      .map_err(|source| HandlerError::InvalidDomain {
        domain: domain.to_string(),
        source
      })
  }
}

fn binding(env: &Env, name: &str) -> Option<String> {
  env.var(name)
    .map(|v| v.to_string())
    .or_else(|_| env.secret(name).map(|v| v.to_string()))
    .ok()
    .filter(|v| !v.is_empty())
}
