use axum::{http::{Method, Request}, response::Response};
use chrono::Utc;
use tracing::debug;

use crate::{
  assets::{serve_asset, AssetStore, ManifestSlot},
  auth::{require_auth, AuthOutcome, JwksFetcher, JwksSlot},
  config::Config,
  consts::API_PREFIX,
  endpoints::{health, protected, public},
  envelope::{api_not_found, internal_error, preflight},
  handler_error::HandlerError
};

/// What a request is, decided from its method and path alone
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
  CorsPreflight,
  Api(ApiRoute),
  Asset
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiRoute {
  Protected,
  Public,
  Health,
  NotFound
}

/// Ordered route table: OPTIONS first, then the `/api/` prefix with exact
/// path matches, then static assets.
pub fn classify(method: &Method, path: &str) -> Route {
  if method == Method::OPTIONS {
    return Route::CorsPreflight
  }

  if !path.starts_with(API_PREFIX) {
    return Route::Asset
  }

  Route::Api(match path {
    "/api/protected" => ApiRoute::Protected,
    "/api/public" => ApiRoute::Public,
    "/api/health" => ApiRoute::Health,
    _ => ApiRoute::NotFound
  })
}

/// Everything a request needs besides the request itself
pub struct EdgeContext<'a, S, F> {
  pub config: &'a Config,
  pub assets: &'a S,
  pub manifest: &'a ManifestSlot,
  pub jwks: &'a JwksSlot<F>
}

/// Answer one request. Never fails: errors become a 500.
pub async fn handle<B, S, F>(req: &Request<B>, ctx: &EdgeContext<'_, S, F>) -> Response
where
  S: AssetStore,
  F: JwksFetcher + Default + 'static
{
  match dispatch(req, ctx).await {
    Ok(response) => response,
    Err(e) => internal_error(e)
  }
}

async fn dispatch<B, S, F>(
  req: &Request<B>,
  ctx: &EdgeContext<'_, S, F>
) -> Result<Response, HandlerError>
where
  S: AssetStore,
  F: JwksFetcher + Default + 'static
{
  let now = Utc::now();
  let route = classify(req.method(), req.uri().path());

  debug!(method = %req.method(), path = req.uri().path(), ?route, "dispatching");

  Ok(match route {
    Route::CorsPreflight => preflight(),
    Route::Api(ApiRoute::Protected) => {
      // the verifier's 401 goes back untouched
      match require_auth(req, ctx.config, ctx.jwks, now).await? {
        AuthOutcome::Verified(claims) => protected(&claims, now),
        AuthOutcome::Rejected(response) => response
      }
    },
    Route::Api(ApiRoute::Public) => public(now),
    Route::Api(ApiRoute::Health) => health(now),
    Route::Api(ApiRoute::NotFound) => api_not_found(),
    Route::Asset => {
      let manifest = ctx.manifest.get_or_load(ctx.config.asset_manifest())?;
      serve_asset(req, ctx.assets, manifest).await
    }
  })
}
