mod assets;
mod auth;
mod config;
mod consts;
mod endpoints;
mod envelope;
mod handler_error;
mod router;

#[cfg(test)]
mod test_support;

use assets::{KvAssetStore, ManifestSlot};
use auth::{HttpJwksFetcher, JwksSlot};
use axum::{body::Body, http::Response};
use config::Config;
use router::{handle, EdgeContext};
use tracing_subscriber::{fmt::format::Pretty, prelude::*};
use tracing_web::{performance_layer, MakeWebConsoleWriter};
use worker::{event, send::SendWrapper, Context, Env, HttpRequest};

/// The instance's JWKS handle, created by the first protected request.
/// SendWrapper docs: https://docs.rs/worker/latest/worker/#send-helpers
static JWKS: SendWrapper<JwksSlot<HttpJwksFetcher>> = SendWrapper(JwksSlot::new());

/// The instance's asset manifest, parsed by the first asset request
static MANIFEST: SendWrapper<ManifestSlot> = SendWrapper(ManifestSlot::new());

#[event(start)]
fn start() {
  let fmt_layer = tracing_subscriber::fmt::layer()
    .json()
    // Only partially supported across JavaScript runtimes
    .with_ansi(false)
    // std::time is not available on wasm32
    .without_time()
    .with_writer(MakeWebConsoleWriter::new());
  let perf_layer = performance_layer()
    .with_details_from_fields(Pretty::default());

  tracing_subscriber::registry()
    .with(fmt_layer)
    .with(perf_layer)
    .init();
}

// Program entrypoint. Essentially the `main` function.
#[event(fetch)]
async fn fetch(req: HttpRequest, env: Env, _: Context) -> worker::Result<Response<Body>> {
  console_error_panic_hook::set_once();

  let config = Config::from_env(&env);
  let assets = KvAssetStore::from_env(&env);

  let ctx = EdgeContext {
    config: &config,
    assets: &assets,
    manifest: &*MANIFEST,
    jwks: &*JWKS
  };

  Ok(handle(&req, &ctx).await)
}
