mod manifest;
mod mime;
mod store;

pub use manifest::{AssetManifest, ManifestSlot};
pub use store::{AssetStore, KvAssetStore};

use axum::{body::Body, http::{header, Method, Request, StatusCode}, response::{AppendHeaders, IntoResponse, Response}};
use tracing::{debug, warn};

use crate::consts::{CORS_HEADER, SPA_ENTRY};
use manifest::AssetKey;
use mime::content_type;

/// Serve a file from the SPA bundle.
///
/// Extensionless paths are client-side routes and get the SPA entry
/// document. A path with no matching asset gets one more try with the entry
/// document before the request ends in a 404.
pub async fn serve_asset<B, S: AssetStore>(
  req: &Request<B>,
  store: &S,
  manifest: &AssetManifest
) -> Response {
  let requested = req.uri().path();

  let path = if requested.contains('.') {
    requested
  } else {
    SPA_ENTRY
  };

  if let Some(response) = lookup(req, path, store, manifest).await {
    return response
  }

  debug!(path = requested, "no asset, falling back to SPA entry");

  if let Some(response) = lookup(req, SPA_ENTRY, store, manifest).await {
    return response
  }

  (StatusCode::NOT_FOUND, CORS_HEADER, "Not Found").into_response()
}

/// `None` for anything that should move on to the fallback: a missing key,
/// a failed read, or a method other than GET/HEAD
async fn lookup<B, S: AssetStore>(
  req: &Request<B>,
  path: &str,
  store: &S,
  manifest: &AssetManifest
) -> Option<Response> {
  if !matches!(*req.method(), Method::GET | Method::HEAD) {
    return None
  }

  let asset = manifest.resolve(path);

  let body = match store.get(&asset.key).await {
    Ok(body) => body?,
    Err(e) => {
      warn!(error = %e, key = %asset.key, "asset read failed");
      return None
    }
  };

  Some(asset_response(req, path, &asset, body))
}

fn asset_response<B>(
  req: &Request<B>,
  path: &str,
  asset: &AssetKey,
  body: Vec<u8>
) -> Response {
  // Content addressed keys change with the content, so they double as a
  // strong validator.
  let etag = asset.content_addressed
    .then(|| format!(r#""{}""#, asset.key));

  if let Some(etag) = &etag {
    let fresh = req.headers()
      .get(header::IF_NONE_MATCH)
      .and_then(|v| v.to_str().ok())
      .is_some_and(|v| none_match(v, etag));

    if fresh {
      return (
        StatusCode::NOT_MODIFIED,
        [(header::ETAG, etag.clone())]
      ).into_response()
    }
  }

  let body = if req.method() == Method::HEAD {
    Body::empty()
  } else {
    Body::from(body)
  };

  (
    [(header::CONTENT_TYPE, content_type(path))],
    AppendHeaders(etag.map(|etag| (header::ETAG, etag))),
    body
  ).into_response()
}

/// `If-None-Match` uses the weak comparison: `W/` prefixes are ignored and
/// `*` matches any current representation.
fn none_match(header: &str, etag: &str) -> bool {
  header.split(',')
    .map(str::trim)
    .any(|tag| tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == etag)
}
