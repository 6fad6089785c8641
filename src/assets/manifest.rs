use std::{borrow::Cow, cell::OnceCell, collections::HashMap};

use percent_encoding::percent_decode_str;
use serde::Deserialize;
use tracing::debug;

use crate::handler_error::HandlerError;

/// Logical asset path (no leading slash) → key in the asset namespace.
/// Produced at build time by the `build_manifest` script.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct AssetManifest(HashMap<String, String>);

/// Where an asset lives in the namespace
#[derive(Debug, PartialEq)]
pub struct AssetKey<'a> {
  pub key: Cow<'a, str>,
  /// `true` when the key came from the manifest, i.e. it changes whenever
  /// the content does
  pub content_addressed: bool,
}

impl AssetManifest {
  pub fn parse(raw: &str) -> Result<Self, HandlerError> {
    serde_json::from_str(raw).map_err(HandlerError::Manifest)
  }

  /// Map a request path to its namespace key. The raw path is tried first,
  /// then its percent-decoded form; paths missing from the manifest are
  /// looked up verbatim (decoded).
  pub fn resolve<'a>(&'a self, path: &'a str) -> AssetKey<'a> {
    let logical = path.trim_start_matches('/');

    if let Some(key) = self.0.get(logical) {
      return AssetKey { key: Cow::Borrowed(key), content_addressed: true }
    }

    let decoded = percent_decode_str(logical).decode_utf8_lossy();

    match self.0.get(decoded.as_ref()) {
      Some(key) => AssetKey { key: Cow::Borrowed(key), content_addressed: true },
      None => AssetKey { key: decoded, content_addressed: false }
    }
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }
}

/// Holds the parsed manifest of a worker instance.
///
/// Filled by the first asset request. A manifest that fails to parse is not
/// kept, so every asset request reports it until the binding is fixed.
pub struct ManifestSlot {
  cell: OnceCell<AssetManifest>
}

impl ManifestSlot {
  pub const fn new() -> Self {
    Self { cell: OnceCell::new() }
  }

  /// Without a source, asset keys are the request paths themselves
  pub fn get_or_load(&self, raw: Option<&str>) -> Result<&AssetManifest, HandlerError> {
    if let Some(manifest) = self.cell.get() {
      return Ok(manifest)
    }

    let manifest = match raw {
      Some(raw) => AssetManifest::parse(raw)?,
      None => AssetManifest::default()
    };
    debug!(entries = manifest.len(), "loaded asset manifest");

    Ok(self.cell.get_or_init(|| manifest))
  }
}
