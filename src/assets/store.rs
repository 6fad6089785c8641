use async_trait::async_trait;
use tracing::warn;
use worker::{kv::KvStore, Env};

use crate::{consts::__STATIC_CONTENT, handler_error::HandlerError};

/// Read access to the namespace the SPA bundle was uploaded to
#[async_trait(?Send)]
pub trait AssetStore {
  async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, HandlerError>;
}

/// Workers KV backed asset namespace
pub struct KvAssetStore {
  kv: Option<KvStore>
}

impl KvAssetStore {
  /// A missing binding isn't fatal here: API routes don't need it, and
  /// static lookups report it as a failed read.
  pub fn from_env(env: &Env) -> Self {
    let kv = match env.kv(__STATIC_CONTENT) {
      Ok(kv) => Some(kv),
      Err(e) => {
        warn!(error = %e, binding = __STATIC_CONTENT, "asset namespace unavailable");
        None
      }
    };

    Self { kv }
  }
}

#[async_trait(?Send)]
impl AssetStore for KvAssetStore {
  async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, HandlerError> {
    let Some(kv) = &self.kv else {
      return Err(HandlerError::MissingBinding(__STATIC_CONTENT))
    };

    Ok(kv.get(key).bytes().await?)
  }
}
