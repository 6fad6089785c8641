use std::{cell::{OnceCell, RefCell}, rc::Rc, sync::Arc};

use async_trait::async_trait;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use reqwest::header::ACCEPT;
use surrealdb_jsonwebtoken::{
  jwk::{AlgorithmParameters, Jwk, JwkSet, PublicKeyUse},
  Algorithm
};
use tracing::{debug, info};
use url::Url;

use crate::{config::Config, consts::{JWKS_COOLDOWN_SECS, JWKS_MAX_AGE_SECS}, handler_error::HandlerError};

#[derive(thiserror::Error, Debug, Clone)]
pub enum JwksError {
  #[error("failed to fetch the JSON Web Key Set: {0}")]
  Fetch(Arc<reqwest::Error>),
  #[error("JSON Web Key Set endpoint responded with HTTP {0}")]
  Status(u16),
  #[error("no applicable key found in the JSON Web Key Set")]
  NoMatchingKey,
  #[error("multiple matching keys found in the JSON Web Key Set")]
  MultipleMatchingKeys,
}

impl From<reqwest::Error> for JwksError {
  fn from(err: reqwest::Error) -> Self {
    JwksError::Fetch(Arc::new(err))
  }
}

/// Retrieves a key set from its published location
#[async_trait(?Send)]
pub trait JwksFetcher {
  async fn fetch(&self, url: &Url) -> Result<JwkSet, JwksError>;
}

/// Fetches over HTTPS. On wasm32 reqwest rides on the runtime's `fetch`.
#[derive(Default)]
pub struct HttpJwksFetcher {
  client: reqwest::Client
}

#[async_trait(?Send)]
impl JwksFetcher for HttpJwksFetcher {
  async fn fetch(&self, url: &Url) -> Result<JwkSet, JwksError> {
    let response = self.client.get(url.clone())
      .header(ACCEPT, "application/json")
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      return Err(JwksError::Status(status.as_u16()))
    }

    Ok(response.json().await?)
  }
}

struct CachedKeys {
  keys: JwkSet,
  fetched_at: i64
}

enum Lookup {
  Hit(Jwk),
  Failed(JwksError),
  Reload
}

/// A fetch in progress, awaited by every lookup that needs it
type Reload = Shared<LocalBoxFuture<'static, Result<JwkSet, JwksError>>>;

/// A remote key set that fetches itself on demand.
///
/// The fetched set is reused for `JWKS_MAX_AGE_SECS`. A `kid` that isn't in
/// the cached set causes one refetch (the provider may have rotated keys),
/// but no more often than every `JWKS_COOLDOWN_SECS`. A failed fetch leaves
/// the previous set in place. Lookups that need a fetch while one is already
/// running wait for that one instead of starting their own.
pub struct RemoteJwkSet<F> {
  url: Url,
  fetcher: Rc<F>,
  cached: RefCell<Option<CachedKeys>>,
  reloading: RefCell<Option<Reload>>
}

impl<F: JwksFetcher + 'static> RemoteJwkSet<F> {
  pub fn new(url: Url, fetcher: F) -> Self {
    Self {
      url,
      fetcher: Rc::new(fetcher),
      cached: RefCell::new(None),
      reloading: RefCell::new(None)
    }
  }

  pub fn url(&self) -> &Url {
    &self.url
  }

  /// Resolve the verification key as of `now` (unix seconds). Without a
  /// `kid` the set must hold exactly one RS256 signing key.
  pub async fn key(&self, kid: Option<&str>, now: i64) -> Result<Jwk, JwksError> {
    match self.lookup(kid, now) {
      Lookup::Hit(jwk) => return Ok(jwk),
      Lookup::Failed(e) => return Err(e),
      Lookup::Reload => ()
    }

    let reload = self.reload();
    let fetched = reload.clone().await;

    {
      let mut reloading = self.reloading.borrow_mut();
      if reloading.as_ref().is_some_and(|pending| pending.ptr_eq(&reload)) {
        *reloading = None;
      }
    }

    let keys = fetched?;
    let found = select(&keys, kid).cloned();

    // no borrow is held across the await above
    *self.cached.borrow_mut() = Some(CachedKeys { keys, fetched_at: now });

    found
  }

  fn lookup(&self, kid: Option<&str>, now: i64) -> Lookup {
    let cached = self.cached.borrow();
    let Some(cached) = cached.as_ref() else {
      return Lookup::Reload
    };

    let age = now - cached.fetched_at;
    if age >= JWKS_MAX_AGE_SECS {
      return Lookup::Reload
    }

    match select(&cached.keys, kid) {
      Ok(jwk) => Lookup::Hit(jwk.clone()),
      Err(JwksError::NoMatchingKey) if age >= JWKS_COOLDOWN_SECS => Lookup::Reload,
      Err(e) => Lookup::Failed(e)
    }
  }

  fn reload(&self) -> Reload {
    self.reloading
      .borrow_mut()
      .get_or_insert_with(|| {
        let fetcher = Rc::clone(&self.fetcher);
        let url = self.url.clone();
        debug!(%url, "fetching JWKS");

        async move { fetcher.fetch(&url).await }
          .boxed_local()
          .shared()
      })
      .clone()
  }

  #[cfg(test)]
  pub fn fetcher(&self) -> &F {
    &self.fetcher
  }
}

/// Pick the RS256 signing key for `kid`. Without a `kid` the pick has to be
/// unambiguous.
fn select<'k>(keys: &'k JwkSet, kid: Option<&str>) -> Result<&'k Jwk, JwksError> {
  let mut candidates = keys.keys.iter().filter(|jwk| applicable(jwk, kid));
  let first = candidates.next().ok_or(JwksError::NoMatchingKey)?;

  if kid.is_none() && candidates.next().is_some() {
    return Err(JwksError::MultipleMatchingKeys)
  }

  Ok(first)
}

fn applicable(jwk: &Jwk, kid: Option<&str>) -> bool {
  let common = &jwk.common;

  kid.map_or(true, |kid| common.key_id.as_deref() == Some(kid))
    && matches!(jwk.algorithm, AlgorithmParameters::RSA(_))
    && common.algorithm.map_or(true, |alg| alg == Algorithm::RS256)
    && common.public_key_use.as_ref().map_or(true, |usage| *usage == PublicKeyUse::Signature)
}

/// Holds the one key set handle of a worker instance.
///
/// Empty until the first protected request, then fixed for the lifetime of
/// the instance. Construction is synchronous, so two requests interleaving
/// on the same isolate can't both create a handle.
pub struct JwksSlot<F> {
  cell: OnceCell<RemoteJwkSet<F>>
}

impl<F> JwksSlot<F> {
  pub const fn new() -> Self {
    Self { cell: OnceCell::new() }
  }

  pub fn is_initialised(&self) -> bool {
    self.cell.get().is_some()
  }
}

impl<F> Default for JwksSlot<F> {
  fn default() -> Self {
    Self::new()
  }
}

impl<F: JwksFetcher + Default + 'static> JwksSlot<F> {
  pub fn get_or_init(&self, config: &Config) -> Result<&RemoteJwkSet<F>, HandlerError> {
    if let Some(jwks) = self.cell.get() {
      return Ok(jwks)
    }

    let url = config.jwks_url()?;
    info!(%url, "creating JWKS handle");

    Ok(self.cell.get_or_init(|| RemoteJwkSet::new(url, F::default())))
  }
}
