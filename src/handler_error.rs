use worker::{kv::KvError, send::SendWrapper};

/// Failures that end in a 500, or in a fallback where the caller can
/// degrade (asset reads). Token problems never reach this type; they become
/// 401s inside the verifier.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum HandlerError {
  // Configuration
  #[error(r#"Missing binding "{0}""#)]
  MissingBinding(&'static str),
  #[error(r#"Invalid AUTH0_DOMAIN "{domain}": {source}"#)]
  InvalidDomain {
    domain: String,
    source: url::ParseError
  },
  #[error("Invalid ASSET_MANIFEST: {0}")]
  Manifest(serde_json::Error),
  // Storage
  Kv(SendWrapper<KvError>),
}

/// Convert KvError to HandlerError
impl From<KvError> for HandlerError {
  fn from(err: KvError) -> Self {
    HandlerError::Kv(SendWrapper::new(err))
  }
}
