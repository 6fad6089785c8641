use axum::http::{header, HeaderName};

/// force var name to be the same as its string value
macro_rules! constant {
  ($name:ident) => {
    pub const $name: &str = stringify!($name);
  }
}

// ---------- BINDINGS ----------

// identity provider
constant!(AUTH0_DOMAIN);
constant!(AUTH0_AUDIENCE);

// static assets
constant!(ASSET_MANIFEST);
constant!(__STATIC_CONTENT);

// ---------- ROUTES ----------

pub const API_PREFIX: &str = "/api/";
pub const SPA_ENTRY: &str = "/index.html";

// ---------- JWKS ----------

/// How long a fetched key set is trusted before the next lookup refetches it
pub const JWKS_MAX_AGE_SECS: i64 = 10 * 60;
/// Minimum time between two fetches triggered by an unknown `kid`
pub const JWKS_COOLDOWN_SECS: i64 = 30;

// ---------- CORS HEADER ----------

// Wildcard origin is only acceptable while this is a proof of concept.
// Restrict it to the SPA origin before anything real sits behind it.
pub const CORS_HEADER: [(HeaderName, &str); 3] = [
  (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
  (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
  (header::ACCESS_CONTROL_ALLOW_HEADERS, "Authorization, Content-Type")
];
