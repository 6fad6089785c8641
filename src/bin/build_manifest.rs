use std::{collections::BTreeMap, fs, io::stdout, path::{Path, PathBuf}};

use base64::{engine::general_purpose::STANDARD, Engine};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

#[derive(Parser)]
struct Args {
  /// Built SPA directory, e.g. `frontend/dist`
  dir: PathBuf,
  #[arg(value_enum)]
  output: Output
}

#[derive(ValueEnum, Clone)]
enum Output {
  /// `{ logical path: key }` json, the value of the ASSET_MANIFEST var
  Manifest,
  /// `wrangler kv bulk put` json for the __STATIC_CONTENT namespace
  Bulk,
}

// Source: https://developers.cloudflare.com/workers/wrangler/commands/#kv-bulk-put
#[derive(Serialize)]
struct BulkEntry {
  key: String,
  value: String,
  base64: bool
}

struct Asset {
  path: String,
  key: String,
  bytes: Vec<u8>
}

/// Hashes every file under `dir` into a content-addressed key and prints
/// either the manifest or the matching KV upload
fn main() {
  let Args { dir, output } = Args::parse();

  let assets = WalkDir::new(&dir)
    .sort_by_file_name()
    .into_iter()
    .map(|entry| entry.unwrap())
    .filter(|entry| entry.file_type().is_file())
    .map(|entry| {
      let path = logical_path(&dir, entry.path());
      let bytes = fs::read(entry.path()).unwrap();
      let key = hashed_key(&path, &bytes);

      Asset { path, key, bytes }
    });

  match output {
    Output::Manifest => serde_json::to_writer(
      stdout(),
      &assets.map(|a| (a.path, a.key))
        .collect::<BTreeMap<String, String>>()
    ).unwrap(),
    Output::Bulk => serde_json::to_writer(
      stdout(),
      &assets.map(|a| BulkEntry {
          key: a.key,
          value: STANDARD.encode(a.bytes),
          base64: true
        })
        .collect::<Vec<_>>()
    ).unwrap()
  }
}

/// `dir/assets/app.js` -> `assets/app.js`, always with forward slashes
fn logical_path(dir: &Path, file: &Path) -> String {
  file.strip_prefix(dir)
    // walkdir only yields paths below `dir`
    .unwrap()
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}

/// `assets/app.js` -> `assets/app.<first 10 hex of sha256>.js`
fn hashed_key(path: &str, bytes: &[u8]) -> String {
  let digest = Sha256::digest(bytes);
  let hash = digest.iter()
    .take(5)
    .map(|b| format!("{b:02x}"))
    .collect::<String>();

  let (dir, file) = match path.rsplit_once('/') {
    Some((dir, file)) => (format!("{dir}/"), file),
    None => (String::new(), path)
  };

  match file.rsplit_once('.') {
    Some((stem, ext)) if !stem.is_empty() => format!("{dir}{stem}.{hash}.{ext}"),
    _ => format!("{dir}{file}.{hash}")
  }
}
