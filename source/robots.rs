//! Per-origin robots.txt fetching and caching. Grounded on
//! `RedFetcher.fetch_robots_txt`/`url_to_origin` in
//! `original_source/redbot/resource/fetch.py`.

use crate::transport::{PreparedRequest, Transport};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const TTL: Duration = Duration::from_secs(30 * 60);

/// `scheme://host:port`, lowercased, defaulting the port by scheme. `None`
/// when the URI carries no host (matches `url_to_origin` returning `None`
/// on a malformed URI).
pub fn origin(uri: &url::Url) -> Option<String> {
  let host = uri.host_str()?.to_ascii_lowercase();
  let port = uri.port_or_known_default()?;
  Some(format!("{}://{}:{}", uri.scheme(), host, port))
}

struct Entry {
  body: String,
  fetched_at: Instant,
}

/// Caches robots.txt bodies per origin: an in-memory map first, then an
/// optional on-disk directory (one file per origin, named by the MD5 hex
/// of the origin string — the pack carries no `sha1` crate, so this
/// substitutes `md5`, which is already a dependency; see DESIGN.md), then
/// the network. Concurrent lookups for the same origin serialize through
/// a per-origin mutex rather than the original's callback-coalescing
/// list, which has no equivalent in a blocking call stack.
pub struct RobotsCache {
  disk_dir: Option<PathBuf>,
  memory: Mutex<HashMap<String, Entry>>,
  locks: Mutex<HashMap<String, std::sync::Arc<Mutex<()>>>>,
}

impl RobotsCache {
  pub fn new(disk_dir: Option<PathBuf>) -> Self {
    Self { disk_dir, memory: Mutex::new(HashMap::new()), locks: Mutex::new(HashMap::new()) }
  }

  fn origin_lock(&self, origin: &str) -> std::sync::Arc<Mutex<()>> {
    self.locks.lock().unwrap().entry(origin.to_string()).or_insert_with(|| std::sync::Arc::new(Mutex::new(()))).clone()
  }

  fn disk_path(&self, origin: &str) -> Option<PathBuf> {
    self.disk_dir.as_ref().map(|dir| dir.join(format!("{:x}", md5::compute(origin))))
  }

  fn read_disk(&self, origin: &str) -> Option<String> {
    let path = self.disk_path(origin)?;
    let metadata = std::fs::metadata(&path).ok()?;
    let modified = metadata.modified().ok()?;
    if modified.elapsed().ok()? > TTL {
      return None;
    }
    std::fs::read_to_string(&path).ok()
  }

  fn write_disk(&self, origin: &str, body: &str) {
    let Some(path) = self.disk_path(origin) else { return };
    // Infrastructure errors around the cache are swallowed.
    let _ = std::fs::write(path, body);
  }

  /// Returns the robots.txt body for `origin` (empty string if none,
  /// unreachable, or non-2xx — "allow all").
  pub fn fetch(&self, transport: &dyn Transport, user_agent: &str, origin: &str) -> String {
    if let Some(entry) = self.memory.lock().unwrap().get(origin) {
      if entry.fetched_at.elapsed() <= TTL {
        return entry.body.clone();
      }
    }

    let guard = self.origin_lock(origin);
    let _held = guard.lock().unwrap();

    if let Some(entry) = self.memory.lock().unwrap().get(origin) {
      if entry.fetched_at.elapsed() <= TTL {
        return entry.body.clone();
      }
    }
    if let Some(body) = self.read_disk(origin) {
      self.memory.lock().unwrap().insert(origin.to_string(), Entry { body: body.clone(), fetched_at: Instant::now() });
      return body;
    }

    let robots_uri = format!("{origin}/robots.txt");
    let body = match url::Url::parse(&robots_uri) {
      Ok(uri) => {
        let request = PreparedRequest {
          method: "GET".to_string(),
          uri,
          headers: vec![("User-Agent".to_string(), user_agent.to_string())],
          body: Vec::new(),
        };
        match transport.exchange(&request) {
          Ok(result) if (200..300).contains(&result.status_code) => String::from_utf8_lossy(&result.body).into_owned(),
          _ => String::new(),
        }
      }
      Err(_) => String::new(),
    };

    self.memory.lock().unwrap().insert(origin.to_string(), Entry { body: body.clone(), fetched_at: Instant::now() });
    self.write_disk(origin, &body);
    body
  }
}

/// A minimal `Disallow`/`Allow` matcher: the longest matching path-prefix
/// rule under the first `User-agent` group that names `*` or matches
/// `user_agent` wins. Good enough to gate analysis fetches; not a
/// standards-complete robots.txt implementation (no `Crawl-delay`,
/// wildcards within paths, or `Sitemap` handling).
pub fn can_fetch(robots_txt: &str, user_agent: &str, path: &str) -> bool {
  if robots_txt.is_empty() {
    return true;
  }
  let mut applicable = false;
  let mut rules: Vec<(bool, String)> = Vec::new();
  let mut matched_any_agent = false;
  let mut current_matches = false;

  for line in robots_txt.lines() {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
      continue;
    }
    let Some((key, value)) = line.split_once(':') else { continue };
    let key = key.trim().to_ascii_lowercase();
    let value = value.trim();
    match key.as_str() {
      "user-agent" => {
        if current_matches && matched_any_agent {
          break;
        }
        let is_match = value == "*" || user_agent.to_ascii_lowercase().contains(&value.to_ascii_lowercase());
        if is_match {
          current_matches = true;
          matched_any_agent = true;
        } else if !matched_any_agent {
          current_matches = false;
        }
      }
      "disallow" if current_matches && !value.is_empty() => {
        applicable = true;
        rules.push((false, value.to_string()));
      }
      "disallow" if current_matches => {
        // An empty Disallow means "allow everything".
      }
      "allow" if current_matches => {
        applicable = true;
        rules.push((true, value.to_string()));
      }
      _ => {}
    }
  }

  if !applicable {
    return true;
  }
  let mut best: Option<(usize, bool)> = None;
  for (allow, prefix) in &rules {
    if path.starts_with(prefix.as_str()) {
      if best.map_or(true, |(len, _)| prefix.len() > len) {
        best = Some((prefix.len(), *allow));
      }
    }
  }
  best.map(|(_, allow)| allow).unwrap_or(true)
}

/// Builds the path `can_fetch` matches against: `/path?query`, defaulting
/// to `/` per `robotparser`'s handling of a bare-origin request.
pub fn request_path(uri: &url::Url) -> String {
  let path = uri.path();
  match uri.query() {
    Some(query) => format!("{path}?{query}"),
    None => path.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_robots_txt_allows_all() {
    assert!(can_fetch("", "RedBot-rs", "/anything"));
  }

  #[test]
  fn disallow_blocks_matching_prefix() {
    let robots = "User-agent: *\nDisallow: /private\n";
    assert!(!can_fetch(robots, "RedBot-rs", "/private/secret"));
    assert!(can_fetch(robots, "RedBot-rs", "/public"));
  }

  #[test]
  fn allow_overrides_a_shorter_disallow() {
    let robots = "User-agent: *\nDisallow: /private\nAllow: /private/public\n";
    assert!(can_fetch(robots, "RedBot-rs", "/private/public/page"));
    assert!(!can_fetch(robots, "RedBot-rs", "/private/other"));
  }

  #[test]
  fn origin_defaults_port_by_scheme() {
    let uri = url::Url::parse("https://Example.com/foo").unwrap();
    assert_eq!(origin(&uri).as_deref(), Some("https://example.com:443"));
  }

  #[test]
  fn locks_cache_in_memory_after_first_fetch() {
    struct StubTransport;
    impl Transport for StubTransport {
      fn exchange(&self, _request: &PreparedRequest) -> anyhow::Result<crate::transport::ExchangeResult> {
        Ok(crate::transport::ExchangeResult {
          version: "HTTP/1.1".to_string(),
          status_code: 200,
          status_phrase: "OK".to_string(),
          headers: Vec::new(),
          body: b"User-agent: *\nDisallow: /x\n".to_vec(),
          trailers: Vec::new(),
          input_transfer_length: 0,
          input_header_length: 0,
        })
      }
    }
    let cache = RobotsCache::new(None);
    let transport = StubTransport;
    let first = cache.fetch(&transport, "RedBot-rs", "http://example.com:80");
    assert!(first.contains("Disallow: /x"));
    assert_eq!(cache.memory.lock().unwrap().len(), 1);
  }
}
