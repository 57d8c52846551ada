//! The fetch orchestrator: issues the primary request, drives the cache
//! evaluator, spawns the active-check subrequests and (if asked)
//! descends into linked resources. Grounded on `RedFetcher`/`HttpResource`
//! in `original_source/redbot/resource/__init__.py` and
//! `fetch_robots_txt`/`url_to_origin` in `fetch.py`.
//!
//! The original drives all of this from callbacks on a single-threaded
//! event loop; task accounting there is a counter that
//! reaches zero once every spawned callback has fired. A blocking,
//! multi-threaded implementation gets the same "done when everything
//! spawned has finished" contract for free from `crossbeam_utils::thread::
//! scope`, which doesn't return until every thread it spawned has joined.

use crate::active_check;
use crate::cache;
use crate::clock::now_unix;
use crate::message::{HttpRequest, HttpResponse};
use crate::note::Vars;
use crate::notes;
use crate::robots::{self, RobotsCache};
use crate::state::RedState;
use crate::transport::{PreparedRequest, Transport, TransportError};

/// Every outbound request identifies itself this way.
pub const USER_AGENT: &str = concat!("RedBot-rs/", env!("CARGO_PKG_VERSION"), " (+local analysis tool)");

/// What the caller wants analysed, standing in for `HttpResource`'s
/// constructor arguments plus the `RedWebUi`-level `descend` flag.
pub struct FetchOptions {
  pub method: String,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
  pub descend: bool,
  pub follow_robots_txt: bool,
  /// Bounds recursive descent; the original has no such limit (it relies
  /// on `links` deduplication plus a human driving the web UI), but a
  /// library entry point with no human in the loop needs one to terminate
  /// on a site that links back to itself.
  pub max_depth: u32,
}

impl Default for FetchOptions {
  fn default() -> Self {
    Self {
      method: "GET".to_string(),
      headers: Vec::new(),
      body: Vec::new(),
      descend: false,
      follow_robots_txt: true,
      max_depth: 1,
    }
  }
}

/// Runs one full analysis (primary fetch, cache evaluation, active
/// checks, and link descent if requested) and returns the resulting
/// `RedState`. `status_cb` mirrors `HttpResource`'s `status_cb` hook.
pub fn analyze(transport: &dyn Transport, robots: &RobotsCache, uri: &str, options: &FetchOptions, status_cb: &dyn Fn(&str)) -> RedState {
  let mut state = RedState::new(uri);
  run_resource(transport, robots, &mut state, uri, options, status_cb, 0);
  state
}

fn run_resource(transport: &dyn Transport, robots: &RobotsCache, state: &mut RedState, uri: &str, options: &FetchOptions, status_cb: &dyn Fn(&str), depth: u32) {
  status_cb(&format!("fetching {uri}"));
  let fetched = fetch_one(transport, robots, uri, &options.method, &options.headers, &options.body, options.follow_robots_txt);
  state.transfer_in += fetched.transfer_in;
  state.transfer_out += fetched.transfer_out;

  let http_error = fetched.response.message.http_error.clone();
  {
    let primary = state.primary_mut();
    primary.request = Some(fetched.request);
    primary.response = Some(fetched.response);
    primary.absorb_message_notes();
  }

  if let Some(error) = http_error {
    if matches!(error, TransportError::RobotsTxt) {
      state.primary_mut().add_note(notes::ROBOTS_FORBIDDEN, "", Vars::new());
    }
    return;
  }

  if !state.primary().response.as_ref().unwrap().message.complete {
    return;
  }

  let cache_notes = {
    let primary = state.primary_mut();
    let request = primary.request.as_ref();
    let response = primary.response.as_mut().unwrap();
    cache::check_caching(response, request, "This response")
  };
  for note in cache_notes {
    state.primary_mut().notes.push(note);
  }

  run_active_checks(transport, state);

  if options.descend && depth < options.max_depth {
    descend_links(transport, robots, state, options, status_cb, depth);
  }
}

struct FetchOutcome {
  request: HttpRequest,
  response: HttpResponse,
  transfer_in: u64,
  transfer_out: u64,
}

/// Issues one HTTP exchange: builds the request, consults the robots
/// cache if asked to, and (if not disallowed) drives the transport and
/// feeds the response through the message model. Corresponds to
/// `Fetcher`'s `preflight`/`connect`/`_response_*` sequence, collapsed
/// into one blocking call since this crate's transport is itself
/// blocking.
fn fetch_one(transport: &dyn Transport, robots: &RobotsCache, uri: &str, method: &str, extra_headers: &[(String, String)], body: &[u8], follow_robots_txt: bool) -> FetchOutcome {
  let mut request = HttpRequest::new(method);
  request.set_iri(uri);

  let mut headers = extra_headers.to_vec();
  if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("user-agent")) {
    headers.push(("User-Agent".to_string(), USER_AGENT.to_string()));
  }
  request.message.set_headers(headers.clone());
  request.message.start_time = now_unix();

  let mut response = HttpResponse::new(0, uri);
  response.is_head_response = method.eq_ignore_ascii_case("HEAD");

  let transfer_out = headers.iter().map(|(name, value)| name.len() as u64 + value.len() as u64 + 4).sum::<u64>() + body.len() as u64;

  let Some(parsed_uri) = request.uri.as_deref().and_then(|value| url::Url::parse(value).ok()) else {
    response.message.http_error = Some(TransportError::Url(format!("couldn't parse {uri}")));
    response.message.start_time = request.message.start_time;
    return FetchOutcome { request, response, transfer_in: 0, transfer_out: 0 };
  };

  if follow_robots_txt {
    if let Some(origin) = robots::origin(&parsed_uri) {
      let robots_txt = robots.fetch(transport, USER_AGENT, &origin);
      let path = robots::request_path(&parsed_uri);
      if !robots::can_fetch(&robots_txt, USER_AGENT, &path) {
        response.message.http_error = Some(TransportError::RobotsTxt);
        response.status_code = 502;
        response.status_phrase = "Gateway Error".to_string();
        response.message.start_time = now_unix();
        return FetchOutcome { request, response, transfer_in: 0, transfer_out };
      }
    }
  }

  let prepared = PreparedRequest { method: method.to_string(), uri: parsed_uri, headers, body: body.to_vec() };
  response.message.start_time = now_unix();
  match transport.exchange(&prepared) {
    Ok(result) => {
      response.status_code = result.status_code;
      response.status_phrase = result.status_phrase;
      response.message.version = result.version;
      response.message.set_headers(result.headers);
      response.feed_body(&result.body);
      response.message.transfer_length = result.input_transfer_length;
      response.message.header_length = result.input_header_length;
      let transfer_in = result.input_transfer_length;
      response.body_done(true, result.trailers, now_unix());
      FetchOutcome { request, response, transfer_in, transfer_out }
    }
    Err(error) => {
      record_transport_error(&mut response, error);
      response.message.complete = false;
      response.message.complete_time = Some(now_unix());
      FetchOutcome { request, response, transfer_in: 0, transfer_out }
    }
  }
}

/// Classifies a failed exchange's error and records both the
/// transport-level `http_error` and, for the two cases the note system
/// names explicitly (§7: "message errors... always emitted as notes"), the
/// matching note: `BAD_CHUNK` for a chunked-encoding framing error,
/// `BODY_NOT_ALLOWED` for a response that wasn't supposed to carry a body
/// (HEAD, 1xx, 204, 304) but did anyway. Anything else becomes a generic
/// `Url` transport error with no note, matching `_response_error`'s
/// fallback.
pub(crate) fn record_transport_error(response: &mut HttpResponse, error: anyhow::Error) {
  match error.downcast::<TransportError>() {
    Ok(TransportError::Chunk(message)) => {
      response.message.notes.push(crate::note::Note::new(
        notes::BAD_CHUNK,
        "",
        Vars::new().set("response", "This response").set("chunk_sample", &message),
      ));
      response.message.http_error = Some(TransportError::Chunk(message));
    }
    Ok(TransportError::BodyForbidden) => {
      response.message.notes.push(crate::note::Note::new(
        notes::BODY_NOT_ALLOWED,
        "",
        Vars::new().set("response", "This response"),
      ));
      response.message.http_error = Some(TransportError::BodyForbidden);
    }
    Ok(other) => response.message.http_error = Some(other),
    Err(error) => response.message.http_error = Some(TransportError::Url(error.to_string())),
  }
}

/// Spawns the four active-check subrequests concurrently and folds their
/// outcomes into `state`: each probe's exchange is inserted by name, and
/// its capability verdict updates the matching `RedState` flag.
fn run_active_checks(transport: &dyn Transport, state: &mut RedState) {
  let primary = state.primary();
  let request = primary.request.as_ref().expect("primary request set before active checks run");
  let response = primary.response.as_ref().expect("primary response set before active checks run");

  let (etag_result, lm_result, range_result, conneg_result) = crossbeam_utils::thread::scope(|scope| {
    let etag = scope.spawn(|_| active_check::etag_validate(transport, request, response));
    let lm = scope.spawn(|_| active_check::lm_validate(transport, request, response));
    let range = scope.spawn(|_| active_check::range_probe(transport, request, response));
    let conneg = scope.spawn(|_| active_check::conneg_probe(transport, request, response));
    (
      etag.join().expect("etag_validate thread panicked"),
      lm.join().expect("lm_validate thread panicked"),
      range.join().expect("range_probe thread panicked"),
      conneg.join().expect("conneg_probe thread panicked"),
    )
  })
  .expect("active-check scope panicked");

  state.inm_support = etag_result.support;
  if let Some(exchange) = etag_result.exchange {
    state.exchanges.insert(exchange.name.clone(), exchange);
  }

  state.ims_support = lm_result.support;
  if let Some(exchange) = lm_result.exchange {
    state.exchanges.insert(exchange.name.clone(), exchange);
  }

  state.partial_support = range_result.support;
  if let Some(exchange) = range_result.exchange {
    state.exchanges.insert(exchange.name.clone(), exchange);
  }

  let (conneg_check, savings) = conneg_result;
  state.gzip_support = conneg_check.support;
  state.gzip_savings = savings;
  if let Some(exchange) = conneg_check.exchange {
    state.exchanges.insert(exchange.name.clone(), exchange);
  }
}

/// Scans the primary response's decoded body for links, records each
/// under its tag (`RedState.links`), and recursively
/// analyses the distinct, non-anchor ones, mirroring `process_link`
/// (`original_source/redbot/resource/__init__.py`): anchors (`<a>`) are
/// recorded but never descended into, since they lead to a different
/// page rather than a resource this one depends on.
fn descend_links(transport: &dyn Transport, robots: &RobotsCache, state: &mut RedState, options: &FetchOptions, status_cb: &dyn Fn(&str), depth: u32) {
  let response = state.primary().response.as_ref().unwrap();
  let base_uri = response.message.base_uri.clone();
  let decoded = String::from_utf8_lossy(&response.message.decoded_sample).into_owned();
  let Ok(base) = url::Url::parse(&base_uri) else { return };

  let mut to_descend: Vec<(String, String)> = Vec::new();
  for (tag, href, _title) in crate::links::extract_links(&decoded) {
    let is_new = state.record_link(&tag, &href);
    if tag != "a" && is_new {
      if let Ok(resolved) = base.join(&href) {
        to_descend.push((tag, resolved.to_string()));
      }
    }
  }

  for (tag, resolved_uri) in to_descend {
    let mut child = RedState::new(&resolved_uri);
    let child_options = FetchOptions {
      method: "GET".to_string(),
      headers: options.headers.clone(),
      body: Vec::new(),
      descend: false,
      follow_robots_txt: options.follow_robots_txt,
      max_depth: options.max_depth,
    };
    run_resource(transport, robots, &mut child, &resolved_uri, &child_options, status_cb, depth + 1);
    state.linked.push((child, tag));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::transport::ExchangeResult;

  struct StubTransport {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
  }

  impl Transport for StubTransport {
    fn exchange(&self, _request: &PreparedRequest) -> anyhow::Result<ExchangeResult> {
      Ok(ExchangeResult {
        version: "HTTP/1.1".to_string(),
        status_code: self.status,
        status_phrase: "OK".to_string(),
        headers: self.headers.clone(),
        body: self.body.clone(),
        trailers: Vec::new(),
        input_transfer_length: self.body.len() as u64,
        input_header_length: 0,
      })
    }
  }

  #[test]
  fn analyze_runs_cache_evaluation_on_a_complete_response() {
    let transport = StubTransport {
      status: 200,
      headers: vec![
        ("Date".to_string(), "Mon, 04 Jul 2011 09:08:06 GMT".to_string()),
        ("Cache-Control".to_string(), "max-age=3600".to_string()),
      ],
      body: b"hello".to_vec(),
    };
    let robots = RobotsCache::new(None);
    let options = FetchOptions { follow_robots_txt: false, ..FetchOptions::default() };
    let state = analyze(&transport, &robots, "http://example.com/", &options, &|_| {});
    let primary = state.primary();
    assert!(primary.notes.has_kind("STOREABLE"));
    assert!(primary.notes.has_kind("FRESHNESS_FRESH"));
    assert!(state.inm_support.is_some() || state.inm_support.is_none());
  }

  #[test]
  fn robots_disallow_short_circuits_the_fetch() {
    struct RobotsDenyTransport;
    impl Transport for RobotsDenyTransport {
      fn exchange(&self, request: &PreparedRequest) -> anyhow::Result<ExchangeResult> {
        if request.uri.path() == "/robots.txt" {
          Ok(ExchangeResult {
            version: "HTTP/1.1".to_string(),
            status_code: 200,
            status_phrase: "OK".to_string(),
            headers: Vec::new(),
            body: b"User-agent: *\nDisallow: /\n".to_vec(),
            trailers: Vec::new(),
            input_transfer_length: 0,
            input_header_length: 0,
          })
        } else {
          panic!("should not fetch a disallowed resource");
        }
      }
    }
    let transport = RobotsDenyTransport;
    let robots = RobotsCache::new(None);
    let options = FetchOptions::default();
    let state = analyze(&transport, &robots, "http://example.com/secret", &options, &|_| {});
    assert!(state.primary().notes.has_kind("ROBOTS_FORBIDDEN"));
  }

  #[test]
  fn descend_collects_non_anchor_links_as_children() {
    struct LinkingTransport;
    impl Transport for LinkingTransport {
      fn exchange(&self, request: &PreparedRequest) -> anyhow::Result<ExchangeResult> {
        if request.uri.path() == "/style.css" {
          return Ok(ExchangeResult {
            version: "HTTP/1.1".to_string(),
            status_code: 200,
            status_phrase: "OK".to_string(),
            headers: Vec::new(),
            body: b"body{}".to_vec(),
            trailers: Vec::new(),
            input_transfer_length: 6,
            input_header_length: 0,
          });
        }
        Ok(ExchangeResult {
          version: "HTTP/1.1".to_string(),
          status_code: 200,
          status_phrase: "OK".to_string(),
          headers: vec![("Content-Type".to_string(), "text/html".to_string())],
          body: br#"<html><a href="/page2">next</a><link href="/style.css"></html>"#.to_vec(),
          trailers: Vec::new(),
          input_transfer_length: 0,
          input_header_length: 0,
        })
      }
    }
    let transport = LinkingTransport;
    let robots = RobotsCache::new(None);
    let options = FetchOptions { descend: true, follow_robots_txt: false, ..FetchOptions::default() };
    let state = analyze(&transport, &robots, "http://example.com/", &options, &|_| {});
    assert_eq!(state.linked.len(), 1);
    assert_eq!(state.linked[0].1, "link");
    assert!(state.links.get("a").map(|set| set.contains("/page2")).unwrap_or(false));
  }
}
