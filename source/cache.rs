//! The cache-semantics evaluator. Grounded on
//! `redbot/message/cache.py`'s `checkCaching`: a pure function over a
//! parsed response (and optionally its request) that emits notes about
//! storability, freshness, revalidation, Vary usage and clock skew. See
//! caching evaluator.

use crate::header::{self, cache_control};
use crate::message::{HttpRequest, HttpResponse};
use crate::note::{Note, Vars};
use crate::notes;

const CACHEABLE_METHODS: &[&str] = &["GET"];
const HEURISTIC_CACHEABLE_STATUS: &[u16] = &[200, 203, 206, 300, 301, 410];
const MAX_CLOCK_SKEW: i64 = 5;

fn base_vars(response_label: &str, status: u16) -> Vars {
  Vars::new().set("response", response_label).set("status", status)
}

/// Renders a signed second count the way the original's `relative_time`
/// does for short, human-scale durations ("3 minutes", "1 hour"). Only
/// the units the cache evaluator's templates actually need are covered;
/// this isn't a general-purpose calendar-duration formatter.
pub fn relative_time(seconds: i64) -> String {
  let magnitude = seconds.unsigned_abs();
  let (count, unit) = if magnitude < 60 {
    (magnitude, "second")
  } else if magnitude < 60 * 60 {
    (magnitude / 60, "minute")
  } else if magnitude < 60 * 60 * 24 {
    (magnitude / (60 * 60), "hour")
  } else if magnitude < 60 * 60 * 24 * 30 {
    (magnitude / (60 * 60 * 24), "day")
  } else {
    (magnitude / (60 * 60 * 24 * 30), "month")
  };
  let plural = if count == 1 { "" } else { "s" };
  format!("{count} {unit}{plural}")
}

fn has_key(directives: &[(String, Option<String>)], name: &str) -> bool {
  cache_control::directive(directives, name).is_some()
}

fn int_directive(directives: &[(String, Option<String>)], name: &str) -> Option<i64> {
  cache_control::directive(directives, name).flatten().and_then(|v| v.parse().ok())
}

fn has_header(raw_headers: &[(String, String)], name: &str) -> bool {
  raw_headers.iter().any(|(key, _)| key.eq_ignore_ascii_case(name))
}

/// Examines HTTP caching characteristics of `response` (and, if given,
/// the request it answers), returning the notes to attach to that
/// exchange. `response_label` is the subrequest-relative name (e.g.
/// "This response") every templated note refers to the response by.
pub fn check_caching(response: &mut HttpResponse, request: Option<&HttpRequest>, response_label: &str) -> Vec<Note> {
  let mut notes = Vec::new();

  // Pull everything the evaluator needs out of the message up front so the
  // rest of this function is free to mutate `response`'s own fields.
  let status = response.status_code;
  let method = request.and_then(|r| r.message.method.clone());
  let authenticated = request.map_or(false, |r| has_header(&r.message.raw_headers, "authorization"));
  let start_time = response.message.start_time;
  let date = response.message.headers.get("date").and_then(header::Value::as_date);
  let lm = response.message.headers.get("last-modified").and_then(header::Value::as_date);
  let age_hdr = response.message.headers.get("age").and_then(header::Value::as_int).unwrap_or(0);
  let has_expires = response.message.headers.contains_key("expires");
  let has_last_modified = response.message.headers.contains_key("last-modified");
  let has_etag = response.message.headers.contains_key("etag");
  let expires = response.message.headers.get("expires").and_then(header::Value::as_date);
  let cc = response
    .message
    .headers
    .get("cache-control")
    .and_then(header::Value::as_params)
    .map(<[(String, Option<String>)]>::to_vec)
    .unwrap_or_default();
  let vary: Vec<String> = response
    .message
    .headers
    .get("vary")
    .and_then(header::Value::as_list)
    .map(<[String]>::to_vec)
    .unwrap_or_default();

  let vars = base_vars(response_label, status);

  // Last-Modified.
  if let Some(lm) = lm {
    let serv_date = date.unwrap_or(start_time);
    if lm > serv_date {
      notes.push(Note::new(notes::LM_FUTURE, "header-last-modified", vars.clone()));
    } else {
      notes.push(Note::new(
        notes::LM_PRESENT,
        "header-last-modified",
        vars.clone().set("lm_diff", relative_time(serv_date - lm)),
      ));
    }
  }

  // Storability: first matching rule wins.
  if let Some(method) = &method {
    if !CACHEABLE_METHODS.contains(&method.as_str()) {
      response.store_shared = Some(false);
      response.store_private = Some(false);
      notes.push(Note::new(notes::METHOD_UNCACHEABLE, "method", vars.clone().set("method", method)));
      return notes;
    }
  }
  if has_key(&cc, "no-store") {
    response.store_shared = Some(false);
    response.store_private = Some(false);
    notes.push(Note::new(notes::NO_STORE, "header-cache-control", vars.clone()));
    return notes;
  } else if has_key(&cc, "private") {
    response.store_shared = Some(false);
    response.store_private = Some(true);
    notes.push(Note::new(notes::PRIVATE_CC, "header-cache-control", vars.clone()));
  } else if authenticated && !has_key(&cc, "public") {
    response.store_shared = Some(false);
    response.store_private = Some(true);
    notes.push(Note::new(notes::PRIVATE_AUTH, "header-cache-control", vars.clone()));
  } else {
    response.store_shared = Some(true);
    response.store_private = Some(true);
    notes.push(Note::new(notes::STOREABLE, "header-cache-control", vars.clone()));
  }

  // no-cache.
  if has_key(&cc, "no-cache") {
    if !has_last_modified && !has_etag {
      notes.push(Note::new(notes::NO_CACHE_NO_VALIDATOR, "header-cache-control", vars.clone()));
    } else {
      notes.push(Note::new(notes::NO_CACHE, "header-cache-control", vars.clone()));
    }
    return notes;
  }

  // pre-check / post-check (Internet-Explorer-specific).
  if has_key(&cc, "pre-check") || has_key(&cc, "post-check") {
    if !has_key(&cc, "pre-check") || !has_key(&cc, "post-check") {
      notes.push(Note::new(notes::CHECK_SINGLE, "header-cache-control", vars.clone()));
    } else {
      let pre = int_directive(&cc, "pre-check");
      let post = int_directive(&cc, "post-check");
      match (pre, post) {
        (Some(pre), Some(post)) => {
          if pre == 0 && post == 0 {
            notes.push(Note::new(notes::CHECK_ALL_ZERO, "header-cache-control", vars.clone()));
          } else if post > pre {
            notes.push(Note::new(notes::CHECK_POST_BIGGER, "header-cache-control", vars.clone()));
          } else if post == 0 {
            notes.push(Note::new(notes::CHECK_POST_ZERO, "header-cache-control", vars.clone()));
          } else {
            notes.push(Note::new(
              notes::CHECK_POST_PRE,
              "header-cache-control",
              vars.clone().set("precheck", pre).set("postcheck", post),
            ));
          }
        }
        _ => notes.push(Note::new(notes::CHECK_NOT_INTEGER, "header-cache-control", vars.clone())),
      }
    }
  }

  // Vary.
  if vary.iter().any(|v| v == "*") {
    notes.push(Note::new(notes::VARY_ASTERISK, "header-vary", vars.clone()));
    return notes;
  } else if vary.len() > 3 {
    notes.push(Note::new(
      notes::VARY_COMPLEX,
      "header-vary",
      vars.clone().set("vary_count", vary.len()),
    ));
  } else {
    if vary.iter().any(|v| v == "user-agent") {
      notes.push(Note::new(notes::VARY_USER_AGENT, "header-vary", vars.clone()));
    }
    if vary.iter().any(|v| v == "host") {
      notes.push(Note::new(notes::VARY_HOST, "header-vary", vars.clone()));
    }
  }

  // Age.
  let apparent_age = date.map(|date| (start_time - date).max(0)).unwrap_or(0);
  let current_age = apparent_age.max(age_hdr);
  response.age = Some(current_age);
  if age_hdr >= 1 {
    notes.push(Note::new(
      notes::CURRENT_AGE,
      "header-age header-date",
      vars.clone().set("current_age", current_age),
    ));
  }

  // Clock skew.
  let skew = date.unwrap_or(0) - start_time + age_hdr;
  if date.is_none() {
    notes.push(Note::new(notes::DATE_CLOCKLESS, "", vars.clone()));
    if has_expires || has_last_modified {
      notes.push(Note::new(
        notes::DATE_CLOCKLESS_BAD_HDR,
        "header-expires header-last-modified",
        vars.clone(),
      ));
    }
  } else if age_hdr > MAX_CLOCK_SKEW && current_age - skew < MAX_CLOCK_SKEW {
    notes.push(Note::new(
      notes::AGE_PENALTY,
      "header-date header-age",
      vars.clone().set("current_age", current_age).set("skew", skew),
    ));
  } else if skew.abs() > MAX_CLOCK_SKEW {
    notes.push(Note::new(
      notes::DATE_INCORRECT,
      "header-date",
      vars.clone().set("clock_skew_string", relative_time(skew)),
    ));
  } else {
    notes.push(Note::new(notes::DATE_CORRECT, "header-date", vars.clone()));
  }

  // Freshness lifetime: s-maxage > max-age > Expires - Date.
  let mut freshness_lifetime = 0i64;
  let mut has_explicit_freshness = false;
  let mut has_cc_freshness = false;
  if let Some(s_maxage) = int_directive(&cc, "s-maxage") {
    freshness_lifetime = s_maxage;
    has_explicit_freshness = true;
    has_cc_freshness = true;
  } else if let Some(max_age) = int_directive(&cc, "max-age") {
    freshness_lifetime = max_age;
    has_explicit_freshness = true;
    has_cc_freshness = true;
  } else if let Some(expires) = expires {
    has_explicit_freshness = true;
    freshness_lifetime = expires - date.unwrap_or(start_time);
  }

  let freshness_left = freshness_lifetime - current_age;
  response.freshness_lifetime = Some(freshness_lifetime);
  let fresh = freshness_left > 0;
  if has_explicit_freshness {
    if fresh {
      notes.push(Note::new(
        notes::FRESHNESS_FRESH,
        "header-date header-cache-control header-expires",
        vars.clone().set("freshness_lifetime", freshness_lifetime).set("freshness_left", freshness_left),
      ));
    } else if has_cc_freshness && age_hdr > freshness_lifetime {
      notes.push(Note::new(
        notes::FRESHNESS_STALE_CACHE,
        "header-date header-cache-control header-expires",
        vars.clone().set("freshness_lifetime", freshness_lifetime).set("current_age", current_age),
      ));
    } else {
      notes.push(Note::new(
        notes::FRESHNESS_STALE_ALREADY,
        "header-date header-cache-control header-expires",
        vars.clone().set("freshness_lifetime", freshness_lifetime).set("current_age", current_age),
      ));
    }
  } else if HEURISTIC_CACHEABLE_STATUS.contains(&status) {
    notes.push(Note::new(notes::FRESHNESS_HEURISTIC, "header-last-modified", vars.clone()));
  } else {
    notes.push(Note::new(notes::FRESHNESS_NONE, "", vars.clone()));
  }

  // Revalidation.
  if has_key(&cc, "must-revalidate") {
    if fresh {
      notes.push(Note::new(notes::FRESH_MUST_REVALIDATE, "header-cache-control", vars.clone()));
    } else if has_explicit_freshness {
      notes.push(Note::new(notes::STALE_MUST_REVALIDATE, "header-cache-control", vars.clone()));
    }
  } else if has_key(&cc, "proxy-revalidate") || has_key(&cc, "s-maxage") {
    if fresh {
      notes.push(Note::new(notes::FRESH_PROXY_REVALIDATE, "header-cache-control", vars.clone()));
    } else if has_explicit_freshness {
      notes.push(Note::new(notes::STALE_PROXY_REVALIDATE, "header-cache-control", vars.clone()));
    }
  } else if fresh {
    notes.push(Note::new(notes::FRESH_SERVABLE, "header-cache-control", vars.clone()));
  } else if has_explicit_freshness {
    notes.push(Note::new(notes::STALE_SERVABLE, "header-cache-control", vars.clone()));
  }

  if has_key(&cc, "public") {
    notes.push(Note::new(notes::PUBLIC, "header-cache-control", vars));
  }

  notes
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::header;

  fn dated_response(status: u16, date: i64, start_time: i64) -> HttpResponse {
    let mut response = HttpResponse::new(status, "http://example.com/");
    response.message.start_time = start_time;
    response.message.headers.insert("date".to_string(), header::Value::Date(date));
    response
  }

  #[test]
  fn s1_freshness_happy_path() {
    // Mon, 04 Jul 2011 09:08:06 GMT
    let date = 1309770486;
    let mut response = dated_response(200, date, date);
    response
      .message
      .headers
      .insert("cache-control".to_string(), header::Value::Params(vec![("max-age".to_string(), Some("3600".to_string()))]));
    response
      .message
      .headers
      .insert("last-modified".to_string(), header::Value::Date(date - 86400));
    let notes = check_caching(&mut response, None, "This response");
    let kinds: Vec<&str> = notes.iter().map(|n| n.kind.name).collect();
    assert!(kinds.contains(&"LM_PRESENT"));
    assert!(kinds.contains(&"STOREABLE"));
    assert!(kinds.contains(&"FRESHNESS_FRESH"));
    assert!(kinds.contains(&"DATE_CORRECT"));
    assert_eq!(response.freshness_lifetime, Some(3600));
  }

  #[test]
  fn s2_clock_skew() {
    let date = 1309770486;
    let mut response = dated_response(200, date, date + 3600);
    let notes = check_caching(&mut response, None, "This response");
    assert!(notes.iter().any(|n| n.kind.name == "DATE_INCORRECT" && n.summary().contains("1 hour")));
  }

  #[test]
  fn method_uncacheable_stops_early() {
    let mut request = HttpRequest::new("POST");
    request.set_iri("http://example.com/");
    let mut response = dated_response(200, 1000, 1000);
    let notes = check_caching(&mut response, Some(&request), "This response");
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind.name, "METHOD_UNCACHEABLE");
    assert_eq!(response.store_shared, Some(false));
  }

  #[test]
  fn no_store_stops_early() {
    let mut response = dated_response(200, 1000, 1000);
    response
      .message
      .headers
      .insert("cache-control".to_string(), header::Value::Params(vec![("no-store".to_string(), None)]));
    let notes = check_caching(&mut response, None, "This response");
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind.name, "NO_STORE");
  }

  #[test]
  fn no_date_emits_clockless() {
    let mut response = HttpResponse::new(200, "http://example.com/");
    response.message.start_time = 1000;
    let notes = check_caching(&mut response, None, "This response");
    assert!(notes.iter().any(|n| n.kind.name == "DATE_CLOCKLESS"));
  }

  #[test]
  fn heuristic_freshness_without_explicit_lifetime() {
    let mut response = dated_response(200, 1000, 1000);
    let notes = check_caching(&mut response, None, "This response");
    assert!(notes.iter().any(|n| n.kind.name == "FRESHNESS_HEURISTIC"));
  }
}
