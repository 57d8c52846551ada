//! Active-check subrequests: ETag/Last-Modified validation, a range
//! probe, and a gzip content-negotiation probe. Each repeats the
//! primary's request with a probe-specific header added, then compares
//! the outcome against the primary response. `etag_validate`/`lm_validate`
//! are grounded directly on `original_source/redbot/resource/active_check/
//! {etag_validate,lm_validate}.py`; `range`/`conneg` follow the shared
//! `SubRequest` shape (`active_check/base.py`) and the
//! outcome enumeration, since no original source exists for them.

use crate::clock::now_unix;
use crate::header;
use crate::message::{HttpRequest, HttpResponse};
use crate::note::Vars;
use crate::notes;
use crate::state::ExchangeState;
use crate::transport::{PreparedRequest, Transport};

/// What a probe learned about the capability it tests, if anything (a
/// probe that never ran because its preflight declined still reports a
/// definite `false`, matching `ETagValidate.preflight`'s direct write to
/// `test_state.inm_support`).
pub struct CheckResult {
  pub exchange: Option<ExchangeState>,
  pub support: Option<bool>,
}

fn missing_from_304(
  base: &HttpResponse,
  probe: &HttpResponse,
  hdrs: &[&str],
) -> Vec<String> {
  hdrs
    .iter()
    .filter(|name| base.message.headers.contains_key(**name) && !probe.message.headers.contains_key(**name))
    .map(|name| name.to_string())
    .collect()
}

fn run_subrequest(transport: &dyn Transport, base_request: &HttpRequest, extra_header: (&str, String)) -> (HttpRequest, HttpResponse) {
  let uri = base_request.uri.clone().unwrap_or_default();
  let method = base_request.message.method.clone().unwrap_or_else(|| "GET".to_string());
  let mut headers: Vec<(String, String)> = base_request
    .message
    .raw_headers
    .iter()
    .filter(|(name, _)| !name.eq_ignore_ascii_case(extra_header.0))
    .cloned()
    .collect();
  headers.push((extra_header.0.to_string(), extra_header.1));

  let mut request = HttpRequest::new(&method);
  request.set_iri(&uri);
  request.message.set_headers(headers.clone());

  let mut response = HttpResponse::new(0, &uri);
  response.message.start_time = now_unix();

  let Ok(parsed_uri) = url::Url::parse(&uri) else {
    return (request, response);
  };
  let prepared = PreparedRequest { method, uri: parsed_uri, headers, body: Vec::new() };
  match transport.exchange(&prepared) {
    Ok(result) => {
      response.status_code = result.status_code;
      response.status_phrase = result.status_phrase;
      response.message.version = result.version;
      response.message.set_headers(result.headers);
      response.feed_body(&result.body);
      response.message.transfer_length = result.input_transfer_length;
      response.message.header_length = result.input_header_length;
      response.body_done(true, result.trailers, now_unix());
    }
    Err(error) => {
      crate::fetcher::record_transport_error(&mut response, error);
      response.message.complete = false;
      response.message.complete_time = Some(now_unix());
    }
  }
  (request, response)
}

fn finish(name: &str, request: HttpRequest, response: HttpResponse) -> ExchangeState {
  let mut exchange = ExchangeState::new(Some(name));
  exchange.request = Some(request);
  exchange.response = Some(response);
  exchange.absorb_message_notes();
  exchange
}

/// `ETagValidate`: sends `If-None-Match` built from the base response's
/// ETag and classifies the outcome.
pub fn etag_validate(transport: &dyn Transport, base_request: &HttpRequest, base_response: &HttpResponse) -> CheckResult {
  let Some((weak, tag)) = base_response.message.headers.get("etag").and_then(header::Value::as_etag) else {
    return CheckResult { exchange: None, support: Some(false) };
  };
  let prefix = if weak { "W/" } else { "" };
  let (request, response) = run_subrequest(transport, base_request, ("If-None-Match", format!("{prefix}\"{tag}\"")));
  let mut exchange = finish("ETag validation", request, response);

  if !exchange.response.as_ref().unwrap().message.complete {
    exchange.add_note(notes::ETAG_SUBREQ_PROBLEM, "", Vars::new().set("problem", "the subrequest didn't complete"));
    return CheckResult { exchange: Some(exchange), support: None };
  }

  // Pull everything the decision needs out of `probe` as owned values up
  // front: holding a `&HttpResponse` borrowed from `exchange.response`
  // across an `exchange.add_note(&mut self, ...)` call doesn't
  // borrow-check, since `add_note` needs `exchange` exclusively.
  let probe = exchange.response.as_ref().unwrap();
  let probe_status = probe.status_code;
  let probe_md5 = probe.message.payload_md5;
  let probe_etag = probe.message.headers.get("etag").and_then(header::Value::as_etag).map(|(weak, tag)| (weak, tag.to_string()));
  let missing = missing_from_304(base_response, probe, &["cache-control", "content-location", "etag", "expires", "vary"]);

  let support = if probe_status == 304 {
    exchange.add_note(notes::INM_304, "header-etag", Vars::new());
    if !missing.is_empty() {
      exchange.add_note(
        notes::MISSING_HDRS_304,
        "headers",
        Vars::new().set("missing_hdrs", missing.join(", ")).set("subreq_type", "If-None-Match"),
      );
    }
    Some(true)
  } else if probe_status == base_response.status_code {
    if probe_md5 == base_response.message.payload_md5 {
      exchange.add_note(notes::INM_FULL, "header-etag", Vars::new());
      Some(false)
    } else {
      match probe_etag {
        Some((probe_weak, ref probe_tag)) if probe_weak == weak && probe_tag == tag => {
          if weak {
            exchange.add_note(notes::INM_DUP_ETAG_WEAK, "header-etag", Vars::new());
          } else {
            exchange.add_note(notes::INM_DUP_ETAG_STRONG, "header-etag", Vars::new().set("etag", tag));
          }
          None
        }
        _ => {
          exchange.add_note(notes::INM_UNKNOWN, "header-etag", Vars::new());
          None
        }
      }
    }
  } else {
    exchange.add_note(
      notes::INM_STATUS,
      "header-etag",
      Vars::new().set("inm_status", probe_status).set("enc_inm_status", probe_status),
    );
    None
  };
  CheckResult { exchange: Some(exchange), support }
}

/// `LmValidate`: structurally identical to `etag_validate`, driven by
/// `Last-Modified`/`If-Modified-Since` instead of `ETag`/`If-None-Match`.
pub fn lm_validate(transport: &dyn Transport, base_request: &HttpRequest, base_response: &HttpResponse) -> CheckResult {
  let Some(last_modified) = base_response.message.headers.get("last-modified").and_then(header::Value::as_date) else {
    return CheckResult { exchange: None, support: Some(false) };
  };
  let (request, response) = run_subrequest(transport, base_request, ("If-Modified-Since", header::format_http_date(last_modified)));
  let mut exchange = finish("LM validation", request, response);

  if !exchange.response.as_ref().unwrap().message.complete {
    exchange.add_note(notes::LM_SUBREQ_PROBLEM, "", Vars::new().set("problem", "the subrequest didn't complete"));
    return CheckResult { exchange: Some(exchange), support: None };
  }

  let probe = exchange.response.as_ref().unwrap();
  let probe_status = probe.status_code;
  let probe_md5 = probe.message.payload_md5;
  let missing = missing_from_304(base_response, probe, &["cache-control", "content-location", "etag", "expires", "vary"]);

  let support = if probe_status == 304 {
    exchange.add_note(notes::IMS_304, "header-last-modified", Vars::new());
    if !missing.is_empty() {
      exchange.add_note(
        notes::MISSING_HDRS_304,
        "headers",
        Vars::new().set("missing_hdrs", missing.join(", ")).set("subreq_type", "If-Modified-Since"),
      );
    }
    Some(true)
  } else if probe_status == base_response.status_code && probe_md5 == base_response.message.payload_md5 {
    exchange.add_note(notes::IMS_FULL, "header-last-modified", Vars::new());
    Some(false)
  } else if probe_status == base_response.status_code {
    exchange.add_note(notes::IMS_UNKNOWN, "header-last-modified", Vars::new());
    None
  } else {
    exchange.add_note(notes::IMS_STATUS, "header-last-modified", Vars::new().set("ims_status", probe_status));
    None
  };
  CheckResult { exchange: Some(exchange), support }
}

const RANGE_PROBE_BYTES: u64 = 1024;

/// Range probe: requests the first `RANGE_PROBE_BYTES` and compares them
/// to the same slice of the base body.
pub fn range_probe(transport: &dyn Transport, base_request: &HttpRequest, base_response: &HttpResponse) -> CheckResult {
  if base_response.message.payload_len == 0 {
    return CheckResult { exchange: None, support: None };
  }
  let end = base_response.message.payload_len.min(RANGE_PROBE_BYTES).saturating_sub(1);
  let (request, response) = run_subrequest(transport, base_request, ("Range", format!("bytes=0-{end}")));
  let mut exchange = finish("range", request, response);

  if !exchange.response.as_ref().unwrap().message.complete {
    exchange.add_note(notes::RANGE_SUBREQ_PROBLEM, "", Vars::new().set("problem", "the subrequest didn't complete"));
    return CheckResult { exchange: Some(exchange), support: None };
  }

  let probe = exchange.response.as_ref().unwrap();
  let support = if probe.status_code == 206 {
    let expected: Vec<u8> = base_response
      .message
      .payload_sample
      .iter()
      .find(|(offset, _)| *offset == 0)
      .map(|(_, chunk)| chunk[..chunk.len().min((end + 1) as usize)].to_vec())
      .unwrap_or_default();
    let received = probe
      .message
      .payload_sample
      .iter()
      .find(|(offset, _)| *offset == 0)
      .map(|(_, chunk)| chunk.clone())
      .unwrap_or_default();
    if !expected.is_empty() && expected == received {
      exchange.add_note(notes::RANGE_CORRECT, "header-content-range", Vars::new());
      Some(true)
    } else if expected.is_empty() {
      exchange.add_note(notes::RANGE_CHANGED, "header-content-range", Vars::new());
      None
    } else {
      exchange.add_note(
        notes::RANGE_INCORRECT,
        "header-content-range",
        Vars::new()
          .set("range_expected", String::from_utf8_lossy(&expected))
          .set("range_received", String::from_utf8_lossy(&received)),
      );
      Some(false)
    }
    .and_then(|ok| {
      let required = ["content-range", "content-length"];
      let missing: Vec<&str> = required.iter().copied().filter(|name| !probe.message.headers.contains_key(*name)).collect();
      if !missing.is_empty() {
        exchange.add_note(notes::MISSING_HDRS_206, "headers", Vars::new().set("missing", missing.join(", ")));
      }
      Some(ok)
    })
  } else if probe.status_code == base_response.status_code {
    exchange.add_note(notes::RANGE_FULL, "header-content-range", Vars::new());
    Some(false)
  } else {
    exchange.add_note(notes::RANGE_STATUS, "header-content-range", Vars::new().set("range_status", probe.status_code));
    None
  };
  CheckResult { exchange: Some(exchange), support }
}

/// Conneg probe: repeats the request without `Accept-Encoding` to
/// establish an uncompressed baseline, then compares it against the
/// (already gzip-negotiated) primary.
pub fn conneg_probe(transport: &dyn Transport, base_request: &HttpRequest, base_response: &HttpResponse) -> (CheckResult, Option<i64>) {
  let uri = base_request.uri.clone().unwrap_or_default();
  let method = base_request.message.method.clone().unwrap_or_else(|| "GET".to_string());
  let headers: Vec<(String, String)> = base_request
    .message
    .raw_headers
    .iter()
    .filter(|(name, _)| !name.eq_ignore_ascii_case("accept-encoding"))
    .cloned()
    .collect();

  let mut request = HttpRequest::new(&method);
  request.set_iri(&uri);
  request.message.set_headers(headers.clone());
  let mut response = HttpResponse::new(0, &uri);
  response.message.start_time = now_unix();

  let Ok(parsed_uri) = url::Url::parse(&uri) else {
    return (CheckResult { exchange: None, support: None }, None);
  };
  let prepared = PreparedRequest { method, uri: parsed_uri, headers, body: Vec::new() };
  match transport.exchange(&prepared) {
    Ok(result) => {
      response.status_code = result.status_code;
      response.status_phrase = result.status_phrase;
      response.message.set_headers(result.headers);
      response.feed_body(&result.body);
      response.body_done(true, result.trailers, now_unix());
    }
    Err(error) => {
      crate::fetcher::record_transport_error(&mut response, error);
      response.message.complete = false;
    }
  }
  let mut exchange = finish("conneg", request, response);

  if !exchange.response.as_ref().unwrap().message.complete {
    exchange.add_note(notes::CONNEG_SUBREQ_PROBLEM, "", Vars::new().set("problem", "the baseline subrequest didn't complete"));
    return (CheckResult { exchange: Some(exchange), support: None }, None);
  }

  let baseline = exchange.response.as_ref().unwrap();
  let base_is_gzip = base_response
    .message
    .headers
    .get("content-encoding")
    .and_then(header::Value::as_list)
    .map(|codings| codings.iter().any(|coding| coding == "gzip" || coding == "x-gzip"))
    .unwrap_or(false);
  let baseline_is_gzip = baseline
    .message
    .headers
    .get("content-encoding")
    .and_then(header::Value::as_list)
    .map(|codings| codings.iter().any(|coding| coding == "gzip" || coding == "x-gzip"))
    .unwrap_or(false);

  let has_vary_ae = base_response
    .message
    .headers
    .get("vary")
    .and_then(header::Value::as_list)
    .map(|values| values.iter().any(|value| value == "accept-encoding"))
    .unwrap_or(false);

  if baseline_is_gzip {
    exchange.add_note(notes::CONNEG_GZIP_WITHOUT_ASKING, "header-content-encoding", Vars::new());
  }
  if baseline.status_code != base_response.status_code {
    exchange.add_note(notes::VARY_STATUS_MISMATCH, "header-vary", Vars::new());
  }

  let unrelated_names = |message: &crate::message::HttpMessage| -> std::collections::BTreeSet<String> {
    message
      .raw_headers
      .iter()
      .map(|(name, _)| name.to_ascii_lowercase())
      .filter(|name| !matches!(name.as_str(), "content-encoding" | "content-length" | "transfer-encoding" | "date"))
      .collect()
  };
  if unrelated_names(&base_response.message) != unrelated_names(&baseline.message) {
    exchange.add_note(notes::VARY_HEADER_MISMATCH, "header-vary", Vars::new());
  }

  let baseline_vary = baseline
    .message
    .headers
    .get("vary")
    .and_then(header::Value::as_list)
    .map(|values| values.iter().cloned().collect::<std::collections::BTreeSet<_>>())
    .unwrap_or_default();
  let base_vary = base_response
    .message
    .headers
    .get("vary")
    .and_then(header::Value::as_list)
    .map(|values| values.iter().cloned().collect::<std::collections::BTreeSet<_>>())
    .unwrap_or_default();
  if base_vary != baseline_vary {
    exchange.add_note(notes::VARY_INCONSISTENT, "header-vary", Vars::new());
  }

  let (support, savings) = if !base_is_gzip {
    exchange.add_note(notes::CONNEG_NO_GZIP, "header-content-encoding", Vars::new());
    (Some(false), None)
  } else {
    if !has_vary_ae {
      exchange.add_note(notes::CONNEG_NO_VARY, "header-vary", Vars::new());
    }
    if base_response.message.decoded_sample != baseline.message.decoded_sample {
      exchange.add_note(notes::VARY_BODY_MISMATCH, "header-content-encoding", Vars::new());
    }
    if base_response.message.headers.get("etag").and_then(header::Value::as_etag)
      == baseline.message.headers.get("etag").and_then(header::Value::as_etag)
      && base_response.message.headers.contains_key("etag")
    {
      exchange.add_note(notes::VARY_ETAG_DOESNT_CHANGE, "header-etag", Vars::new());
    }
    if base_response.message.payload_len < baseline.message.payload_len {
      let savings = 100 - (base_response.message.payload_len * 100 / baseline.message.payload_len.max(1)) as i64;
      exchange.add_note(notes::CONNEG_GZIP_GOOD, "header-content-encoding", Vars::new().set("savings", savings));
      (Some(true), Some(savings))
    } else {
      exchange.add_note(notes::CONNEG_GZIP_BAD, "header-content-encoding", Vars::new());
      (Some(true), Some(0))
    }
  };

  (CheckResult { exchange: Some(exchange), support }, savings)
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
        status_phrase: String::new(),
        headers: self.headers.clone(),
        body: self.body.clone(),
        trailers: Vec::new(),
        input_transfer_length: 0,
        input_header_length: 0,
      })
    }
  }

  fn base_exchange(etag: &str, body: &[u8]) -> (HttpRequest, HttpResponse) {
    let mut request = HttpRequest::new("GET");
    request.set_iri("http://example.com/");
    request.message.set_headers(Vec::new());
    let mut response = HttpResponse::new(200, "http://example.com/");
    response.message.set_headers(vec![("ETag".to_string(), etag.to_string())]);
    response.feed_body(body);
    response.body_done(true, Vec::new(), 0);
    (request, response)
  }

  #[test]
  fn etag_validate_reports_304_support() {
    let (request, response) = base_exchange(r#""abc""#, b"hello");
    let transport = StubTransport { status: 304, headers: Vec::new(), body: Vec::new() };
    let result = etag_validate(&transport, &request, &response);
    assert_eq!(result.support, Some(true));
    assert!(result.exchange.unwrap().notes.has_kind(notes::INM_304.name));
  }

  #[test]
  fn etag_validate_without_etag_is_unsupported() {
    let mut request = HttpRequest::new("GET");
    request.set_iri("http://example.com/");
    let response = HttpResponse::new(200, "http://example.com/");
    let transport = StubTransport { status: 200, headers: Vec::new(), body: Vec::new() };
    let result = etag_validate(&transport, &request, &response);
    assert_eq!(result.support, Some(false));
    assert!(result.exchange.is_none());
  }
}
