//! HTTP message ingestion: header processing, transfer/content-coding
//! decode, payload sampling and digesting. Grounded on
//! `redbot/message/__init__.py`'s `HttpMessage`/`HttpRequest`/`HttpResponse`.

use crate::header;
use crate::note::{Note, NoteBag, Vars};
use crate::notes;

const MAX_URI: usize = 8000;
const DECODED_SAMPLE_SIZE: usize = 128 * 1024;
const PAYLOAD_SAMPLE_CHUNKS: usize = 4;

/// Shared state between requests and responses. Rather than mirroring the
/// original's inheritance, `HttpRequest`/`HttpResponse` each embed one of
/// these and add their own fields; header modules only ever need the
/// fields declared here (`base_uri`, `method`), so they take `&HttpMessage`
/// directly.
pub struct HttpMessage {
  pub is_request: bool,
  pub method: Option<String>,
  pub version: String,
  pub base_uri: String,
  /// Unix timestamp set by the fetch orchestrator when the first byte of
  /// this message is seen (request: when it's sent; response: when the
  /// status line arrives). Needed by the cache evaluator's age/skew math.
  pub start_time: i64,
  pub complete: bool,
  pub complete_time: Option<i64>,
  pub transfer_length: u64,
  pub raw_headers: Vec<(String, String)>,
  pub headers: std::collections::HashMap<String, header::Value>,
  pub header_length: usize,
  pub payload_len: u64,
  pub payload_md5: Option<[u8; 16]>,
  pub payload_sample: Vec<(u64, Vec<u8>)>,
  pub character_encoding: String,
  pub decoded_len: u64,
  pub decoded_md5: Option<[u8; 16]>,
  pub decoded_sample: Vec<u8>,
  decoded_sample_seen: usize,
  pub decoded_sample_complete: bool,
  decode_ok: bool,
  gzip: GzipState,
  md5_raw: md5::Context,
  md5_decoded: md5::Context,
  pub trailers: Vec<(String, String)>,
  pub notes: NoteBag,
  /// Set by the fetch orchestrator when the transport fails before the
  /// message completes; `None` for a normal exchange.
  pub http_error: Option<crate::transport::TransportError>,
}

struct GzipState {
  header_buffer: Vec<u8>,
  in_body: bool,
  decompressor: flate2::Decompress,
}

impl HttpMessage {
  fn new(is_request: bool) -> Self {
    Self {
      is_request,
      method: None,
      version: String::new(),
      base_uri: String::new(),
      start_time: 0,
      complete: false,
      complete_time: None,
      transfer_length: 0,
      raw_headers: Vec::new(),
      headers: std::collections::HashMap::new(),
      header_length: 0,
      payload_len: 0,
      payload_md5: None,
      payload_sample: Vec::new(),
      character_encoding: "utf-8".to_string(),
      decoded_len: 0,
      decoded_md5: None,
      decoded_sample: Vec::new(),
      decoded_sample_seen: 0,
      decoded_sample_complete: true,
      decode_ok: true,
      gzip: GzipState {
        header_buffer: Vec::new(),
        in_body: false,
        // Negative window bits in the original's zlib.decompressobj(-MAX_WBITS)
        // select raw deflate (no zlib header); flate2's non-zlib mode matches.
        decompressor: flate2::Decompress::new(false),
      },
      md5_raw: md5::Context::new(),
      md5_decoded: md5::Context::new(),
      trailers: Vec::new(),
      notes: NoteBag::new(),
      http_error: None,
    }
  }

  #[cfg(test)]
  pub fn test_stub() -> Self {
    let mut message = Self::new(false);
    message.base_uri = "http://www.example.com/foo/bar/baz.html?bat=bam".to_string();
    message
  }

  /// Feeds the full header block in and runs the registry over it.
  pub fn set_headers(&mut self, raw_headers: Vec<(String, String)>) {
    let (parsed, notes) = header::process_headers(self, &raw_headers, self.is_request);
    self.header_length = raw_headers
      .iter()
      .map(|(name, value)| name.len() + value.len() + 4)
      .sum();
    self.raw_headers = raw_headers;
    self.headers = parsed;
    for note in notes {
      self.notes.push(note);
    }
    self.character_encoding = self
      .headers
      .get("content-type")
      .and_then(header::content_type::charset)
      .unwrap_or_else(|| "utf-8".to_string());
  }

  pub fn content_length(&self) -> Option<i64> {
    self.headers.get("content-length").and_then(header::Value::as_int)
  }

  fn content_codings(&self) -> Vec<String> {
    self
      .headers
      .get("content-encoding")
      .and_then(header::Value::as_list)
      .map(<[String]>::to_vec)
      .unwrap_or_default()
  }

  /// Feeds one chunk of the body in, sampling the raw payload and running
  /// it through content-coding decode for the decoded sample.
  pub fn feed_body(&mut self, chunk: &[u8], is_206: bool) {
    self.payload_sample.push((self.payload_len, chunk.to_vec()));
    if self.payload_sample.len() > PAYLOAD_SAMPLE_CHUNKS {
      self.payload_sample.remove(0);
    }
    self.md5_raw.consume(chunk);
    self.payload_len += chunk.len() as u64;

    if is_206 {
      // 206 bodies are stored raw; their framing is understood by the
      // range-check active probe, not by the content-coding decoder.
      return;
    }

    let Some(decoded) = self.process_content_codings(chunk) else {
      // `decode_ok` went false: a real decode failure (bad gzip header or
      // inflate error), already noted by `process_content_codings`. From
      // here on the decoded sample can't be trusted to be complete.
      self.decoded_sample_complete = false;
      return;
    };
    if self.decoded_sample_seen + decoded.len() < DECODED_SAMPLE_SIZE {
      self.decoded_sample.extend_from_slice(&decoded);
      self.decoded_sample_seen += decoded.len();
    } else if self.decoded_sample_seen < DECODED_SAMPLE_SIZE {
      let max_len = DECODED_SAMPLE_SIZE - self.decoded_sample_seen;
      self.decoded_sample.extend_from_slice(&decoded[..max_len]);
      self.decoded_sample_seen += decoded.len();
      self.decoded_sample_complete = false;
    } else {
      self.decoded_sample_complete = false;
    }
  }

  /// `skip_checks` is set by `HttpResponse::body_done` for HEAD responses
  /// and `304`s, where Content-Length/Content-MD5 don't describe a body
  /// that was actually sent.
  pub fn body_done(&mut self, complete: bool, trailers: Vec<(String, String)>, complete_time: i64, skip_checks: bool) {
    self.complete = complete;
    self.complete_time = Some(complete_time);
    self.trailers = trailers;
    self.payload_md5 = Some(self.md5_raw.clone().compute().0);
    self.decoded_md5 = Some(self.md5_decoded.clone().compute().0);

    if skip_checks {
      return;
    }
    if let Some(declared) = self.content_length() {
      if declared >= 0 && declared as u64 == self.payload_len {
        self.notes.push(Note::new(notes::CL_CORRECT, "header-content-length", Vars::new()));
      } else {
        self.notes.push(Note::new(
          notes::CL_INCORRECT,
          "header-content-length",
          Vars::new().set("payload_len", self.payload_len),
        ));
      }
    }
    if let Some(declared) = self.headers.get("content-md5").and_then(header::Value::as_text) {
      use base64::Engine as _;
      let calculated = base64::engine::general_purpose::STANDARD.encode(self.payload_md5.unwrap_or_default());
      if declared == calculated {
        self.notes.push(Note::new(notes::CMD5_CORRECT, "header-content-md5", Vars::new().set("calc_md5", &calculated)));
      } else {
        self.notes.push(Note::new(notes::CMD5_INCORRECT, "header-content-md5", Vars::new().set("calc_md5", &calculated)));
      }
    }
  }

  /// Decodes a chunk according to `Content-Encoding`, innermost coding
  /// first as the original reverses the list before iterating. Returns
  /// `None` once an unsupported coding or a decode error is hit; from then
  /// on the decoded sample is no longer trustworthy.
  fn process_content_codings(&mut self, chunk: &[u8]) -> Option<Vec<u8>> {
    if !self.decode_ok {
      return None;
    }
    let mut codings = self.content_codings();
    codings.reverse();
    let mut current = chunk.to_vec();
    for coding in codings {
      if !self.decode_ok {
        return None;
      }
      if coding != "gzip" && coding != "x-gzip" {
        // deflate and others aren't handled; punt on body processing
        // entirely rather than guess at partial decoding.
        self.decode_ok = false;
        return None;
      }
      if !self.gzip.in_body {
        self.gzip.header_buffer.extend_from_slice(&current);
        match read_gzip_header(&self.gzip.header_buffer) {
          Ok(Some(remainder)) => {
            current = remainder;
            self.gzip.in_body = true;
          }
          // Header not fully buffered yet: not a failure, just nothing to
          // inflate out of this chunk. Matches `decoded_sample_complete`'s
          // contract (false only once real bytes were dropped, never just
          // because the gzip header straddled a chunk boundary).
          Ok(None) => return Some(Vec::new()),
          Err(message) => {
            self.notes.push(Note::new(
              notes::BAD_GZIP,
              "header-content-encoding",
              Vars::new().set("gzip_error", message),
            ));
            self.decode_ok = false;
            return None;
          }
        }
      }
      match inflate(&mut self.gzip.decompressor, &current) {
        Ok(inflated) => current = inflated,
        Err(zlib_error) => {
          let sample = self
            .payload_sample
            .last()
            .map(|(offset, _)| *offset)
            .unwrap_or(0);
          self.notes.push(Note::new(
            notes::BAD_ZLIB,
            "header-content-encoding",
            Vars::new()
              .set("zlib_error", zlib_error)
              .set("offset", sample)
              .set("sample", String::from_utf8_lossy(&current[..current.len().min(20)])),
          ));
          self.decode_ok = false;
          return None;
        }
      }
    }
    self.md5_decoded.consume(&current);
    self.decoded_len += current.len() as u64;
    Some(current)
  }
}

/// Parses (and strips) a gzip member header per RFC 1952 §2.3. `Ok(None)`
/// means the header isn't fully buffered yet.
fn read_gzip_header(content: &[u8]) -> Result<Option<Vec<u8>>, String> {
  const FTEXT: u8 = 1;
  const FHCRC: u8 = 2;
  const FEXTRA: u8 = 4;
  const FNAME: u8 = 8;
  const FCOMMENT: u8 = 16;
  let _ = FTEXT;

  if content.len() < 10 {
    return Ok(None);
  }
  if content[0..2] != [0x1f, 0x8b] {
    return Err(format!("not a gzip header (magic is {:02x}{:02x}, should be 1f8b)", content[0], content[1]));
  }
  if content[2] != 8 {
    return Err("unknown compression method".to_string());
  }
  let flags = content[3];
  let mut rest = &content[10..];

  if flags & FEXTRA != 0 {
    if rest.len() < 2 {
      return Ok(None);
    }
    let xlen = u16::from_le_bytes([rest[0], rest[1]]) as usize;
    if rest.len() < 2 + xlen {
      return Ok(None);
    }
    rest = &rest[2 + xlen..];
  }
  if flags & FNAME != 0 {
    match rest.iter().position(|&b| b == 0) {
      Some(end) => rest = &rest[end + 1..],
      None => return Ok(None),
    }
  }
  if flags & FCOMMENT != 0 {
    match rest.iter().position(|&b| b == 0) {
      Some(end) => rest = &rest[end + 1..],
      None => return Ok(None),
    }
  }
  if flags & FHCRC != 0 {
    if rest.len() < 2 {
      return Ok(None);
    }
    rest = &rest[2..];
  }
  Ok(Some(rest.to_vec()))
}

fn inflate(decompressor: &mut flate2::Decompress, input: &[u8]) -> Result<Vec<u8>, String> {
  // `decompressor.total_in()`/`total_out()` are cumulative over its whole
  // lifetime, not just this call, since the same decompressor is reused
  // across chunks. Track how much of *this* chunk has been consumed
  // ourselves rather than reading the cumulative counter as an offset
  // into `input`.
  let before_in = decompressor.total_in();
  let mut consumed_from_chunk = 0usize;
  let mut output = vec![0u8; (input.len() * 4).max(4096)];
  let mut produced = 0;
  loop {
    let before_out = decompressor.total_out();
    let status = decompressor
      .decompress(&input[consumed_from_chunk..], &mut output[produced..], flate2::FlushDecompress::None)
      .map_err(|error| error.to_string())?;
    consumed_from_chunk = (decompressor.total_in() - before_in) as usize;
    produced = (decompressor.total_out() - before_out) as usize + produced;
    let consumed_all = consumed_from_chunk >= input.len();
    match status {
      flate2::Status::Ok if !consumed_all && produced == output.len() => {
        output.resize(output.len() * 2, 0);
      }
      _ => break,
    }
  }
  output.truncate(produced);
  Ok(output)
}

pub struct HttpRequest {
  pub message: HttpMessage,
  pub uri: Option<String>,
}

impl HttpRequest {
  pub fn new(method: &str) -> Self {
    let mut message = HttpMessage::new(true);
    message.method = Some(method.to_ascii_uppercase());
    Self { message, uri: None }
  }

  /// Converts an IRI to a URI (IDNA host, percent-encoded path/query/
  /// fragment), matching `HttpRequest.iri_to_uri`/`set_iri`.
  pub fn set_iri(&mut self, iri: &str) {
    let Ok(normalized) = iri_to_uri(iri) else {
      self.message.notes.push(Note::new(
        notes::URI_BAD_SYNTAX,
        "uri",
        Vars::new().set("uri", iri),
      ));
      return;
    };
    let mut normalized = normalized;
    if let Some(hash) = normalized.find('#') {
      normalized.truncate(hash);
    }
    if normalized.len() > MAX_URI {
      self.message.notes.push(Note::new(
        notes::URI_TOO_LONG,
        "uri",
        Vars::new().set("uri_len", normalized.len()),
      ));
    }
    self.uri = Some(normalized);
  }
}

fn iri_to_uri(iri: &str) -> Result<String, url::ParseError> {
  let url = url::Url::parse(iri)?;
  // `url::Url` already performs IDNA host normalisation and percent-encodes
  // path/query/fragment per RFC 3986; re-serializing is sufficient here
  // since we don't need to distinguish IRI-only pchar from URI pchar for
  // analysis purposes.
  Ok(url.to_string())
}

/// A body processor taking `(base_uri, link, tag, title)`, per
/// `process_link` in `original_source/redbot/resource/__init__.py`. This
/// is the hook contract a caller can use; the crate doesn't ship an
/// HTML tokenizer to drive it, only `links::extract_links`'s minimal
/// href-scanner and whatever the orchestrator or a test installs.
pub type LinkProcessor = Box<dyn FnMut(&str, &str, &str, &str) + Send + Sync>;

pub struct HttpResponse {
  pub message: HttpMessage,
  pub status_code: u16,
  pub status_phrase: String,
  pub is_head_response: bool,
  pub freshness_lifetime: Option<i64>,
  pub age: Option<i64>,
  pub store_shared: Option<bool>,
  pub store_private: Option<bool>,
  pub link_procs: Vec<LinkProcessor>,
}

impl HttpResponse {
  pub fn new(status_code: u16, base_uri: &str) -> Self {
    let mut message = HttpMessage::new(false);
    message.base_uri = base_uri.to_string();
    Self {
      message,
      status_code,
      status_phrase: String::new(),
      is_head_response: false,
      freshness_lifetime: None,
      age: None,
      store_shared: None,
      store_private: None,
      link_procs: Vec::new(),
    }
  }

  pub fn set_link_procs(&mut self, procs: Vec<LinkProcessor>) {
    self.link_procs = procs;
  }

  /// Runs every installed link processor over `links` (as produced by
  /// `links::extract_links` or a test's synthetic extractor).
  pub fn run_link_procs(&mut self, links: &[(String, String, String)]) {
    for (tag, href, title) in links {
      for proc in &mut self.link_procs {
        proc(&self.message.base_uri, href, tag, title);
      }
    }
  }

  pub fn feed_body(&mut self, chunk: &[u8]) {
    let is_206 = !self.is_head_response && self.status_code == 206;
    self.message.feed_body(chunk, is_206);
  }

  /// `skip_checks`: Content-Length/Content-MD5
  /// verification is meaningless for HEAD responses and `304`s.
  pub fn body_done(&mut self, complete: bool, trailers: Vec<(String, String)>, complete_time: i64) {
    let skip_checks = self.is_head_response || self.status_code == 304;
    self.message.body_done(complete, trailers, complete_time, skip_checks);
    if !self.link_procs.is_empty() {
      let html = String::from_utf8_lossy(&self.message.decoded_sample);
      let links = crate::links::extract_links(&html);
      self.run_link_procs(&links);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gzip_header_roundtrip() {
    use std::io::Write as _;
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(b"hello world").unwrap();
    let gzipped = encoder.finish().unwrap();

    let mut response = HttpResponse::new(200, "http://example.com/");
    response.message.headers.insert(
      "content-encoding".to_string(),
      header::Value::List(vec!["gzip".to_string()]),
    );
    response.feed_body(&gzipped);
    response.body_done(true, Vec::new(), 0);
    assert_eq!(response.message.decoded_sample, b"hello world");
    assert!(response.message.decode_ok);
  }

  #[test]
  fn content_length_mismatch_emits_note() {
    let mut response = HttpResponse::new(200, "http://example.com/");
    response
      .message
      .headers
      .insert("content-length".to_string(), header::Value::Int(5));
    response.feed_body(b"abc");
    response.body_done(true, Vec::new(), 0);
    assert!(response.message.notes.has_kind("CL_INCORRECT"));
  }

  #[test]
  fn set_iri_normalizes_and_flags_fragment() {
    let mut request = HttpRequest::new("GET");
    request.set_iri("http://example.com/a/b?x=1#frag");
    assert_eq!(request.uri.as_deref(), Some("http://example.com/a/b?x=1"));
  }
}
