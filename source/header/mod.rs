//! The header registry: one module per known field name, plus the gates
//! (role, deprecation, syntax, single-value) that `process_headers` applies
//! to every one of them generically.

use crate::message::HttpMessage;
use crate::note::{Note, Vars};
use crate::notes;
use once_cell::sync::Lazy;
use std::collections::HashMap;

mod age;
mod cache_control;
mod connection;
mod content_disposition;
mod content_encoding;
mod content_language;
mod content_length;
mod content_location;
mod content_md5;
mod content_range;
mod content_transfer_encoding;
mod content_type;
mod date;
mod etag;
mod expires;
mod last_modified;
mod link;
mod location;
mod proxy_authenticate;
mod retry_after;
mod server;
mod set_cookie2;
mod transfer_encoding;
mod upgrade;
mod vary;
mod via;
mod warning;
mod www_authenticate;
mod x_ua_compatible;

pub mod params;

/// Which message(s) a header is valid in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
  RequestOnly,
  ResponseOnly,
  Both,
  ResponseOrPut,
}

/// A single parsed occurrence of a header, or the result of joining all
/// occurrences together. Generalizes the per-header Python return types
/// into one enum so the registry can stay a flat table of function
/// pointers instead of one trait object per header.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
  Text(String),
  Token(String),
  Int(i64),
  Date(i64),
  List(Vec<String>),
  ETag { weak: bool, tag: String },
  Params(Vec<(String, Option<String>)>),
  ContentRange {
    first: Option<u64>,
    last: Option<u64>,
    complete: Option<u64>,
  },
  Links(Vec<link::LinkValue>),
}

impl Value {
  pub fn as_text(&self) -> Option<&str> {
    match self {
      Value::Text(s) | Value::Token(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      Value::Int(n) => Some(*n),
      _ => None,
    }
  }

  pub fn as_date(&self) -> Option<i64> {
    match self {
      Value::Date(n) => Some(*n),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<&[String]> {
    match self {
      Value::List(list) => Some(list),
      _ => None,
    }
  }

  pub fn as_etag(&self) -> Option<(bool, &str)> {
    match self {
      Value::ETag { weak, tag } => Some((*weak, tag)),
      _ => None,
    }
  }

  pub fn as_params(&self) -> Option<&[(String, Option<String>)]> {
    match self {
      Value::Params(params) => Some(params),
      _ => None,
    }
  }
}

type ParseFn = fn(subject: &str, value: &str, message: &HttpMessage, notes: &mut Vec<Note>) -> Option<Value>;
type JoinFn = fn(subject: &str, values: &[Value], message: &HttpMessage, notes: &mut Vec<Note>) -> Value;

pub struct Module {
  pub name: &'static str,
  pub role: Role,
  pub list_valued: bool,
  pub deprecated: Option<&'static str>,
  pub syntax: Option<fn(&str) -> bool>,
  pub parse: ParseFn,
  pub join: JoinFn,
}

/// The default behaviour for a header with no special joining rule: keep
/// every syntactically-valid occurrence's text, applying the single-value
/// gate for non-list headers.
fn parse_text(_subject: &str, value: &str, _message: &HttpMessage, _notes: &mut Vec<Note>) -> Option<Value> {
  Some(Value::Text(value.trim().to_string()))
}

fn join_single_last(subject: &str, values: &[Value], _message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  if values.len() > 1 {
    notes.push(Note::new(
      notes::SINGLE_HEADER_REPEAT,
      subject,
      Vars::new(),
    ));
  }
  values
    .last()
    .cloned()
    .unwrap_or_else(|| Value::Text(String::new()))
}

fn join_list(_subject: &str, values: &[Value], _message: &HttpMessage, _notes: &mut Vec<Note>) -> Value {
  Value::List(
    values
      .iter()
      .filter_map(Value::as_text)
      .map(str::to_string)
      .collect(),
  )
}

macro_rules! registry {
  ($($module:expr),+ $(,)?) => {
    static REGISTRY: Lazy<HashMap<&'static str, Module>> = Lazy::new(|| {
      let mut map = HashMap::new();
      $(
        let module = $module;
        map.insert(module.name, module);
      )+
      map
    });
  };
}

registry![
  age::MODULE,
  cache_control::MODULE,
  connection::MODULE,
  content_disposition::MODULE,
  content_encoding::MODULE,
  content_language::MODULE,
  content_length::MODULE,
  content_location::MODULE,
  content_md5::MODULE,
  content_range::MODULE,
  content_transfer_encoding::MODULE,
  content_type::MODULE,
  date::MODULE,
  etag::MODULE,
  expires::MODULE,
  last_modified::MODULE,
  link::MODULE,
  location::MODULE,
  proxy_authenticate::MODULE,
  retry_after::MODULE,
  server::MODULE,
  set_cookie2::MODULE,
  transfer_encoding::MODULE,
  upgrade::MODULE,
  vary::MODULE,
  via::MODULE,
  warning::MODULE,
  www_authenticate::MODULE,
  x_ua_compatible::MODULE,
];

pub fn lookup(name: &str) -> Option<&'static Module> {
  REGISTRY.get(name)
}

/// Splits a list-valued header's raw value on commas that fall outside
/// quoted strings, per the generic HTTP list-header syntax (RFC 7230
/// §7). `foo, "a,b", bar` yields `["foo", "\"a,b\"", "bar"]`.
pub fn split_string(value: &str) -> Vec<String> {
  let mut parts = Vec::new();
  let mut current = String::new();
  let mut in_quotes = false;
  let mut escaped = false;
  for ch in value.chars() {
    if escaped {
      current.push(ch);
      escaped = false;
      continue;
    }
    match ch {
      '\\' if in_quotes => {
        current.push(ch);
        escaped = true;
      }
      '"' => {
        in_quotes = !in_quotes;
        current.push(ch);
      }
      ',' if !in_quotes => {
        parts.push(current.trim().to_string());
        current = String::new();
      }
      _ => current.push(ch),
    }
  }
  parts.push(current.trim().to_string());
  parts.into_iter().filter(|part| !part.is_empty()).collect()
}

pub fn unquote_string(value: &str) -> String {
  let trimmed = value.trim();
  if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
    trimmed[1..trimmed.len() - 1].replace("\\\"", "\"")
  } else {
    trimmed.to_string()
  }
}

pub fn is_token(value: &str) -> bool {
  !value.is_empty() && value.bytes().all(is_token_byte)
}

pub fn is_token_byte(byte: u8) -> bool {
  matches!(byte, 0x21..=0x7e)
    && !matches!(
      byte,
      b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\' | b'"' | b'/' | b'[' | b']' | b'?' | b'=' | b'{' | b'}'
    )
}

/// Parses a UNIX timestamp out of an HTTP-date, accepting the three RFC
/// 7231 formats plus the two-digit-year workaround (< 69 ⇒ +2000, else
/// +1900).
pub fn parse_date(value: &str) -> Option<i64> {
  let value = value.trim();

  if let Some((_day_name, rest)) = value.split_once(',') {
    // Either IMF-fixdate ("06 Nov 1994 08:49:37 GMT") or rfc850-date
    // ("06-Nov-94 08:49:37 GMT"); they differ in date-field separator
    // (space vs dash) and year width.
    let rest = rest.trim().strip_suffix("GMT").unwrap_or(rest.trim()).trim();
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let (day, month, year, time_field) = match tokens.as_slice() {
      [day, month, year, time] => (day.parse().ok()?, month_number(month)?, year.parse().ok()?, *time),
      [date_field, time] => {
        let mut parts = date_field.split('-');
        let day: u32 = parts.next()?.parse().ok()?;
        let month = month_number(parts.next()?)?;
        let mut year: i32 = parts.next()?.parse().ok()?;
        if year < 100 {
          year += if year < 69 { 2000 } else { 1900 };
        }
        (day, month, year, *time)
      }
      _ => return None,
    };
    let (hour, minute, second) = parse_time(time_field)?;
    return ymd_hms_to_unix(year, month, day, hour, minute, second);
  }

  // asctime-date: "Sun Nov  6 08:49:37 1994"
  let mut fields = value.split_whitespace();
  let _day_name = fields.next()?;
  let month = month_number(fields.next()?)?;
  let day: u32 = fields.next()?.parse().ok()?;
  let time_field = fields.next()?;
  let year: i32 = fields.next()?.parse().ok()?;
  let (hour, minute, second) = parse_time(time_field)?;
  ymd_hms_to_unix(year, month, day, hour, minute, second)
}

fn parse_time(value: &str) -> Option<(u32, u32, u32)> {
  let mut parts = value.split(':');
  let hour: u32 = parts.next()?.parse().ok()?;
  let minute: u32 = parts.next()?.parse().ok()?;
  let second: u32 = parts.next()?.parse().ok()?;
  Some((hour, minute, second))
}

fn month_number(name: &str) -> Option<u32> {
  Some(match name {
    "Jan" => 1,
    "Feb" => 2,
    "Mar" => 3,
    "Apr" => 4,
    "May" => 5,
    "Jun" => 6,
    "Jul" => 7,
    "Aug" => 8,
    "Sep" => 9,
    "Oct" => 10,
    "Nov" => 11,
    "Dec" => 12,
    _ => return None,
  })
}

/// Days-from-civil-date algorithm (Howard Hinnant's `days_from_civil`),
/// avoiding a dependency on a calendar library for one conversion.
fn ymd_hms_to_unix(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Option<i64> {
  if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
    return None;
  }
  let y = if month <= 2 { year as i64 - 1 } else { year as i64 };
  let era = if y >= 0 { y } else { y - 399 } / 400;
  let yoe = (y - era * 400) as i64; // [0, 399]
  let mp = (month as i64 + 9) % 12; // [0, 11]
  let doy = (153 * mp + 2) / 5 + day as i64 - 1; // [0, 365]
  let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // [0, 146096]
  let days = era * 146097 + doe - 719468; // days since 1970-01-01
  Some(days * 86400 + hour as i64 * 3600 + minute as i64 * 60 + second as i64)
}

/// Inverse of `ymd_hms_to_unix` (Howard Hinnant's `civil_from_days`),
/// needed to render an `If-Modified-Since` probe header from a parsed
/// Last-Modified timestamp.
fn civil_from_days(days: i64) -> (i32, u32, u32) {
  let z = days + 719468;
  let era = if z >= 0 { z } else { z - 146096 } / 146097;
  let doe = (z - era * 146097) as i64; // [0, 146096]
  let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // [0, 399]
  let y = yoe + era * 400;
  let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
  let mp = (5 * doy + 2) / 153; // [0, 11]
  let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
  let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
  let year = (if month <= 2 { y + 1 } else { y }) as i32;
  (year, month, day)
}

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTH_NAMES: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// Renders a Unix timestamp as an IMF-fixdate, the only HTTP-date form
/// this crate emits (RFC 7231 §7.1.1.1 prefers it for generated headers).
pub fn format_http_date(unix: i64) -> String {
  let days = unix.div_euclid(86400);
  let seconds_of_day = unix.rem_euclid(86400);
  let (year, month, day) = civil_from_days(days);
  let weekday = WEEKDAY_NAMES[((days.rem_euclid(7)) + 4).rem_euclid(7) as usize];
  let hour = seconds_of_day / 3600;
  let minute = (seconds_of_day % 3600) / 60;
  let second = seconds_of_day % 60;
  format!(
    "{weekday}, {day:02} {month} {year:04} {hour:02}:{minute:02}:{second:02} GMT",
    month = MONTH_NAMES[(month - 1) as usize]
  )
}

/// Parses the `charset'language'value` form of an RFC 5987 extended
/// parameter value, returning the percent-decoded value when the charset
/// is `utf-8`.
pub fn parse_star_value(raw: &str, notes: &mut Vec<Note>, subject: &str, param: &str) -> Option<String> {
  let mut parts = raw.splitn(3, '\'');
  let (Some(charset), Some(_language), Some(value)) = (parts.next(), parts.next(), parts.next()) else {
    notes.push(Note::new(
      notes::PARAM_STAR_ERROR,
      subject,
      Vars::new().set("param", param),
    ));
    return None;
  };
  if charset.is_empty() {
    notes.push(Note::new(
      notes::PARAM_STAR_NOCHARSET,
      subject,
      Vars::new().set("param", param),
    ));
    return None;
  }
  if !charset.eq_ignore_ascii_case("utf-8") {
    notes.push(Note::new(
      notes::PARAM_STAR_CHARSET,
      subject,
      Vars::new().set("param", param).set("charset", charset),
    ));
    return None;
  }
  match percent_encoding::percent_decode_str(value).decode_utf8() {
    Ok(decoded) => Some(decoded.into_owned()),
    Err(_) => {
      notes.push(Note::new(
        notes::PARAM_STAR_BAD,
        subject,
        Vars::new().set("param", param),
      ));
      None
    }
  }
}

/// Splits a `;`-delimited parameter list (as used by `Content-Type`,
/// `Content-Disposition`, `Cache-Control`) into an ordered (key, value)
/// sequence, handling RFC 5987 `key*` extended parameters and emitting
/// the associated notes on malformed input.
pub fn parse_params(subject: &str, value: &str, notes: &mut Vec<Note>) -> Vec<(String, Option<String>)> {
  let mut result = Vec::new();
  let mut seen = std::collections::HashSet::new();
  for segment in split_respecting_quotes(value, ';').into_iter().skip(1) {
    let segment = segment.trim();
    if segment.is_empty() {
      continue;
    }
    let (raw_key, raw_value) = match segment.split_once('=') {
      Some((key, value)) => (key.trim(), Some(value.trim())),
      None => (segment, None),
    };
    let key_lower = raw_key.to_ascii_lowercase();
    if !seen.insert(key_lower.clone()) {
      notes.push(Note::new(
        notes::PARAM_REPEATS,
        subject,
        Vars::new().set("param", &key_lower),
      ));
      continue;
    }
    if let Some(base) = key_lower.strip_suffix('*') {
      let Some(raw_value) = raw_value else { continue };
      if raw_value.starts_with('"') {
        notes.push(Note::new(
          notes::PARAM_STAR_QUOTED,
          subject,
          Vars::new().set("param", base),
        ));
        continue;
      }
      match parse_star_value(raw_value, notes, subject, base) {
        Some(decoded) => result.push((base.to_string(), Some(decoded))),
        None => continue,
      }
      continue;
    }
    let value = raw_value.map(|v| {
      if v.starts_with('\'') && v.ends_with('\'') && v.len() >= 2 {
        notes.push(Note::new(
          notes::PARAM_SINGLE_QUOTED,
          subject,
          Vars::new().set("param", &key_lower),
        ));
      }
      unquote_string(v)
    });
    result.push((key_lower, value));
  }
  result
}

fn split_respecting_quotes(value: &str, delimiter: char) -> Vec<String> {
  let mut parts = Vec::new();
  let mut current = String::new();
  let mut in_quotes = false;
  for ch in value.chars() {
    match ch {
      '"' => {
        in_quotes = !in_quotes;
        current.push(ch);
      }
      ch if ch == delimiter && !in_quotes => {
        parts.push(std::mem::take(&mut current));
      }
      _ => current.push(ch),
    }
  }
  parts.push(current);
  parts
}

/// Invoked after all headers have been absorbed by a message. Applies the
/// role, deprecation, syntax and single-value gates, then joins parsed
/// values per lowercased header name. Returns the joined, parsed headers.
pub fn process_headers(
  message: &HttpMessage,
  raw_headers: &[(String, String)],
  is_request: bool,
) -> (HashMap<String, Value>, Vec<Note>) {
  let mut notes = Vec::new();
  let mut header_block_len = 0usize;
  let mut by_name: HashMap<String, Vec<Value>> = HashMap::new();

  for (offset, (name, value)) in raw_headers.iter().enumerate() {
    let subject = format!("offset-{}", offset + 1);
    header_block_len += name.len() + value.len() + 4;
    if name.len() + value.len() + 4 > 4096 {
      notes.push(Note::new(
        notes::HEADER_TOO_LARGE,
        &subject,
        Vars::new().set("header_length", name.len() + value.len() + 4),
      ));
    }
    // The transport layer already decodes every status/header line as
    // ISO-8859-1 rather than failing outright on non-ASCII bytes (see
    // `transport::read_latin1_line`); what's left here is deciding
    // whether that fallback actually kicked in, and flagging it.
    if !name.is_ascii() {
      notes.push(Note::new(notes::HEADER_NAME_ENCODING, &subject, Vars::new().set("field_name", name)));
    }
    if !value.is_ascii() {
      notes.push(Note::new(notes::HEADER_VALUE_ENCODING, &subject, Vars::new().set("field_name", name)));
    }
    if !is_token(name) {
      notes.push(Note::new(
        notes::FIELD_NAME_BAD_SYNTAX,
        &subject,
        Vars::new().set("field_name", name),
      ));
      continue;
    }
    let lowercased = name.to_ascii_lowercase();
    let Some(module) = lookup(&lowercased) else {
      continue;
    };

    let role_ok = match module.role {
      Role::RequestOnly => is_request,
      Role::ResponseOnly => !is_request,
      Role::Both => true,
      Role::ResponseOrPut => !is_request || message.method.as_deref() == Some("PUT"),
    };
    if !role_ok {
      notes.push(Note::new(
        if is_request {
          notes::RESPONSE_HDR_IN_REQUEST
        } else {
          notes::REQUEST_HDR_IN_RESPONSE
        },
        &subject,
        Vars::new().set("field_name", name),
      ));
      continue;
    }
    if let Some(reference) = module.deprecated {
      notes.push(Note::new(
        notes::HEADER_DEPRECATED,
        &subject,
        Vars::new()
          .set("field_name", name)
          .set("deprecation_reference", reference),
      ));
    }

    let occurrences: Vec<String> = if module.list_valued {
      split_string(value)
    } else {
      vec![value.clone()]
    };

    for occurrence in occurrences {
      if let Some(syntax) = module.syntax {
        if !syntax(occurrence.trim()) {
          notes.push(Note::new(
            notes::BAD_SYNTAX,
            &subject,
            Vars::new().set("field_name", name).set("value", &occurrence),
          ));
          continue;
        }
      }
      if let Some(parsed) = (module.parse)(&subject, &occurrence, message, &mut notes) {
        by_name.entry(lowercased.clone()).or_default().push(parsed);
      }
    }
  }

  let mut joined = HashMap::new();
  for (name, values) in by_name {
    if let Some(module) = lookup(&name) {
      let subject = format!("header-{name}");
      let value = (module.join)(&subject, &values, message, &mut notes);
      joined.insert(name, value);
    }
  }

  if header_block_len > 8000 {
    notes.push(Note::new(
      notes::HEADER_BLOCK_TOO_LARGE,
      "offset-0",
      Vars::new().set("header_length", header_block_len),
    ));
  }

  (joined, notes)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn split_string_respects_quotes() {
    assert_eq!(
      split_string(r#"foo, "a,b", bar"#),
      vec!["foo".to_string(), "\"a,b\"".to_string(), "bar".to_string()]
    );
  }

  #[test]
  fn format_http_date_matches_imf_fixdate() {
    assert_eq!(format_http_date(784111777), "Sun, 06 Nov 1994 08:49:37 GMT");
  }

  #[test]
  fn format_then_parse_date_roundtrips() {
    let unix = 1_700_000_000;
    assert_eq!(parse_date(&format_http_date(unix)), Some(unix));
  }

  #[test]
  fn parse_date_imf_fixdate() {
    assert_eq!(
      parse_date("Sun, 06 Nov 1994 08:49:37 GMT"),
      Some(784111777)
    );
  }

  #[test]
  fn parse_date_rfc850_two_digit_year() {
    assert_eq!(
      parse_date("Sunday, 06-Nov-94 08:49:37 GMT"),
      Some(784111777)
    );
  }

  #[test]
  fn parse_date_asctime() {
    assert_eq!(parse_date("Sun Nov  6 08:49:37 1994"), Some(784111777));
  }

  #[test]
  fn parse_params_star_value() {
    let mut notes = Vec::new();
    let params = parse_params(
      "header-content-disposition",
      "attachment; filename*=utf-8''%e2%82%ac%20rates",
      &mut notes,
    );
    assert_eq!(
      params,
      vec![("filename".to_string(), Some("€ rates".to_string()))]
    );
    assert!(notes.is_empty());
  }

  #[test]
  fn non_ascii_header_value_is_flagged_but_still_processed() {
    let message = HttpMessage::test_stub();
    let (parsed, notes) = process_headers(&message, &[("Server".to_string(), "caf\u{e9}".to_string())], false);
    assert!(notes.iter().any(|note| note.kind.name == "HEADER_VALUE_ENCODING"));
    assert_eq!(parsed.get("server").and_then(Value::as_text), Some("caf\u{e9}"));
  }
}
