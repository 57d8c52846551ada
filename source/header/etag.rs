//! `ETag` — response-only, optionally weak, quoted opaque tag. Central to
//! the ETag-validation active check.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::Note;
use once_cell::sync::Lazy;
use regex::Regex;

static SYNTAX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^(?:W/)?"[^"]*"$"#).unwrap());

fn syntax(value: &str) -> bool {
  SYNTAX.is_match(value)
}

fn parse(_subject: &str, value: &str, _message: &HttpMessage, _notes: &mut Vec<Note>) -> Option<Value> {
  let weak = value.starts_with("W/");
  let quoted = value.strip_prefix("W/").unwrap_or(value);
  let tag = quoted.trim_matches('"').to_string();
  Some(Value::ETag { weak, tag })
}

fn join(subject: &str, values: &[Value], message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  super::join_single_last(subject, values, message, notes)
}

pub const MODULE: Module = Module {
  name: "etag",
  role: Role::ResponseOnly,
  list_valued: false,
  deprecated: None,
  syntax: Some(syntax),
  parse,
  join,
};

/// Renders an ETag value back to wire form, as used when building
/// `If-None-Match` for the validation probe.
pub fn render(weak: bool, tag: &str) -> String {
  format!("{}\"{}\"", if weak { "W/" } else { "" }, tag)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn weak_and_strong_syntax() {
    assert!(syntax(r#""abc""#));
    assert!(syntax(r#"W/"abc""#));
    assert!(!syntax("abc"));
  }

  #[test]
  fn render_roundtrip() {
    assert_eq!(render(true, "abc"), "W/\"abc\"");
    assert_eq!(render(false, "abc"), "\"abc\"");
  }
}
