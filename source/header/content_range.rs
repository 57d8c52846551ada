//! Grounded on `redbot/message/headers/content_range.py`:
//! `bytes first-last/complete` or `bytes */complete`.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::Note;
use once_cell::sync::Lazy;
use regex::Regex;

static SYNTAX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^bytes (?:(\d+)-(\d+)|\*)/(?:(\d+)|\*)$").unwrap());

fn syntax(value: &str) -> bool {
  SYNTAX.is_match(value)
}

fn parse(_subject: &str, value: &str, _message: &HttpMessage, _notes: &mut Vec<Note>) -> Option<Value> {
  let captures = SYNTAX.captures(value)?;
  let first = captures.get(1).and_then(|m| m.as_str().parse().ok());
  let last = captures.get(2).and_then(|m| m.as_str().parse().ok());
  let complete = captures.get(3).and_then(|m| m.as_str().parse().ok());
  Some(Value::ContentRange { first, last, complete })
}

fn join(subject: &str, values: &[Value], message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  super::join_single_last(subject, values, message, notes)
}

pub const MODULE: Module = Module {
  name: "content-range",
  role: Role::ResponseOnly,
  list_valued: false,
  deprecated: None,
  syntax: Some(syntax),
  parse,
  join,
};
