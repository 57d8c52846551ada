//! `Set-Cookie2` — deprecated by RFC 6265 in favour of `Set-Cookie`; kept
//! verbatim, solely to flag the deprecation.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::Note;

fn parse(_subject: &str, value: &str, _message: &HttpMessage, _notes: &mut Vec<Note>) -> Option<Value> {
  Some(Value::Text(value.trim().to_string()))
}

fn join(subject: &str, values: &[Value], message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  super::join_single_last(subject, values, message, notes)
}

pub const MODULE: Module = Module {
  name: "set-cookie2",
  role: Role::ResponseOnly,
  list_valued: false,
  deprecated: Some("RFC 6265 section-9.4"),
  syntax: None,
  parse,
  join,
};
