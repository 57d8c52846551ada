//! Grounded on `redbot/message/headers/content_length.py`: a single
//! non-negative integer byte count, checked against the observed
//! `payload_len` in `HttpMessage::body_done`.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::Note;

fn syntax(value: &str) -> bool {
  !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn parse(_subject: &str, value: &str, _message: &HttpMessage, _notes: &mut Vec<Note>) -> Option<Value> {
  value.parse::<i64>().ok().map(Value::Int)
}

fn join(subject: &str, values: &[Value], message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  super::join_single_last(subject, values, message, notes)
}

pub const MODULE: Module = Module {
  name: "content-length",
  role: Role::ResponseOrPut,
  list_valued: false,
  deprecated: None,
  syntax: Some(syntax),
  parse,
  join,
};
