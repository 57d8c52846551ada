//! `Content-Language` — a list of language tags describing the intended
//! audience.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::Note;

fn syntax(value: &str) -> bool {
  !value.is_empty() && value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

fn parse(_subject: &str, value: &str, _message: &HttpMessage, _notes: &mut Vec<Note>) -> Option<Value> {
  Some(Value::Token(value.trim().to_ascii_lowercase()))
}

fn join(subject: &str, values: &[Value], message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  super::join_list(subject, values, message, notes)
}

pub const MODULE: Module = Module {
  name: "content-language",
  role: Role::Both,
  list_valued: true,
  deprecated: None,
  syntax: Some(syntax),
  parse,
  join,
};
