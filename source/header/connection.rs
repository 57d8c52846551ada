//! `Connection` — names hop-by-hop headers and connection options (e.g.
//! `close`) that intermediaries must strip.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::Note;

fn syntax(value: &str) -> bool {
  super::is_token(value)
}

fn parse(_subject: &str, value: &str, _message: &HttpMessage, _notes: &mut Vec<Note>) -> Option<Value> {
  Some(Value::Token(value.trim().to_ascii_lowercase()))
}

fn join(subject: &str, values: &[Value], message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  super::join_list(subject, values, message, notes)
}

pub const MODULE: Module = Module {
  name: "connection",
  role: Role::Both,
  list_valued: true,
  deprecated: None,
  syntax: Some(syntax),
  parse,
  join,
};
