//! `Via` — one entry per intermediary the message passed through.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::Note;

fn parse(_subject: &str, value: &str, _message: &HttpMessage, _notes: &mut Vec<Note>) -> Option<Value> {
  Some(Value::Text(value.trim().to_string()))
}

fn join(subject: &str, values: &[Value], message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  super::join_list(subject, values, message, notes)
}

pub const MODULE: Module = Module {
  name: "via",
  role: Role::Both,
  list_valued: true,
  deprecated: None,
  syntax: None,
  parse,
  join,
};
