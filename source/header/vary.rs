//! `Vary` — list-valued response header naming the request headers a cache
//! must key on. Most of the semantics (asterisk, axis count, user-agent,
//! host) live in the cache evaluator; this module only parses and joins.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::Note;

fn parse(_subject: &str, value: &str, _message: &HttpMessage, _notes: &mut Vec<Note>) -> Option<Value> {
  Some(Value::Token(value.trim().to_ascii_lowercase()))
}

fn join(subject: &str, values: &[Value], message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  super::join_list(subject, values, message, notes)
}

pub const MODULE: Module = Module {
  name: "vary",
  role: Role::ResponseOnly,
  list_valued: true,
  deprecated: None,
  syntax: None,
  parse,
  join,
};
