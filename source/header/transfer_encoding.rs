//! `Transfer-Encoding` — list-valued, names the wire-framing codings
//! applied by the transport (chunked, etc); distinct from
//! `Content-Encoding`, which this crate's message layer decodes itself.

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
  name: "transfer-encoding",
  role: Role::Both,
  list_valued: true,
  deprecated: None,
  syntax: Some(syntax),
  parse,
  join,
};
