//! `Content-MD5` — base64 of the raw payload's MD5 digest, checked in
//! `HttpMessage::body_done`.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::Note;
use base64::Engine as _;

fn syntax(value: &str) -> bool {
  base64::engine::general_purpose::STANDARD.decode(value).is_ok()
}

fn parse(_subject: &str, value: &str, _message: &HttpMessage, _notes: &mut Vec<Note>) -> Option<Value> {
  Some(Value::Text(value.trim().to_string()))
}

fn join(subject: &str, values: &[Value], message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  super::join_single_last(subject, values, message, notes)
}

pub const MODULE: Module = Module {
  name: "content-md5",
  role: Role::ResponseOnly,
  list_valued: false,
  deprecated: None,
  syntax: Some(syntax),
  parse,
  join,
};
