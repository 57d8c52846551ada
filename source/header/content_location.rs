//! `Content-Location` — a URI for the specific representation returned,
//! resolved against the message's base URI like `Location`.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::{Note, Vars};
use crate::notes;

fn parse(subject: &str, value: &str, message: &HttpMessage, notes: &mut Vec<Note>) -> Option<Value> {
  let base = url::Url::parse(&message.base_uri).ok()?;
  match base.join(value.trim()) {
    Ok(resolved) => Some(Value::Text(resolved.to_string())),
    Err(_) => {
      notes.push(Note::new(
        notes::URI_BAD_SYNTAX,
        subject,
        Vars::new().set("uri", value),
      ));
      None
    }
  }
}

fn join(subject: &str, values: &[Value], message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  super::join_single_last(subject, values, message, notes)
}

pub const MODULE: Module = Module {
  name: "content-location",
  role: Role::ResponseOnly,
  list_valued: false,
  deprecated: None,
  syntax: None,
  parse,
  join,
};
