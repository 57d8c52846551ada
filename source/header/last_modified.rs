//! Grounded on `redbot/message/headers/last_modified.py`.

use super::{parse_date, Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::{Note, Vars};
use crate::notes;

fn parse(subject: &str, value: &str, _message: &HttpMessage, notes: &mut Vec<Note>) -> Option<Value> {
  match parse_date(value) {
    Some(timestamp) => Some(Value::Date(timestamp)),
    None => {
      notes.push(Note::new(
        notes::BAD_DATE_SYNTAX,
        subject,
        Vars::new().set("field_name", "Last-Modified").set("value", value),
      ));
      None
    }
  }
}

fn join(subject: &str, values: &[Value], message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  super::join_single_last(subject, values, message, notes)
}

pub const MODULE: Module = Module {
  name: "last-modified",
  role: Role::ResponseOnly,
  list_valued: false,
  deprecated: None,
  syntax: None,
  parse,
  join,
};
