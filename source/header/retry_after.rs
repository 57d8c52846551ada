//! `Retry-After` — either delta-seconds or an HTTP-date, both normalised
//! to a unix timestamp isn't possible for delta-seconds alone (no
//! reference clock here), so delta-seconds are kept as `Value::Int` and
//! an HTTP-date as `Value::Date`.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::{Note, Vars};
use crate::notes;

fn parse(subject: &str, value: &str, _message: &HttpMessage, notes: &mut Vec<Note>) -> Option<Value> {
  let trimmed = value.trim();
  if trimmed.bytes().all(|b| b.is_ascii_digit()) && !trimmed.is_empty() {
    return trimmed.parse().ok().map(Value::Int);
  }
  match super::parse_date(trimmed) {
    Some(timestamp) => Some(Value::Date(timestamp)),
    None => {
      notes.push(Note::new(
        notes::BAD_DATE_SYNTAX,
        subject,
        Vars::new().set("field_name", "Retry-After").set("value", trimmed),
      ));
      None
    }
  }
}

fn join(subject: &str, values: &[Value], message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  super::join_single_last(subject, values, message, notes)
}

pub const MODULE: Module = Module {
  name: "retry-after",
  role: Role::ResponseOnly,
  list_valued: false,
  deprecated: None,
  syntax: None,
  parse,
  join,
};
