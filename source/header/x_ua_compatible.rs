//! `X-UA-Compatible` — sets Internet Explorer's rendering mode; each
//! occurrence names one target browser.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::{Note, Vars};
use crate::notes;

fn parse(subject: &str, value: &str, _message: &HttpMessage, notes: &mut Vec<Note>) -> Option<Value> {
  notes.push(Note::new(notes::UA_COMPATIBLE, subject, Vars::new()));
  let (attr, attr_value) = match value.split_once('=') {
    Some((attr, attr_value)) => (attr.trim().to_string(), Some(attr_value.trim().to_string())),
    None => (value.trim().to_string(), None),
  };
  Some(Value::Params(vec![(attr, attr_value)]))
}

fn join(subject: &str, values: &[Value], _message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  let mut seen = std::collections::HashSet::new();
  let mut merged = Vec::new();
  for value in values {
    let Some(params) = value.as_params() else { continue };
    for (attr, attr_value) in params {
      if !seen.insert(attr.clone()) {
        notes.push(Note::new(notes::UA_COMPATIBLE_REPEAT, subject, Vars::new()));
        continue;
      }
      merged.push((attr.clone(), attr_value.clone()));
    }
  }
  Value::Params(merged)
}

pub const MODULE: Module = Module {
  name: "x-ua-compatible",
  role: Role::ResponseOnly,
  list_valued: false,
  deprecated: None,
  syntax: None,
  parse,
  join,
};
