//! `Content-Disposition` — disposition type plus parameters (`filename`,
//! `filename*`); shares the generic parameter parser with `Content-Type`.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::Note;

fn parse(subject: &str, value: &str, _message: &HttpMessage, notes: &mut Vec<Note>) -> Option<Value> {
  let disposition = value
    .split_once(';')
    .map_or(value, |(disposition, _)| disposition)
    .trim()
    .to_ascii_lowercase();
  let mut params = super::parse_params(subject, value, notes);
  params.insert(0, ("$disposition".to_string(), Some(disposition)));
  Some(Value::Params(params))
}

fn join(subject: &str, values: &[Value], message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  super::join_single_last(subject, values, message, notes)
}

pub const MODULE: Module = Module {
  name: "content-disposition",
  role: Role::ResponseOnly,
  list_valued: false,
  deprecated: None,
  syntax: None,
  parse,
  join,
};

pub fn filename(joined: &Value) -> Option<String> {
  let params = joined.as_params()?;
  params
    .iter()
    .find(|(key, _)| key == "filename")
    .and_then(|(_, value)| value.clone())
}
