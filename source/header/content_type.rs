//! `Content-Type` — media type plus parameters; `charset` drives
//! `HttpMessage::character_encoding`.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::Note;

fn parse(subject: &str, value: &str, _message: &HttpMessage, notes: &mut Vec<Note>) -> Option<Value> {
  let media_type = value
    .split_once(';')
    .map_or(value, |(media_type, _)| media_type)
    .trim()
    .to_ascii_lowercase();
  let mut params = super::parse_params(subject, value, notes);
  params.insert(0, ("$type".to_string(), Some(media_type)));
  Some(Value::Params(params))
}

fn join(subject: &str, values: &[Value], message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  super::join_single_last(subject, values, message, notes)
}

pub const MODULE: Module = Module {
  name: "content-type",
  role: Role::ResponseOrPut,
  list_valued: false,
  deprecated: None,
  syntax: None,
  parse,
  join,
};

pub fn charset(joined: &Value) -> Option<String> {
  let params = joined.as_params()?;
  params
    .iter()
    .find(|(key, _)| key == "charset")
    .and_then(|(_, value)| value.clone())
}
