//! `Link` (RFC 8288) — list-valued; each element is a URI-reference
//! followed by `;`-delimited parameters. Top-level comma splitting is
//! handled generically by `split_string`, so this module only parses a
//! single element.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::Note;

#[derive(Clone, Debug, PartialEq)]
pub struct LinkValue {
  pub target: String,
  pub params: Vec<(String, Option<String>)>,
}

impl LinkValue {
  pub fn rel(&self) -> Option<&str> {
    self
      .params
      .iter()
      .find(|(key, _)| key == "rel")
      .and_then(|(_, value)| value.as_deref())
  }
}

peg::parser! {
  grammar link_element() for str {
    rule ws() = [' ' | '\t']*
    // target = "<" *(any char except ">") ">"
    rule target() -> &'input str
      = "<" t:$((!['>'] [_])*) ">"
      { t }
    rule token_char() -> char
      = c:['!'..='~' ] { c }
    rule param_name() -> &'input str
      = $((!['=' | ';' | ','] token_char())+)
    rule quoted() -> String
      = "\"" s:$((!['"'] [_])*) "\""
      { s.replace("\\\"", "\"") }
    rule bare() -> String
      = s:$((![';' | ','] [_])*)
      { s.trim().to_string() }
    rule param() -> (String, Option<String>)
      = ws() name:param_name() ws() "=" ws() value:(quoted() / bare())
      { (name.to_ascii_lowercase(), Some(value)) }
      / ws() name:param_name() ws()
      { (name.to_ascii_lowercase(), None) }
    pub rule element() -> (String, Vec<(String, Option<String>)>)
      = ws() t:target() ws() params:(";" p:param() { p })*
      { (t.to_string(), params) }
  }
}

fn parse(_subject: &str, value: &str, _message: &HttpMessage, _notes: &mut Vec<Note>) -> Option<Value> {
  let (target, params) = link_element::element(value.trim()).ok()?;
  // Represent a single parsed element as a one-element Links list; join()
  // concatenates them across occurrences.
  Some(Value::Links(vec![LinkValue { target, params }]))
}

fn join(_subject: &str, values: &[Value], _message: &HttpMessage, _notes: &mut Vec<Note>) -> Value {
  let mut all = Vec::new();
  for value in values {
    if let Value::Links(links) = value {
      all.extend(links.iter().cloned());
    }
  }
  Value::Links(all)
}

pub const MODULE: Module = Module {
  name: "link",
  role: Role::ResponseOnly,
  list_valued: true,
  deprecated: None,
  syntax: None,
  parse,
  join,
};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_target_and_params() {
    let (target, params) = link_element::element(r#"<https://example.com/next>; rel="next"; title="Next page""#).unwrap();
    assert_eq!(target, "https://example.com/next");
    assert_eq!(
      params,
      vec![
        ("rel".to_string(), Some("next".to_string())),
        ("title".to_string(), Some("Next page".to_string())),
      ]
    );
  }

  #[test]
  fn parses_bare_flag_param() {
    let (_target, params) = link_element::element(r#"</foo>; rel=preload; crossorigin"#).unwrap();
    assert_eq!(
      params,
      vec![
        ("rel".to_string(), Some("preload".to_string())),
        ("crossorigin".to_string(), None),
      ]
    );
  }
}
