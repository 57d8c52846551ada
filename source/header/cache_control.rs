//! `Cache-Control` — a list-valued header whose joined value is canonicalized
//! to an ordered (directive, value) mapping, per the resolution
//! of the source's tuple-list-vs-mapping ambiguity: duplicate detection runs
//! during `join`, before directives are folded into the ordered mapping.

use super::{Module, Role, Value};
use crate::message::HttpMessage;
use crate::note::{Note, Vars};
use crate::notes;

const KNOWN_DIRECTIVES: &[&str] = &[
  "max-age",
  "s-maxage",
  "public",
  "private",
  "no-cache",
  "no-store",
  "no-transform",
  "must-revalidate",
  "proxy-revalidate",
  "pre-check",
  "post-check",
];

fn parse(_subject: &str, value: &str, _message: &HttpMessage, _notes: &mut Vec<Note>) -> Option<Value> {
  let (key, directive_value) = match value.split_once('=') {
    Some((key, value)) => (key.trim().to_string(), Some(super::unquote_string(value))),
    None => (value.trim().to_string(), None),
  };
  Some(Value::Params(vec![(key, directive_value)]))
}

fn join(subject: &str, values: &[Value], _message: &HttpMessage, notes: &mut Vec<Note>) -> Value {
  let mut seen_lower = std::collections::HashSet::new();
  let mut ordered = Vec::new();
  for value in values {
    let Some(params) = value.as_params() else { continue };
    let (key, directive_value) = &params[0];
    let lowercased = key.to_ascii_lowercase();
    if KNOWN_DIRECTIVES.contains(&lowercased.as_str()) && key != &lowercased {
      notes.push(Note::new(
        notes::CC_MISCAP,
        subject,
        Vars::new().set("cc_directive", key),
      ));
    }
    let is_single_value_directive = matches!(
      lowercased.as_str(),
      "max-age" | "s-maxage" | "pre-check" | "post-check"
    );
    if is_single_value_directive && !seen_lower.insert(lowercased.clone()) {
      notes.push(Note::new(
        notes::CC_DUP,
        subject,
        Vars::new().set("cc_directive", &lowercased),
      ));
      continue;
    }
    seen_lower.insert(lowercased.clone());
    ordered.push((lowercased, directive_value.clone()));
  }
  Value::Params(
    ordered
      .into_iter()
      .map(|(key, value)| (key, value))
      .collect(),
  )
}

pub const MODULE: Module = Module {
  name: "cache-control",
  role: Role::Both,
  list_valued: true,
  deprecated: None,
  syntax: None,
  parse,
  join,
};

/// Looks up a directive's value (if it carries one) in a joined
/// `Cache-Control` mapping. `Some(None)` means the directive was present
/// without a value (e.g. `no-cache`); `None` means absent entirely.
pub fn directive<'a>(directives: &'a [(String, Option<String>)], name: &str) -> Option<Option<&'a str>> {
  directives
    .iter()
    .find(|(key, _)| key == name)
    .map(|(_, value)| value.as_deref())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dup_single_value_directive_keeps_first() {
    let mut notes = Vec::new();
    let values = vec![
      parse("", "max-age=10", &HttpMessage::test_stub(), &mut Vec::new()).unwrap(),
      parse("", "max-age=20", &HttpMessage::test_stub(), &mut Vec::new()).unwrap(),
    ];
    let joined = join("header-cache-control", &values, &HttpMessage::test_stub(), &mut notes);
    let directives = joined.as_params().unwrap();
    assert_eq!(directive(directives, "max-age"), Some(Some("10")));
    assert!(notes.iter().any(|n| n.kind.name == "CC_DUP"));
  }
}
