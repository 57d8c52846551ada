//! Categorized, leveled diagnostics emitted while analysing an HTTP exchange.
//!
//! Notes are never raised as errors: a bad `Content-Length` or a missing
//! `Vary` axis is exactly as "successful" a result as a clean response. See
//! `notes::catalog` for the fixed table of kinds.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
  General,
  Security,
  Connection,
  ContentNegotiation,
  Caching,
  Validation,
  Range,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
  Good,
  Warn,
  Bad,
  Info,
}

/// A fixed, enumerated diagnostic kind: category, level and the two render
/// templates. `%(name)s`-style placeholders are substituted by `summary`/
/// `text` below.
#[derive(Copy, Clone, Debug)]
pub struct Kind {
  pub name: &'static str,
  pub category: Category,
  pub level: Level,
  pub summary_template: &'static str,
  pub text_template: &'static str,
}

/// A bag of named values substituted into a `Kind`'s templates. Values are
/// rendered with `Display` and, for `text()`, HTML-escaped first.
#[derive(Clone, Debug, Default)]
pub struct Vars(BTreeMap<String, String>);

impl Vars {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(mut self, key: &str, value: impl fmt::Display) -> Self {
    self.0.insert(key.to_string(), value.to_string());
    self
  }

  pub fn merge(mut self, other: &Vars) -> Self {
    for (key, value) in &other.0 {
      self.0.entry(key.clone()).or_insert_with(|| value.clone());
    }
    self
  }

  fn get(&self, key: &str) -> &str {
    self.0.get(key).map(String::as_str).unwrap_or("")
  }
}

fn substitute(template: &str, vars: &Vars, escape: bool) -> String {
  // `%(name)s` placeholders, as in the original's `%`-style templates.
  let mut out = String::with_capacity(template.len());
  let bytes = template.as_bytes();
  let mut i = 0;
  while i < bytes.len() {
    if bytes[i] == b'%' && template[i..].starts_with("%(") {
      if let Some(end) = template[i..].find(")s") {
        let name = &template[i + 2..i + end];
        let value = vars.get(name);
        if escape {
          out.push_str(&html_escape(value));
        } else {
          out.push_str(value);
        }
        i += end + 2;
        continue;
      }
    }
    out.push(bytes[i] as char);
    i += 1;
  }
  out
}

fn html_escape(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  for ch in value.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(ch),
    }
  }
  out
}

/// One emitted diagnostic, bound to a subject within an exchange.
#[derive(Clone, Debug)]
pub struct Note {
  pub kind: Kind,
  pub subject: String,
  pub subrequest: Option<String>,
  vars: Vars,
}

impl Note {
  pub fn new(kind: Kind, subject: impl Into<String>, vars: Vars) -> Self {
    Self {
      kind,
      subject: subject.into(),
      subrequest: None,
      vars,
    }
  }

  /// Plain-text rendering: no escaping, used for summaries.
  pub fn summary(&self) -> String {
    substitute(self.kind.summary_template, &self.vars, false)
  }

  /// Markdown-oriented rendering: every substituted value is HTML-escaped
  /// first, matching the contract that `text()` must be safe to embed.
  pub fn text(&self) -> String {
    substitute(self.kind.text_template, &self.vars, true)
  }

  fn identity(&self) -> (&'static str, String, String) {
    (self.kind.name, self.subject.clone(), self.summary())
  }

  /// Fills in any of `extra`'s keys this note's own bag doesn't already
  /// carry, without disturbing values the note was built with. Used to
  /// backfill the `response`/`status` slots on a note that was pushed
  /// straight onto an `HttpMessage` (outside of `ExchangeState::add_note`)
  /// once it's folded into the owning exchange's bag.
  pub fn merge_vars(mut self, extra: &Vars) -> Self {
    self.vars = self.vars.merge(extra);
    self
  }
}

/// Per-exchange ordered note accumulation with (kind, subject, summary)
/// deduplication.
#[derive(Clone, Debug, Default)]
pub struct NoteBag {
  notes: Vec<Note>,
}

impl NoteBag {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, note: Note) {
    let identity = note.identity();
    if self.notes.iter().any(|existing| existing.identity() == identity) {
      return;
    }
    self.notes.push(note);
  }

  pub fn iter(&self) -> impl Iterator<Item = &Note> {
    self.notes.iter()
  }

  pub fn len(&self) -> usize {
    self.notes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.notes.is_empty()
  }

  pub fn has_kind(&self, name: &str) -> bool {
    self.notes.iter().any(|note| note.kind.name == name)
  }

  /// Empties the bag, returning whatever it held. Used to lift notes a
  /// message accumulated on its own (header-registry gates, body-length
  /// checks, gzip decode errors) into the exchange that owns the message.
  pub fn drain(&mut self) -> Vec<Note> {
    std::mem::take(&mut self.notes)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const KIND: Kind = Kind {
    name: "TEST_KIND",
    category: Category::General,
    level: Level::Info,
    summary_template: "value is %(value)s",
    text_template: "value is *%(value)s*",
  };

  #[test]
  fn substitution_and_escaping() {
    let vars = Vars::new().set("value", "<b>");
    let note = Note::new(KIND, "offset-1", vars);
    assert_eq!(note.summary(), "value is <b>");
    assert_eq!(note.text(), "value is *&lt;b&gt;*");
  }

  #[test]
  fn dedup_by_kind_subject_summary() {
    let mut bag = NoteBag::new();
    bag.push(Note::new(KIND, "offset-1", Vars::new().set("value", "x")));
    bag.push(Note::new(KIND, "offset-1", Vars::new().set("value", "x")));
    assert_eq!(bag.len(), 1);
    bag.push(Note::new(KIND, "offset-1", Vars::new().set("value", "y")));
    assert_eq!(bag.len(), 2);
    bag.push(Note::new(KIND, "offset-2", Vars::new().set("value", "x")));
    assert_eq!(bag.len(), 3);
  }

  #[test]
  fn insertion_is_ordered() {
    let mut bag = NoteBag::new();
    bag.push(Note::new(KIND, "offset-1", Vars::new().set("value", "a")));
    bag.push(Note::new(KIND, "offset-2", Vars::new().set("value", "b")));
    let summaries: Vec<_> = bag.iter().map(Note::summary).collect();
    assert_eq!(summaries, vec!["value is a", "value is b"]);
  }
}
