//! The test-scope containers: one exchange (`ExchangeState`) and the tree
//! of exchanges plus capability flags that make up a full analysis
//! (`RedState`). Grounded on `redbot/state.py`.

use crate::message::{HttpRequest, HttpResponse};
use crate::note::{Note, NoteBag, Vars};
use std::collections::{HashMap, HashSet};

/// One HTTP exchange: the primary fetch, or a named probe. Owns its own
/// request/response pair and an ordered, deduplicated note sequence.
/// `context` holds the key/value bag merged into every note emitted while
/// it's set (`ExchangeState.context`); this crate only
/// ever populates `response`/`status`, which `add_note` injects itself, so
/// `context` stays available for callers that want to layer more in
/// (matching the original's generic `**kw` merge in `add_note`).
pub struct ExchangeState {
  pub name: Option<String>,
  pub request: Option<HttpRequest>,
  pub response: Option<HttpResponse>,
  pub notes: NoteBag,
  pub context: Vars,
}

impl ExchangeState {
  pub fn new(name: Option<&str>) -> Self {
    Self {
      name: name.map(str::to_string),
      request: None,
      response: None,
      notes: NoteBag::new(),
      context: Vars::new(),
    }
  }

  /// The label this exchange's notes refer to itself by: "This response"
  /// for the primary, "The %(name)s response" for a probe.
  pub fn response_label(&self) -> String {
    match &self.name {
      None => "This response".to_string(),
      Some(name) => format!("The {name} response"),
    }
  }

  pub fn add_note(&mut self, kind: crate::note::Kind, subject: impl Into<String>, vars: Vars) {
    let status = self.response.as_ref().map(|response| response.status_code).unwrap_or(0);
    let merged = vars
      .merge(&self.context)
      .set("response", self.response_label())
      .set("status", status);
    self.notes.push(Note::new(kind, subject, merged));
  }

  /// Lifts notes the request/response messages accumulated on their own
  /// (header-registry parse/join gates, body-length checks, gzip decode
  /// errors, URI validation) into this exchange's bag, backfilling the
  /// same `response`/`status` slots `add_note` sets so they render
  /// identically to notes raised directly against the exchange. Request
  /// notes are drained first so ordering matches the order the exchange
  /// was built in.
  pub fn absorb_message_notes(&mut self) {
    let status = self.response.as_ref().map(|response| response.status_code).unwrap_or(0);
    let context = self.context.clone().set("response", self.response_label()).set("status", status);
    let mut drained = Vec::new();
    if let Some(request) = &mut self.request {
      drained.extend(request.message.notes.drain());
    }
    if let Some(response) = &mut self.response {
      drained.extend(response.message.notes.drain());
    }
    for note in drained {
      self.notes.push(note.merge_vars(&context));
    }
  }
}

/// Everything accumulated across one full resource analysis, including
/// descended links when `descend` is requested.
pub struct RedState {
  /// Identifies one analysis run, the way `redbot.webui`'s `test_id`
  /// names a saved test's file; generated rather than derived from the
  /// target URI since the same URI can be analysed more than once.
  pub test_id: uuid::Uuid,
  pub uri: String,
  pub exchanges: HashMap<Option<String>, ExchangeState>,
  pub transfer_in: u64,
  pub transfer_out: u64,
  /// Descended child resources and the link-type tag each was reached
  /// through, per `RedState.linked`: each entry owns
  /// the full sub-analysis, not just its URI.
  pub linked: Vec<(RedState, String)>,
  pub links: HashMap<String, HashSet<String>>,
  pub partial_support: Option<bool>,
  pub inm_support: Option<bool>,
  pub ims_support: Option<bool>,
  pub gzip_support: Option<bool>,
  pub gzip_savings: Option<i64>,
  pub cancelled: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl RedState {
  pub fn new(uri: &str) -> Self {
    let mut exchanges = HashMap::new();
    exchanges.insert(None, ExchangeState::new(None));
    Self {
      test_id: uuid::Uuid::new_v4(),
      uri: uri.to_string(),
      exchanges,
      transfer_in: 0,
      transfer_out: 0,
      linked: Vec::new(),
      links: HashMap::new(),
      partial_support: None,
      inm_support: None,
      ims_support: None,
      gzip_support: None,
      gzip_savings: None,
      cancelled: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false)),
    }
  }

  pub fn primary(&self) -> &ExchangeState {
    self.exchanges.get(&None).expect("primary exchange always present")
  }

  pub fn primary_mut(&mut self) -> &mut ExchangeState {
    self.exchanges.get_mut(&None).expect("primary exchange always present")
  }

  pub fn probe(&mut self, name: &str) -> &mut ExchangeState {
    self.exchanges.entry(Some(name.to_string())).or_insert_with(|| ExchangeState::new(Some(name)))
  }

  /// Records a link seen while processing the primary response's body,
  /// per `process_link`'s bookkeeping (`original_source/redbot/resource/__init__.py`).
  /// Returns whether this is the first time this exact URI was seen under
  /// `tag`, i.e. whether it's worth descending into.
  pub fn record_link(&mut self, tag: &str, uri: &str) -> bool {
    self.links.entry(tag.to_string()).or_default().insert(uri.to_string())
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancelled.load(std::sync::atomic::Ordering::Relaxed)
  }

  pub fn cancel(&self) {
    self.cancelled.store(true, std::sync::atomic::Ordering::Relaxed);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn response_label_distinguishes_primary_and_probe() {
    let primary = ExchangeState::new(None);
    let probe = ExchangeState::new(Some("ETag validation"));
    assert_eq!(primary.response_label(), "This response");
    assert_eq!(probe.response_label(), "The ETag validation response");
  }

  #[test]
  fn record_link_dedups_per_tag() {
    let mut state = RedState::new("http://example.com/");
    assert!(state.record_link("a", "http://example.com/1"));
    assert!(!state.record_link("a", "http://example.com/1"));
    assert!(state.record_link("link", "http://example.com/1"));
  }
}
