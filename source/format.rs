//! Output formatters: `start_output`/`status`/`feed`/`finish_output`, each
//! given a `RedState` to render. This crate ships only the `text/plain`
//! renderer; HAR (`application/json`) and HTML remain named, unimplemented
//! media types.

use crate::state::RedState;
use std::io::Write as _;

pub trait Formatter {
  fn start_output(&mut self, test_uri: &str, req_hdrs: &[(String, String)]) -> anyhow::Result<()>;
  fn status(&mut self, message: &str) -> anyhow::Result<()>;
  fn feed(&mut self, state: &RedState, decoded_chunk: &[u8]) -> anyhow::Result<()>;
  fn finish_output(&mut self, state: &RedState) -> anyhow::Result<()>;
}

/// Plain-text summary: the primary exchange's notes first (most-severe
/// phrasing is already baked into each note's level), then one line per
/// probe exchange. Good enough for a CLI's stdout; deliberately not
/// attempting the richer HAR/HTML layouts named out of scope.
pub struct TextFormatter<W: Write> {
  writer: W,
}

impl<W: Write> TextFormatter<W> {
  pub fn new(writer: W) -> Self {
    Self { writer }
  }
}

impl<W: Write> Formatter for TextFormatter<W> {
  fn start_output(&mut self, test_uri: &str, req_hdrs: &[(String, String)]) -> anyhow::Result<()> {
    writeln!(self.writer, "Analyzing {test_uri}")?;
    for (name, value) in req_hdrs {
      writeln!(self.writer, "> {name}: {value}")?;
    }
    Ok(())
  }

  fn status(&mut self, message: &str) -> anyhow::Result<()> {
    writeln!(self.writer, "... {message}")?;
    Ok(())
  }

  fn feed(&mut self, _state: &RedState, _decoded_chunk: &[u8]) -> anyhow::Result<()> {
    // The text formatter summarizes notes, not body content; streaming
    // decoded bytes through here has no effect but keeps the trait
    // uniform with formatters that do render a body preview.
    Ok(())
  }

  fn finish_output(&mut self, state: &RedState) -> anyhow::Result<()> {
    let mut names: Vec<Option<String>> = vec![None];
    names.extend(state.exchanges.keys().filter(|name| name.is_some()).cloned());
    for name in names {
      let Some(exchange) = state.exchanges.get(&name) else { continue };
      let heading = exchange.response_label();
      writeln!(self.writer, "\n{heading}")?;
      if let Some(response) = &exchange.response {
        writeln!(self.writer, "  {} {}", response.status_code, response.status_phrase)?;
      }
      for note in exchange.notes.iter() {
        writeln!(self.writer, "  [{:?}/{:?}] {}", note.kind.category, note.kind.level, note.summary())?;
      }
    }
    if !state.links.is_empty() {
      let total: usize = state.links.values().map(|set| set.len()).sum();
      writeln!(self.writer, "\n{total} links found")?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::message::HttpResponse;
  use crate::note::Vars;
  use crate::notes;

  #[test]
  fn renders_status_and_notes() {
    let mut state = RedState::new("http://example.com/");
    let mut response = HttpResponse::new(200, "http://example.com/");
    response.status_phrase = "OK".to_string();
    let primary = state.primary_mut();
    primary.response = Some(response);
    primary.add_note(notes::STOREABLE, "header-cache-control", Vars::new());

    let mut buffer = Vec::new();
    {
      let mut formatter = TextFormatter::new(&mut buffer);
      formatter.start_output("http://example.com/", &[]).unwrap();
      formatter.finish_output(&state).unwrap();
    }
    let output = String::from_utf8(buffer).unwrap();
    assert!(output.contains("200 OK"));
    assert!(output.contains("allows all caches to store it"));
  }
}
