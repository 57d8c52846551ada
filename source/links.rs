//! The orchestrator's own link-collecting closure, standing in for the
//! full HTML tokenizer is deliberately kept out of scope. Scans
//! decoded response bodies for `href`/`src` attributes on the handful of
//! tags `original_source/redbot/resource/__init__.py`'s `process_link`
//! cares about, pairing each with its tag name and (if present) `title`.

use once_cell::sync::Lazy;
use regex::Regex;

/// One element per recognized link-bearing tag: `<a href>`, `<link href>`,
/// `<img src>`, `<script src>`. Good enough to drive link descent and the
/// hook contract's tests; not a substitute for parsing the DOM.
static LINK_ELEMENT: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#"(?is)<(a|link|img|script)\b([^>]*)>"#).unwrap()
});

static ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\b(href|src|title)\s*=\s*"([^"]*)"|\b(href|src|title)\s*=\s*'([^']*)'"#).unwrap());

/// Returns `(tag, link, title)` triples in document order. `title` is
/// empty when the element carries none.
pub fn extract_links(html: &str) -> Vec<(String, String, String)> {
  let mut links = Vec::new();
  for element in LINK_ELEMENT.captures_iter(html) {
    let tag = element[1].to_ascii_lowercase();
    let attrs = &element[2];
    let mut link = None;
    let mut title = String::new();
    for attr in ATTR.captures_iter(attrs) {
      let (name, value) = if let Some(name) = attr.get(1) {
        (name.as_str(), attr.get(2).unwrap().as_str())
      } else {
        (attr.get(3).unwrap().as_str(), attr.get(4).unwrap().as_str())
      };
      match name.to_ascii_lowercase().as_str() {
        "href" | "src" => link = Some(value.to_string()),
        "title" => title = value.to_string(),
        _ => {}
      }
    }
    if let Some(link) = link {
      links.push((tag, link, title));
    }
  }
  links
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_anchor_and_link_tags() {
    let html = r#"<html><a href="/one" title="First">one</a><link href="/style.css"></html>"#;
    let links = extract_links(html);
    assert_eq!(links, vec![
      ("a".to_string(), "/one".to_string(), "First".to_string()),
      ("link".to_string(), "/style.css".to_string(), String::new()),
    ]);
  }

  #[test]
  fn ignores_tags_without_href_or_src() {
    let html = r#"<a name="anchor">no link here</a>"#;
    assert!(extract_links(html).is_empty());
  }

  #[test]
  fn handles_single_quoted_attributes() {
    let html = "<img src='/pic.png'>";
    assert_eq!(extract_links(html), vec![("img".to_string(), "/pic.png".to_string(), String::new())]);
  }
}
