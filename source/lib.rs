// https://www.rfc-editor.org/rfc/rfc7230 - HTTP/1.1: Message Syntax and Routing
// https://www.rfc-editor.org/rfc/rfc7231 - HTTP/1.1: Semantics and Content
// https://www.rfc-editor.org/rfc/rfc7232 - HTTP/1.1: Conditional Requests
// https://www.rfc-editor.org/rfc/rfc7233 - HTTP/1.1: Range Requests
// https://www.rfc-editor.org/rfc/rfc7234 - HTTP/1.1: Caching
// https://www.rfc-editor.org/rfc/rfc9309 - Robots Exclusion Protocol

use anyhow::Context as _;
use std::{fs, path, sync::mpsc, thread, time};

mod active_check;
mod cache;
pub mod clock;
pub mod fetcher;
pub mod format;
mod header;
mod links;
pub mod message;
pub mod note;
pub mod notes;
pub mod robots;
pub mod state;
pub mod transport;

fn parse_duration(argument: &str) -> Result<time::Duration, std::num::ParseIntError> {
  Ok(time::Duration::from_secs(argument.parse()?))
}

fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
  let (name, value) = raw.split_once(':').with_context(|| format!("{raw:?} isn't a name:value header"))?;
  Ok((name.trim().to_string(), value.trim().to_string()))
}

#[derive(clap::Args)]
#[group(skip)]
pub struct Arguments {
  #[arg(help = "Target URI to analyze")]
  pub uri: String,

  #[arg(long = "method", help = "HTTP method to use for the primary request", default_value_t = String::from("GET"))]
  pub method: String,
  #[arg(long = "header", help = "Extra request header, as name:value (repeatable)", value_parser = parse_header)]
  pub header: Vec<(String, String)>,
  #[arg(long = "body", help = "Path to a file to send as the request body")]
  pub body: Option<String>,

  #[arg(long = "descend", help = "Follow and analyze linked (non-anchor) resources", default_value_t = false)]
  pub descend: bool,
  #[arg(long = "max-depth", help = "Maximum link-descent depth when --descend is set", default_value_t = 1)]
  pub max_depth: u32,
  #[arg(long = "max-runtime", help = "Wall-clock budget for the whole analysis, in seconds", value_parser = parse_duration)]
  pub max_runtime: Option<time::Duration>,

  #[arg(long = "robots-txt", help = "Consult the origin's robots.txt before fetching", default_value_t = true)]
  pub follow_robots_txt: bool,
  #[arg(long = "robots-cache", help = "Directory to cache robots.txt bodies in")]
  pub robots_cache: Option<String>,

  #[arg(
    long = "format",
    help = "Output format: text | har | html (only text is implemented)",
    default_value_t = String::from("text")
  )]
  pub format: String,
}

/// Analyzes `arguments.uri`, bounded by `arguments.max_runtime` (default
/// 60s). On expiry the worker thread is detached rather
/// than joined: once nothing is listening for its result, its remaining
/// work is moot, which is this crate's equivalent of the original's
/// "in-flight fetchers are abandoned" cancellation note.
pub fn run(arguments: &Arguments) -> anyhow::Result<()> {
  anyhow::ensure!(arguments.format == "text", "only the text output format is implemented; {} isn't", arguments.format);

  let body = match &arguments.body {
    Some(body_path) => fs::read(body_path).with_context(|| format!("reading request body from {body_path}"))?,
    None => Vec::new(),
  };

  let transport = transport::BlockingTransport::new().context("setting up the HTTP transport")?;
  let robots_dir = arguments.robots_cache.as_ref().map(path::PathBuf::from);
  let robots = robots::RobotsCache::new(robots_dir);
  let options = fetcher::FetchOptions {
    method: arguments.method.clone(),
    headers: arguments.header.clone(),
    body,
    descend: arguments.descend,
    follow_robots_txt: arguments.follow_robots_txt,
    max_depth: arguments.max_depth,
  };
  let max_runtime = arguments.max_runtime.unwrap_or(time::Duration::from_secs(60));
  let uri = arguments.uri.clone();

  let (sender, receiver) = mpsc::channel();
  thread::spawn(move || {
    let state = fetcher::analyze(&transport, &robots, &uri, &options, &|message| log::debug!("{message}"));
    // The receiver may already be gone if `recv_timeout` below expired;
    // a `send` error just means this result is discarded.
    let _ = sender.send(state);
  });

  let state = receiver
    .recv_timeout(max_runtime)
    .map_err(|_| anyhow::anyhow!("analysis of {} exceeded its {max_runtime:?} runtime budget", arguments.uri))?;

  use format::Formatter as _;
  let mut formatter = format::TextFormatter::new(std::io::stdout());
  formatter.start_output(&arguments.uri, &arguments.header)?;
  formatter.finish_output(&state)?;
  log::info!(
    "analyzed {} ({} exchange(s), {} byte(s) in / {} byte(s) out)",
    arguments.uri,
    state.exchanges.len(),
    state.transfer_in,
    state.transfer_out
  );
  Ok(())
}
