//! Wall-clock access, isolated so the fetch orchestrator and active
//! checks don't each reimplement the `UNIX_EPOCH` dance.

/// Current Unix timestamp, matching the precision `thor.time()` gives the
/// original (whole seconds are enough for the cache evaluator's age math).
pub fn now_unix() -> i64 {
  std::time::SystemTime::now()
    .duration_since(std::time::UNIX_EPOCH)
    .map(|duration| duration.as_secs() as i64)
    .unwrap_or(0)
}
