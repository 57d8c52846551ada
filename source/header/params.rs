//! Re-exports of the shared parameter-parsing routine for header modules
//! that need it (`Content-Type`, `Content-Disposition`, `Cache-Control`).
pub use super::{parse_params, parse_star_value};
