// src/extract/mod.rs
// =============================================================================
// Link extraction: from raw body bytes to absolute URLs.
//
// Submodules:
// - scanner: streaming search for "<hostname>..." candidates in a body
// - normalize: candidate -> Url, plus the frontier and action keys
// =============================================================================

mod normalize;
mod scanner;

pub use normalize::{action_key_of, frontier_key_of, Normalizer};
pub use scanner::LinkScanner;
