//! Job application detection from web pages.
//!
//! Five-stage pipeline: structured data → heuristic fields + confidence →
//! escalation decision → optional remote extraction → merge.

pub mod db;
pub mod error;
pub mod escalation;
pub mod extract;
pub mod merge;
pub mod page;
pub mod pipeline;
pub mod proxy;
pub mod remote;
pub mod sanitize;
pub mod settings;

pub use error::{Error, Result};
pub use extract::{ExtractionResult, Source, StatusHint};
pub use page::{HtmlPage, PageSignal, StaticPage};
pub use pipeline::Pipeline;
pub use settings::Settings;

/// Collapse whitespace runs and trim.
pub fn clean(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` characters (not bytes).
pub fn clamp_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
