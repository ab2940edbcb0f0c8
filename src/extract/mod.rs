pub mod confidence;
pub mod confirmation;
pub mod heuristic;
pub mod structured;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::page::PageSignal;
use crate::{clamp_chars, clean};

pub const TITLE_MAX: usize = 140;
pub const COMPANY_MAX: usize = 120;
pub const LOCATION_MAX: usize = 140;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Structured,
    Heuristic,
    Remote,
    Merged,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Structured => "structured",
            Source::Heuristic => "heuristic",
            Source::Remote => "remote",
            Source::Merged => "merged",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusHint {
    Submitted,
    #[default]
    Unknown,
}

impl StatusHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusHint::Submitted => "submitted",
            StatusHint::Unknown => "unknown",
        }
    }

    /// Only the exact literal "submitted" counts.
    pub fn from_raw(raw: &str) -> Self {
        if raw == "submitted" {
            StatusHint::Submitted
        } else {
            StatusHint::Unknown
        }
    }
}

/// The three fields every extractor tries to fill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub job_title: String,
    pub company: String,
    pub location: String,
}

impl Fields {
    /// Clean and clamp each field to its bound.
    pub fn bounded(job_title: &str, company: &str, location: &str) -> Self {
        Self {
            job_title: clamp_chars(&clean(job_title), TITLE_MAX),
            company: clamp_chars(&clean(company), COMPANY_MAX),
            location: clamp_chars(&clean(location), LOCATION_MAX),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.job_title.is_empty() && self.company.is_empty() && self.location.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub confidence: f64,
    pub source: Source,
    pub likely_applied: bool,
    #[serde(default)]
    pub status_hint: StatusHint,
}

impl ExtractionResult {
    pub fn from_fields(fields: Fields, confidence: f64, source: Source) -> Self {
        Self {
            job_title: fields.job_title,
            company: fields.company,
            location: fields.location,
            confidence,
            source,
            likely_applied: false,
            status_hint: StatusHint::Unknown,
        }
    }

    /// All-empty heuristic result.
    pub fn empty() -> Self {
        Self::from_fields(
            Fields::default(),
            confidence::score(&Fields::default()),
            Source::Heuristic,
        )
    }
}

/// Local (no network) extraction: structured data wins outright, otherwise
/// the heuristic locator runs and is scored. An empty page comes out as
/// `ExtractionResult::empty()`.
pub fn extract_local(page: &dyn PageSignal) -> ExtractionResult {
    if page.is_empty() {
        debug!("empty page signal");
    }

    let mut result = match structured::parse_structured(&page.structured_blocks()) {
        Some(found) => found,
        None => {
            let fields = heuristic::locate_fields(page);
            let score = confidence::score(&fields);
            debug!(
                job_title = %fields.job_title,
                company = %fields.company,
                location = %fields.location,
                confidence = score,
                "heuristic extraction"
            );
            ExtractionResult::from_fields(fields, score, Source::Heuristic)
        }
    };
    result.likely_applied = confirmation::looks_like_confirmation(&page.body_text());
    result
}

// ── Tests ──
