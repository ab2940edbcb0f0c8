use tracing::debug;

use crate::extract::{ExtractionResult, Source};
use crate::page::PageSignal;
use crate::remote::RemoteExtractionPayload;
use crate::sanitize::sanitize;
use crate::clamp_chars;

/// Below this local confidence the remote extractor is consulted.
/// Overridable through `Settings::confidence_threshold`.
pub const DEFAULT_THRESHOLD: f64 = 0.7;

pub const PAYLOAD_TEXT_MAX: usize = 18_000;
pub const PAYLOAD_URL_MAX: usize = 500;
pub const PAYLOAD_TITLE_MAX: usize = 300;

pub fn should_escalate(result: &ExtractionResult, remote_configured: bool) -> bool {
    should_escalate_with(result, remote_configured, DEFAULT_THRESHOLD)
}

pub fn should_escalate_with(
    result: &ExtractionResult,
    remote_configured: bool,
    threshold: f64,
) -> bool {
    if !remote_configured || result.source == Source::Structured {
        return false;
    }
    result.job_title.is_empty() || result.company.is_empty() || result.confidence < threshold
}

/// Sanitized request body for the remote extractor. `None` when the page
/// has neither body text nor a title to send.
pub fn build_payload(page: &dyn PageSignal) -> Option<RemoteExtractionPayload> {
    let text = clamp_chars(&sanitize(&page.body_text()), PAYLOAD_TEXT_MAX);
    let title = clamp_chars(&sanitize(&page.document_title()), PAYLOAD_TITLE_MAX);
    if text.trim().is_empty() && title.trim().is_empty() {
        debug!("nothing to send to remote extractor");
        return None;
    }
    Some(RemoteExtractionPayload {
        text,
        url: clamp_chars(&page.url(), PAYLOAD_URL_MAX),
        title,
    })
}
