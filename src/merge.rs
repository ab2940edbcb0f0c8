use tracing::debug;

use crate::extract::{ExtractionResult, Source};
use crate::remote::RemoteExtractionResponse;

/// Fill empty local fields from the remote response. Non-empty local
/// values are never replaced; `likely_applied` and `confidence` pass
/// through untouched.
///
/// The source becomes `Remote` when every field came from the remote
/// response, `Merged` when local and remote values are mixed.
pub fn merge(
    local: ExtractionResult,
    remote: Option<&RemoteExtractionResponse>,
) -> ExtractionResult {
    let Some(remote) = remote else {
        return local;
    };

    let had_local = !(local.job_title.is_empty()
        && local.company.is_empty()
        && local.location.is_empty());
    let mut merged = local;
    let mut filled = 0;
    for (slot, value) in [
        (&mut merged.job_title, &remote.job_title),
        (&mut merged.company, &remote.company),
        (&mut merged.location, &remote.location),
    ] {
        if slot.is_empty() && !value.is_empty() {
            *slot = value.clone();
            filled += 1;
        }
    }

    if filled > 0 {
        merged.source = if had_local {
            Source::Merged
        } else {
            Source::Remote
        };
    }
    merged.status_hint = remote.status_hint;
    debug!(filled, "merged remote fields");
    merged
}
