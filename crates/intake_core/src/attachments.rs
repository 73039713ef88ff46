//! Media-type filtering for evidence attachments.

use serde::Serialize;
use shared::domain::Attachment;
use tracing::debug;

const ACCEPTED_MEDIA_PREFIXES: [&str; 3] = ["image/", "video/", "audio/"];
const ACCEPTED_EXACT_TYPES: [&str; 1] = ["application/pdf"];

pub fn is_accepted_mime_type(mime_type: &str) -> bool {
    let mime_type = mime_type.trim().to_ascii_lowercase();
    ACCEPTED_MEDIA_PREFIXES
        .iter()
        .any(|prefix| mime_type.starts_with(prefix))
        || ACCEPTED_EXACT_TYPES.contains(&mime_type.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedFile {
    pub name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachOutcome {
    pub accepted: usize,
    pub rejected: Vec<RejectedFile>,
}

impl AttachOutcome {
    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Appends the accepted candidates after the existing attachments, keeping their
/// relative order. Identical files are not deduplicated.
pub fn add_files(
    attachments: &mut Vec<Attachment>,
    candidates: impl IntoIterator<Item = Attachment>,
) -> AttachOutcome {
    let mut outcome = AttachOutcome::default();
    for candidate in candidates {
        if is_accepted_mime_type(&candidate.mime_type) {
            attachments.push(candidate);
            outcome.accepted += 1;
        } else {
            debug!(name = %candidate.name, mime_type = %candidate.mime_type, "dropping attachment with unsupported media type");
            outcome.rejected.push(RejectedFile {
                name: candidate.name,
                mime_type: candidate.mime_type,
            });
        }
    }
    outcome
}

/// Out-of-range indexes leave the list untouched.
pub fn remove_at(attachments: &mut Vec<Attachment>, index: usize) -> Option<Attachment> {
    (index < attachments.len()).then(|| attachments.remove(index))
}

#[cfg(test)]
#[path = "tests/attachments_tests.rs"]
mod tests;
