use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Attachment, GrievanceDraft, OrganizationType, ReferenceId};

pub const STORE_KEY_PREFIX: &str = "grievance_";

pub fn store_key(reference_id: &ReferenceId) -> String {
    format!("{STORE_KEY_PREFIX}{reference_id}")
}

/// Immutable snapshot of a draft at the moment it was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedRecord {
    pub organization: OrganizationType,
    pub organization_name: String,
    pub issue_description: String,
    #[serde(default)]
    pub files: Vec<Attachment>,
    pub reference_id: ReferenceId,
    #[serde(with = "iso_millis")]
    pub submitted_at: DateTime<Utc>,
}

impl SubmittedRecord {
    /// Returns `None` when the draft has no organization type selected.
    pub fn from_draft(
        draft: &GrievanceDraft,
        reference_id: ReferenceId,
        submitted_at: DateTime<Utc>,
    ) -> Option<Self> {
        Some(Self {
            organization: draft.organization_type?,
            organization_name: draft.organization_name.clone(),
            issue_description: draft.issue_description.clone(),
            files: draft.attachments.clone(),
            reference_id,
            submitted_at,
        })
    }

    pub fn store_key(&self) -> String {
        store_key(&self.reference_id)
    }

    pub fn submitted_at_iso(&self) -> String {
        self.submitted_at
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
