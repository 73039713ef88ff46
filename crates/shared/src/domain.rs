use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const REFERENCE_ID_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrganizationType {
    #[serde(rename = "NGO")]
    Ngo,
    #[serde(rename = "Labor Officer")]
    LaborOfficer,
    #[serde(rename = "Company's Internal Committee")]
    InternalCommittee,
}

impl OrganizationType {
    pub const ALL: [OrganizationType; 3] = [
        OrganizationType::Ngo,
        OrganizationType::LaborOfficer,
        OrganizationType::InternalCommittee,
    ];

    /// Value written into persisted records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ngo => "NGO",
            Self::LaborOfficer => "Labor Officer",
            Self::InternalCommittee => "Company's Internal Committee",
        }
    }

    pub fn label(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for OrganizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown organization type: {0}")]
pub struct UnknownOrganizationType(pub String);

impl FromStr for OrganizationType {
    type Err = UnknownOrganizationType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "ngo" => Ok(Self::Ngo),
            "laborofficer" => Ok(Self::LaborOfficer),
            "internalcommittee" | "companysinternalcommittee" => Ok(Self::InternalCommittee),
            _ => Err(UnknownOrganizationType(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    OrganizationType,
    OrganizationName,
    IssueDescription,
}

impl FieldName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OrganizationType => "organizationType",
            Self::OrganizationName => "organizationName",
            Self::IssueDescription => "issueDescription",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    Pdf,
}

impl AttachmentKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// File metadata handed over by the host's file picker. Contents are never read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub byte_size: u64,
}

impl Attachment {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, byte_size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            byte_size,
        }
    }

    pub fn kind(&self) -> Option<AttachmentKind> {
        let mime = self.mime_type.as_str();
        if mime.starts_with("image/") {
            Some(AttachmentKind::Image)
        } else if mime.starts_with("video/") {
            Some(AttachmentKind::Video)
        } else if mime.starts_with("audio/") {
            Some(AttachmentKind::Audio)
        } else if mime == "application/pdf" {
            Some(AttachmentKind::Pdf)
        } else {
            None
        }
    }

    /// Size in megabytes with one decimal, e.g. `2.5 MB`.
    pub fn display_size(&self) -> String {
        format!("{:.1} MB", self.byte_size as f64 / 1024.0 / 1024.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceId(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("reference id must be {REFERENCE_ID_LEN} uppercase alphanumeric characters, got {0:?}")]
pub struct InvalidReferenceId(pub String);

impl ReferenceId {
    /// First eight hex digits of a fresh v4 uuid, uppercased.
    pub fn generate() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        let mut value = uuid.simple().to_string();
        value.truncate(REFERENCE_ID_LEN);
        value.make_ascii_uppercase();
        Self(value)
    }

    pub fn parse(raw: &str) -> Result<Self, InvalidReferenceId> {
        let value = raw.trim().to_ascii_uppercase();
        let well_formed = value.len() == REFERENCE_ID_LEN
            && value
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        if well_formed {
            Ok(Self(value))
        } else {
            Err(InvalidReferenceId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ReferenceId {
    type Error = InvalidReferenceId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<ReferenceId> for String {
    fn from(reference_id: ReferenceId) -> Self {
        reference_id.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrievanceDraft {
    pub organization_type: Option<OrganizationType>,
    pub organization_name: String,
    pub issue_description: String,
    pub attachments: Vec<Attachment>,
    pub reference_id: Option<ReferenceId>,
}

impl GrievanceDraft {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Field-level validation messages; a missing key means the field passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<FieldName, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: FieldName, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: FieldName) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FieldName) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}
