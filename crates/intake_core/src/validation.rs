use shared::domain::{FieldName, GrievanceDraft, ValidationErrors};

pub const ORGANIZATION_TYPE_REQUIRED: &str = "Please select an organization type";
pub const ORGANIZATION_NAME_REQUIRED: &str = "Please enter organization name/ID";
pub const ISSUE_DESCRIPTION_REQUIRED: &str = "Please describe your grievance";

/// Checks the three required fields. Attachments are optional and unbounded.
pub fn validate(draft: &GrievanceDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if draft.organization_type.is_none() {
        errors.insert(FieldName::OrganizationType, ORGANIZATION_TYPE_REQUIRED);
    }
    if draft.organization_name.trim().is_empty() {
        errors.insert(FieldName::OrganizationName, ORGANIZATION_NAME_REQUIRED);
    }
    if draft.issue_description.trim().is_empty() {
        errors.insert(FieldName::IssueDescription, ISSUE_DESCRIPTION_REQUIRED);
    }

    errors
}
