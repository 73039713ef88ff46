//! Turns a validated draft into a persisted, acknowledged record.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use shared::{
    domain::{GrievanceDraft, ReferenceId, ValidationErrors},
    protocol::SubmittedRecord,
};
use storage::RecordStore;
use thiserror::Error;
use tracing::{error, info};

use crate::validation::validate;

pub trait ReferenceIdSource: Send + Sync {
    fn next_reference_id(&self) -> ReferenceId;
}

/// Eight-character prefixes of random v4 uuids. No collision check beyond the
/// store refusing to overwrite an existing key.
pub struct UuidReferenceIds;

impl ReferenceIdSource for UuidReferenceIds {
    fn next_reference_id(&self) -> ReferenceId {
        ReferenceId::generate()
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("grievance is incomplete: {0}")]
    Validation(ValidationErrors),
    #[error("failed to save grievance {reference_id}: {source}")]
    Persistence {
        reference_id: ReferenceId,
        source: anyhow::Error,
    },
}

impl SubmitError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

pub struct SubmissionFinalizer {
    store: Arc<dyn RecordStore>,
    reference_ids: Arc<dyn ReferenceIdSource>,
}

impl SubmissionFinalizer {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_reference_ids(store, Arc::new(UuidReferenceIds))
    }

    pub fn with_reference_ids(
        store: Arc<dyn RecordStore>,
        reference_ids: Arc<dyn ReferenceIdSource>,
    ) -> Self {
        Self {
            store,
            reference_ids,
        }
    }

    /// Stores first, acknowledges second: the record is returned only after the
    /// store accepted it.
    pub async fn finalize(&self, draft: &GrievanceDraft) -> Result<SubmittedRecord, SubmitError> {
        let reference_id = self.reference_ids.next_reference_id();
        let submitted_at = Utc::now().trunc_subsecs(3);
        let Some(record) = SubmittedRecord::from_draft(draft, reference_id, submitted_at) else {
            return Err(SubmitError::Validation(validate(draft)));
        };

        if let Err(source) = self.store.put(&record).await {
            error!(reference_id = %record.reference_id, error = %source, "grievance record was not persisted");
            return Err(SubmitError::Persistence {
                reference_id: record.reference_id,
                source,
            });
        }

        info!(
            reference_id = %record.reference_id,
            organization = %record.organization,
            attachments = record.files.len(),
            "grievance submitted"
        );
        Ok(record)
    }
}

#[cfg(test)]
#[path = "tests/finalizer_tests.rs"]
mod tests;
