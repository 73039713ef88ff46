//! The grievance form state machine.
//!
//! `Editing` accepts field changes and submit attempts. A passing submit moves
//! through `Submitting` to `Acknowledged`; a failed store write falls back to
//! `Editing` with the draft intact. `close` always returns to an empty `Editing`
//! draft and tells the host to hide the modal.

use std::sync::Arc;

use shared::{
    domain::{Attachment, FieldName, GrievanceDraft, OrganizationType, ReferenceId, ValidationErrors},
    error::{ErrorCode, IntakeNotice},
};
use storage::RecordStore;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    attachments::{self, AttachOutcome},
    dictation::{
        append_transcript, CaptureEvent, CaptureTicket, DictationBridge, TextCaptureProvider,
        UnsupportedTextCapture, DEFAULT_DICTATION_LOCALE,
    },
    finalizer::{ReferenceIdSource, SubmissionFinalizer, SubmitError, UuidReferenceIds},
    validation::validate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Editing,
    Submitting,
    Acknowledged,
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("form is {state:?}; changes are only accepted while editing")]
    NotEditing { state: FormState },
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl FormError {
    pub fn notice(&self) -> IntakeNotice {
        match self {
            Self::NotEditing { .. } => IntakeNotice::new(ErrorCode::InvalidState, self.to_string()),
            Self::Submit(SubmitError::Validation(errors)) => {
                IntakeNotice::new(ErrorCode::Validation, errors.to_string())
            }
            Self::Submit(SubmitError::Persistence { .. }) => IntakeNotice::new(
                ErrorCode::Persistence,
                "Your grievance could not be saved. Please try submitting again.",
            ),
        }
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Submit(SubmitError::Validation(errors)) => Some(errors),
            _ => None,
        }
    }
}

pub type CloseCallback = Box<dyn FnMut() + Send>;

pub struct FormDependencies {
    pub store: Arc<dyn RecordStore>,
    pub capture: Arc<dyn TextCaptureProvider>,
    pub reference_ids: Arc<dyn ReferenceIdSource>,
    pub dictation_locale: String,
}

impl FormDependencies {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            capture: Arc::new(UnsupportedTextCapture),
            reference_ids: Arc::new(UuidReferenceIds),
            dictation_locale: DEFAULT_DICTATION_LOCALE.to_string(),
        }
    }

    pub fn with_capture(mut self, capture: Arc<dyn TextCaptureProvider>) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_reference_ids(mut self, reference_ids: Arc<dyn ReferenceIdSource>) -> Self {
        self.reference_ids = reference_ids;
        self
    }

    pub fn with_dictation_locale(mut self, locale: impl Into<String>) -> Self {
        self.dictation_locale = locale.into();
        self
    }
}

pub struct GrievanceForm {
    draft: GrievanceDraft,
    state: FormState,
    errors: ValidationErrors,
    notice: Option<IntakeNotice>,
    dictation: DictationBridge,
    finalizer: SubmissionFinalizer,
    on_close: Option<CloseCallback>,
}

impl GrievanceForm {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::new_with_dependencies(FormDependencies::new(store))
    }

    pub fn new_with_dependencies(deps: FormDependencies) -> Self {
        Self {
            draft: GrievanceDraft::default(),
            state: FormState::Editing,
            errors: ValidationErrors::new(),
            notice: None,
            dictation: DictationBridge::new(deps.capture, deps.dictation_locale),
            finalizer: SubmissionFinalizer::with_reference_ids(deps.store, deps.reference_ids),
            on_close: None,
        }
    }

    pub fn set_on_close(&mut self, on_close: impl FnMut() + Send + 'static) {
        self.on_close = Some(Box::new(on_close));
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn draft(&self) -> &GrievanceDraft {
        &self.draft
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.draft.attachments
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error_for(&self, field: FieldName) -> Option<&str> {
        self.errors.get(field)
    }

    pub fn notice(&self) -> Option<&IntakeNotice> {
        self.notice.as_ref()
    }

    pub fn reference_id(&self) -> Option<&ReferenceId> {
        self.draft.reference_id.as_ref()
    }

    pub fn dictation_supported(&self) -> bool {
        self.dictation.is_supported()
    }

    pub fn is_listening(&self) -> bool {
        self.dictation.is_listening()
    }

    /// The host made the modal visible.
    pub fn open(&mut self) {
        self.reset();
        debug!("grievance form opened");
    }

    /// Discards everything, including an acknowledged submission, and asks the host to hide the modal.
    pub fn close(&mut self) {
        self.reset();
        info!("grievance form closed");
        if let Some(on_close) = self.on_close.as_mut() {
            on_close();
        }
    }

    fn reset(&mut self) {
        self.dictation.reset();
        self.draft = GrievanceDraft::default();
        self.errors = ValidationErrors::new();
        self.notice = None;
        self.state = FormState::Editing;
    }

    fn ensure_editing(&self) -> Result<(), FormError> {
        if self.state == FormState::Editing {
            Ok(())
        } else {
            Err(FormError::NotEditing { state: self.state })
        }
    }

    pub fn set_organization_type(
        &mut self,
        organization_type: Option<OrganizationType>,
    ) -> Result<(), FormError> {
        self.ensure_editing()?;
        self.draft.organization_type = organization_type;
        Ok(())
    }

    pub fn set_organization_name(&mut self, name: impl Into<String>) -> Result<(), FormError> {
        self.ensure_editing()?;
        self.draft.organization_name = name.into();
        Ok(())
    }

    pub fn set_issue_description(&mut self, description: impl Into<String>) -> Result<(), FormError> {
        self.ensure_editing()?;
        self.draft.issue_description = description.into();
        Ok(())
    }

    pub fn add_files(
        &mut self,
        candidates: impl IntoIterator<Item = Attachment>,
    ) -> Result<AttachOutcome, FormError> {
        self.ensure_editing()?;
        let outcome = attachments::add_files(&mut self.draft.attachments, candidates);
        if outcome.has_rejections() {
            warn!(
                accepted = outcome.accepted,
                rejected = outcome.rejected.len(),
                "some attachments were not added: unsupported file type"
            );
        }
        Ok(outcome)
    }

    pub fn remove_attachment(&mut self, index: usize) -> Result<Option<Attachment>, FormError> {
        self.ensure_editing()?;
        Ok(attachments::remove_at(&mut self.draft.attachments, index))
    }

    pub fn start_dictation(&mut self) -> Result<Option<CaptureTicket>, FormError> {
        self.ensure_editing()?;
        Ok(self.dictation.start_listening())
    }

    pub fn stop_dictation(&mut self) {
        self.dictation.stop_listening();
    }

    /// Feeds one provider event into the form. Returns `true` when the description changed.
    pub fn on_capture_event(&mut self, event: CaptureEvent) -> bool {
        let Some(transcript) = self.dictation.handle_event(event) else {
            return false;
        };
        if self.state != FormState::Editing {
            debug!(state = ?self.state, "dropping transcript that arrived outside editing");
            return false;
        }
        self.draft.issue_description =
            append_transcript(&self.draft.issue_description, &transcript);
        true
    }

    /// Applies every event the capture provider has queued so far.
    pub fn poll_capture_events(&mut self) -> usize {
        let events = self.dictation.drain_events();
        let count = events.len();
        for event in events {
            self.on_capture_event(event);
        }
        count
    }

    /// Validates the current draft and, when it passes, persists it and acknowledges.
    pub async fn submit(&mut self) -> Result<ReferenceId, FormError> {
        self.ensure_editing()?;

        self.errors = validate(&self.draft);
        if !self.errors.is_empty() {
            debug!(fields = ?self.errors.fields().collect::<Vec<_>>(), "submission blocked by validation");
            return Err(SubmitError::Validation(self.errors.clone()).into());
        }

        self.notice = None;
        self.dictation.stop_listening();
        self.state = FormState::Submitting;

        match self.finalizer.finalize(&self.draft).await {
            Ok(record) => {
                self.draft.reference_id = Some(record.reference_id.clone());
                self.state = FormState::Acknowledged;
                Ok(record.reference_id)
            }
            Err(err) => {
                self.state = FormState::Editing;
                let err = FormError::from(err);
                self.notice = Some(err.notice());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
