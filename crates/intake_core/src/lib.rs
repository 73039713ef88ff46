//! Grievance intake: draft editing, dictation, attachment filtering, validation and submission.

pub mod attachments;
pub mod controller;
pub mod dictation;
pub mod finalizer;
pub mod validation;

pub use attachments::{AttachOutcome, RejectedFile};
pub use controller::{CloseCallback, FormDependencies, FormError, FormState, GrievanceForm};
pub use dictation::{
    CaptureEvent, CaptureEventKind, CaptureEventSender, CaptureRequest, CaptureTicket,
    DictationBridge, DictationState, TextCaptureProvider, UnsupportedTextCapture,
    DEFAULT_DICTATION_LOCALE,
};
pub use finalizer::{ReferenceIdSource, SubmissionFinalizer, SubmitError, UuidReferenceIds};
pub use validation::validate;
