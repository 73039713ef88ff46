use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    InvalidState,
    Persistence,
}

impl ErrorCode {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Persistence)
    }
}

/// User-facing message a host shell renders next to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code:?}: {message}")]
pub struct IntakeNotice {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl IntakeNotice {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_persistence_notices_are_retryable() {
        assert!(IntakeNotice::new(ErrorCode::Persistence, "disk full").retryable);
        assert!(!IntakeNotice::new(ErrorCode::Validation, "missing").retryable);
        assert!(!IntakeNotice::new(ErrorCode::InvalidState, "closed").retryable);
    }

    #[test]
    fn serializes_code_in_snake_case() {
        let json = serde_json::to_value(IntakeNotice::new(ErrorCode::InvalidState, "x")).expect("json");
        assert_eq!(json["code"], "invalid_state");
    }
}
