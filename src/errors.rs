use thiserror::Error;

use crate::creator::CreatorError;
use crate::decimal::Money;
use crate::orchestrator::{Progress, Step};
use crate::plan::FieldIssue;

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        issues: Vec<FieldIssue>,
    },

    #[error("{step} failed with {progress}: {source}")]
    Creation {
        step: Step,
        progress: Progress,
        #[source]
        source: CreatorError,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid term code: {code} (expected 15, 20, 23 or 28)")]
    InvalidTermCode {
        code: String,
    },

    #[error("principal {amount} is outside the supported range (at most {maximum})")]
    AmountOutOfRange {
        amount: Money,
        maximum: Money,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RegistrationError {
    /// validation failure carrying a single message and no field issues
    pub fn validation(message: impl Into<String>) -> Self {
        RegistrationError::Validation {
            message: message.into(),
            issues: Vec::new(),
        }
    }

    /// partial progress when the failure happened mid-walk
    pub fn progress(&self) -> Option<&Progress> {
        match self {
            RegistrationError::Creation { progress, .. } => Some(progress),
            _ => None,
        }
    }

    /// true when records may already exist in the remote store
    pub fn may_have_partial_records(&self) -> bool {
        self.progress().map(|p| p.any_created()).unwrap_or(false)
    }
}

pub type Result<T> = std::result::Result<T, RegistrationError>;
