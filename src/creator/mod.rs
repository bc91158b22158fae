//! Record creation boundary: the four single-record operations of the remote service.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::entities::{
    AdminPayload, ClientPayload, LoanPayload, PersistedAdmin, PersistedClient, PersistedLoan,
    PersistedWorker, WorkerPayload,
};
use crate::types::EntityKind;

pub use http::HttpRecordCreator;
pub use memory::{InMemoryRecordCreator, RecordedCall};

/// server-supplied error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCategory {
    Duplicate,
    Authentication,
    Validation,
    Other,
}

impl RemoteCategory {
    /// map a structured category string from the service
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "duplicate" | "duplicate_email" | "conflict" => RemoteCategory::Duplicate,
            "authentication" | "auth" | "unauthorized" => RemoteCategory::Authentication,
            "validation" | "invalid" => RemoteCategory::Validation,
            _ => RemoteCategory::Other,
        }
    }
}

/// failure with no server response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Timeout,
    Network,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Timeout => write!(f, "timeout"),
            TransportKind::Network => write!(f, "network error"),
        }
    }
}

/// errors raised by a record creator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CreatorError {
    #[error("remote service rejected {entity} with status {status}: {message}")]
    Remote {
        entity: EntityKind,
        status: u16,
        category: Option<RemoteCategory>,
        message: String,
        details: Option<String>,
    },

    #[error("{kind} while creating {entity}: {message}")]
    Transport {
        entity: EntityKind,
        kind: TransportKind,
        message: String,
    },

    #[error("invalid response creating {entity}: {message}")]
    InvalidResponse {
        entity: EntityKind,
        message: String,
    },
}

impl CreatorError {
    pub fn entity(&self) -> EntityKind {
        match self {
            CreatorError::Remote { entity, .. }
            | CreatorError::Transport { entity, .. }
            | CreatorError::InvalidResponse { entity, .. } => *entity,
        }
    }

    /// http status when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            CreatorError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type CreatorResult<T> = std::result::Result<T, CreatorError>;

/// the four creation operations the orchestrator depends on
///
/// Implementations own their own timeouts; the orchestrator never retries.
#[async_trait]
pub trait RecordCreator: Send + Sync {
    async fn create_admin(&self, payload: &AdminPayload) -> CreatorResult<PersistedAdmin>;

    async fn create_worker(&self, payload: &WorkerPayload) -> CreatorResult<PersistedWorker>;

    async fn create_client(&self, payload: &ClientPayload) -> CreatorResult<PersistedClient>;

    async fn create_loan(&self, payload: &LoanPayload) -> CreatorResult<PersistedLoan>;
}
