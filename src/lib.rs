pub mod config;
pub mod creator;
pub mod decimal;
pub mod entities;
pub mod errors;
pub mod events;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod schedule;
pub mod service;
pub mod types;

// re-export key types
pub use config::{ApiConfig, LogFormat, LoggingConfig, RegistrationConfig, TimezoneConfig};
pub use creator::{
    CreatorError, HttpRecordCreator, InMemoryRecordCreator, RecordCreator, RemoteCategory,
    TransportKind,
};
pub use decimal::{Money, Rate};
pub use entities::{
    AdminPayload, ClientPayload, LoanPayload, PersistedAdmin, PersistedClient, PersistedLoan,
    PersistedWorker, WorkerPayload,
};
pub use errors::{RegistrationError, Result};
pub use events::{EventStore, RegistrationEvent};
pub use orchestrator::{execute, Orchestrator, Progress, ResultTree, Step};
pub use plan::{FieldIssue, IntentTree, PlanBuilder, RegistrationInput};
pub use report::{ErrorCategory, ErrorReport, RegistrationSummary};
pub use schedule::{compute_schedule, DateResolver, LoanWindow, RepaymentSchedule, StartDatePolicy};
pub use service::{RegistrationOutcome, RegistrationService};
pub use types::{EntityId, EntityKind, TermCode};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
