//! Summaries and categorized error reports for the caller

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

use crate::creator::{CreatorError, RemoteCategory, TransportKind};
use crate::errors::RegistrationError;
use crate::orchestrator::{Progress, ResultTree, Step};

/// what a successful batch created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSummary {
    pub admin_name: String,
    pub admin_email: String,
    pub worker_count: usize,
    pub total_clients: usize,
    pub total_loans: usize,
    pub historical_loans: usize,
    pub future_loans: usize,
    pub workers: Vec<WorkerLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerLine {
    pub name: String,
    pub clients: usize,
}

impl RegistrationSummary {
    pub fn from_result(result: &ResultTree) -> Self {
        let historical_loans = result
            .loans()
            .filter(|loan| loan.is_manual_historical_entry)
            .count();

        Self {
            admin_name: result.admin.name.clone(),
            admin_email: result.admin.email.clone(),
            worker_count: result.worker_count(),
            total_clients: result.client_count(),
            total_loans: result.loan_count(),
            historical_loans,
            future_loans: result.loan_count() - historical_loans,
            workers: result
                .workers
                .iter()
                .map(|w| WorkerLine {
                    name: w.worker.name.clone(),
                    clients: w.clients.len(),
                })
                .collect(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = writeln!(out, "Bulk registration completed");
        let _ = writeln!(out, "Administrator: {} ({})", self.admin_name, self.admin_email);
        let _ = writeln!(out, "Workers created: {}", self.worker_count);
        let _ = writeln!(out, "Clients created: {}", self.total_clients);
        let _ = writeln!(
            out,
            "Loans created: {} ({} historical, {} current)",
            self.total_loans, self.historical_loans, self.future_loans
        );
        for (i, worker) in self.workers.iter().enumerate() {
            let _ = writeln!(out, "  {}. {} - {} client(s)", i + 1, worker.name, worker.clients);
        }
        out
    }
}

/// how a failure is presented to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    DuplicateEmail,
    Authentication,
    Validation,
    Network,
    Timeout,
    Unknown,
}

impl ErrorCategory {
    pub fn headline(&self) -> &'static str {
        match self {
            ErrorCategory::DuplicateEmail => "Duplicate email detected",
            ErrorCategory::Authentication => "Authentication error",
            ErrorCategory::Validation => "Validation error",
            ErrorCategory::Network => "Connection error",
            ErrorCategory::Timeout => "Request timed out",
            ErrorCategory::Unknown => "Unexpected error",
        }
    }

    fn advice(&self) -> &'static str {
        match self {
            ErrorCategory::DuplicateEmail => {
                "One of the emails is already registered. Check every email and try again."
            }
            ErrorCategory::Authentication => "The authentication system rejected the request. Try again.",
            ErrorCategory::Validation => "Some fields do not meet the requirements. Correct them and resubmit.",
            ErrorCategory::Network => {
                "The server could not be reached. Check the connection and that the server is running."
            }
            ErrorCategory::Timeout => "The server took too long to answer. Check the system and retry with less data.",
            ErrorCategory::Unknown => "Check the state of the system before trying again.",
        }
    }

    /// legacy classification of a free-text server message
    pub fn from_message(message: &str) -> Option<Self> {
        let lower = message.to_lowercase();
        if lower.contains("ya registrado") || lower.contains("already exists") {
            Some(ErrorCategory::DuplicateEmail)
        } else if message.contains("Auth") || lower.contains("autenticación") {
            Some(ErrorCategory::Authentication)
        } else if lower.contains("validation") || lower.contains("validación") || lower.contains("requerido") {
            Some(ErrorCategory::Validation)
        } else if message.contains("Network Error") || message.contains("ERR_NETWORK") {
            Some(ErrorCategory::Network)
        } else if lower.contains("timeout") {
            Some(ErrorCategory::Timeout)
        } else {
            None
        }
    }

    /// structured category first, message matching as the fallback
    pub fn classify(error: &RegistrationError) -> Self {
        match error {
            RegistrationError::Validation { .. }
            | RegistrationError::InvalidTermCode { .. }
            | RegistrationError::InvalidDate { .. }
            | RegistrationError::AmountOutOfRange { .. }
            | RegistrationError::Serialization(_) => ErrorCategory::Validation,
            RegistrationError::InvalidConfiguration { .. } => ErrorCategory::Unknown,
            RegistrationError::Creation { source, .. } => Self::from_creator_error(source),
        }
    }

    fn from_creator_error(error: &CreatorError) -> Self {
        match error {
            CreatorError::Remote {
                category,
                message,
                ..
            } => match category {
                Some(RemoteCategory::Duplicate) => ErrorCategory::DuplicateEmail,
                Some(RemoteCategory::Authentication) => ErrorCategory::Authentication,
                Some(RemoteCategory::Validation) => ErrorCategory::Validation,
                Some(RemoteCategory::Other) | None => {
                    Self::from_message(message).unwrap_or(ErrorCategory::Unknown)
                }
            },
            CreatorError::Transport { kind, .. } => match kind {
                TransportKind::Timeout => ErrorCategory::Timeout,
                TransportKind::Network => ErrorCategory::Network,
            },
            CreatorError::InvalidResponse { .. } => ErrorCategory::Unknown,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headline())
    }
}

/// a failure as shown to the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub category: ErrorCategory,
    pub headline: String,
    pub message: String,
    pub details: Option<String>,
    pub step: Option<Step>,
    /// zero-based position of the worker the failed step belongs to
    pub worker_index: Option<usize>,
    /// zero-based position of the client within that worker
    pub client_index: Option<usize>,
    pub progress: Option<Progress>,
    /// records may already exist remotely
    pub partial_records_warning: bool,
}

impl ErrorReport {
    pub fn from_error(error: &RegistrationError) -> Self {
        let category = ErrorCategory::classify(error);

        let (message, details, step, progress) = match error {
            RegistrationError::Creation {
                step,
                progress,
                source,
            } => {
                let (message, details) = match source {
                    CreatorError::Remote { message, details, .. } => (message.clone(), details.clone()),
                    other => (other.to_string(), None),
                };
                (message, details, Some(*step), Some(*progress))
            }
            RegistrationError::Validation { message, issues } => {
                let details = if issues.is_empty() {
                    None
                } else {
                    Some(
                        issues
                            .iter()
                            .map(|issue| issue.to_string())
                            .collect::<Vec<_>>()
                            .join("\n"),
                    )
                };
                (message.clone(), details, None, None)
            }
            other => (other.to_string(), None, None, None),
        };

        // a lost response may still have created the record
        let partial_records_warning = match progress {
            Some(p) => {
                p.any_created()
                    || matches!(
                        category,
                        ErrorCategory::Network | ErrorCategory::Timeout | ErrorCategory::Unknown
                    )
            }
            None => false,
        };

        Self {
            category,
            headline: category.headline().to_string(),
            message,
            details,
            step,
            worker_index: step.and_then(|s| s.worker_index()),
            client_index: step.and_then(|s| s.client_index()),
            progress,
            partial_records_warning,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.headline);
        let _ = writeln!(out, "{}", self.message);
        if let Some(details) = &self.details {
            let _ = writeln!(out, "Details: {}", details);
        }
        if let Some(step) = &self.step {
            let _ = writeln!(out, "Failed step: {}", step);
        }
        match (self.worker_index, self.client_index) {
            (Some(w), Some(c)) => {
                let _ = writeln!(out, "At: worker #{}, client #{}", w + 1, c + 1);
            }
            (Some(w), None) => {
                let _ = writeln!(out, "At: worker #{}", w + 1);
            }
            _ => {}
        }
        if let Some(progress) = &self.progress {
            let _ = writeln!(out, "Progress: {}", progress);
        }
        let _ = writeln!(out, "{}", self.category.advice());
        if self.partial_records_warning {
            let _ = writeln!(
                out,
                "WARNING: some records may have been created partially. Verify the system before retrying."
            );
        }
        out
    }
}
