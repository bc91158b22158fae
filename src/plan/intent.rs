use serde::{Deserialize, Serialize};

use crate::entities::{AdminPayload, ClientPayload, LoanPayload, WorkerPayload};
use crate::schedule::{LoanWindow, RepaymentSchedule};

const REDACTED: &str = "********";

/// fully resolved records to create, in creation order
///
/// Parent ids are still placeholders; the orchestrator fills them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentTree {
    pub admin: AdminPayload,
    pub workers: Vec<WorkerIntent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerIntent {
    pub payload: WorkerPayload,
    pub clients: Vec<ClientIntent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientIntent {
    pub payload: ClientPayload,
    pub loan: LoanIntent,
}

/// loan payload plus the schedule and window it was derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanIntent {
    pub payload: LoanPayload,
    pub schedule: RepaymentSchedule,
    pub window: LoanWindow,
}

impl IntentTree {
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn client_count(&self) -> usize {
        self.workers.iter().map(|w| w.clients.len()).sum()
    }

    /// every client carries exactly one loan
    pub fn loan_count(&self) -> usize {
        self.client_count()
    }

    /// total number of creation calls a full run issues
    pub fn step_count(&self) -> usize {
        1 + self.worker_count() + 2 * self.client_count()
    }

    /// copy with passwords masked, for printing
    pub fn redacted(&self) -> Self {
        let mut tree = self.clone();
        tree.admin.password = REDACTED.to_string();
        for worker in &mut tree.workers {
            worker.payload.password = REDACTED.to_string();
        }
        tree
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
