use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::entities::{PersistedAdmin, PersistedClient, PersistedLoan, PersistedWorker};
use crate::orchestrator::Step;

/// how many records of each kind were created so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub admins: usize,
    pub workers: usize,
    pub clients: usize,
    pub loans: usize,
}

impl Progress {
    pub fn any_created(&self) -> bool {
        self.admins + self.workers + self.clients + self.loans > 0
    }

    pub fn total(&self) -> usize {
        self.admins + self.workers + self.clients + self.loans
    }

    /// count one successful call
    pub fn record(&mut self, step: &Step) {
        match step {
            Step::Admin => self.admins += 1,
            Step::Worker { .. } => self.workers += 1,
            Step::Client { .. } => self.clients += 1,
            Step::Loan { .. } => self.loans += 1,
        }
    }
}

fn counted(f: &mut fmt::Formatter<'_>, n: usize, noun: &str) -> fmt::Result {
    if n == 1 {
        write!(f, "1 {}", noun)
    } else {
        write!(f, "{} {}s", n, noun)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        counted(f, self.admins, "admin")?;
        write!(f, ", ")?;
        counted(f, self.workers, "worker")?;
        write!(f, ", ")?;
        counted(f, self.clients, "client")?;
        write!(f, ", ")?;
        counted(f, self.loans, "loan")?;
        write!(f, " created")
    }
}

/// persisted records mirroring the plan's shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTree {
    pub batch_id: Uuid,
    pub admin: PersistedAdmin,
    pub workers: Vec<WorkerResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResult {
    pub worker: PersistedWorker,
    pub clients: Vec<ClientResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientResult {
    pub client: PersistedClient,
    pub loan: PersistedLoan,
}

impl ResultTree {
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn client_count(&self) -> usize {
        self.workers.iter().map(|w| w.clients.len()).sum()
    }

    pub fn loan_count(&self) -> usize {
        self.client_count()
    }

    pub fn loans(&self) -> impl Iterator<Item = &PersistedLoan> {
        self.workers
            .iter()
            .flat_map(|w| w.clients.iter().map(|c| &c.loan))
    }

    pub fn progress(&self) -> Progress {
        Progress {
            admins: 1,
            workers: self.worker_count(),
            clients: self.client_count(),
            loans: self.loan_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_display() {
        let progress = Progress {
            admins: 1,
            workers: 1,
            clients: 1,
            loans: 1,
        };
        assert_eq!(progress.to_string(), "1 admin, 1 worker, 1 client, 1 loan created");

        let progress = Progress {
            admins: 1,
            workers: 2,
            clients: 0,
            loans: 0,
        };
        assert_eq!(progress.to_string(), "1 admin, 2 workers, 0 clients, 0 loans created");
    }

    #[test]
    fn test_progress_record() {
        let mut progress = Progress::default();
        assert!(!progress.any_created());

        progress.record(&Step::Admin);
        progress.record(&Step::Worker { worker: 0 });
        progress.record(&Step::Client { worker: 0, client: 0 });

        assert!(progress.any_created());
        assert_eq!(progress.total(), 3);
        assert_eq!(progress.loans, 0);
    }
}
