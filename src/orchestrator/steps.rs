use serde::{Deserialize, Serialize};
use std::fmt;

use crate::plan::IntentTree;
use crate::types::EntityKind;

/// one creation call of the walk, addressed by its position in the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Admin,
    Worker { worker: usize },
    Client { worker: usize, client: usize },
    Loan { worker: usize, client: usize },
}

impl Step {
    pub fn entity(&self) -> EntityKind {
        match self {
            Step::Admin => EntityKind::Admin,
            Step::Worker { .. } => EntityKind::Worker,
            Step::Client { .. } => EntityKind::Client,
            Step::Loan { .. } => EntityKind::Loan,
        }
    }

    pub fn worker_index(&self) -> Option<usize> {
        match self {
            Step::Admin => None,
            Step::Worker { worker } | Step::Client { worker, .. } | Step::Loan { worker, .. } => {
                Some(*worker)
            }
        }
    }

    pub fn client_index(&self) -> Option<usize> {
        match self {
            Step::Client { client, .. } | Step::Loan { client, .. } => Some(*client),
            _ => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Admin => write!(f, "createAdmin"),
            Step::Worker { worker } => write!(f, "createWorker({})", worker),
            Step::Client { worker, client } => write!(f, "createClient({},{})", worker, client),
            Step::Loan { worker, client } => write!(f, "createLoan({},{})", worker, client),
        }
    }
}

/// depth-first, left-to-right list of every call a full run issues
pub fn plan_steps(plan: &IntentTree) -> Vec<Step> {
    let mut steps = Vec::with_capacity(plan.step_count());
    steps.push(Step::Admin);

    for (w, worker) in plan.workers.iter().enumerate() {
        steps.push(Step::Worker { worker: w });
        for c in 0..worker.clients.len() {
            steps.push(Step::Client { worker: w, client: c });
            steps.push(Step::Loan { worker: w, client: c });
        }
    }

    steps
}
