use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::orchestrator::{Progress, Step};
use crate::types::{EntityId, TermCode};

/// all events that can be emitted during a registration batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegistrationEvent {
    // batch lifecycle
    BatchStarted {
        batch_id: Uuid,
        workers: usize,
        clients: usize,
        timestamp: DateTime<Utc>,
    },
    BatchCompleted {
        batch_id: Uuid,
        progress: Progress,
        timestamp: DateTime<Utc>,
    },

    // record creation
    AdminCreated {
        id: EntityId,
        email: String,
    },
    WorkerCreated {
        worker: usize,
        id: EntityId,
        usuario_id: EntityId,
    },
    ClientCreated {
        worker: usize,
        client: usize,
        id: EntityId,
        trabajador_id: EntityId,
    },
    LoanCreated {
        worker: usize,
        client: usize,
        id: EntityId,
        cliente_id: EntityId,
        amount: Money,
        term: TermCode,
        is_historical: bool,
    },

    // failure
    StepFailed {
        step: Step,
        progress: Progress,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during a batch
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<RegistrationEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: RegistrationEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<RegistrationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[RegistrationEvent] {
        &self.events
    }
}
