//! Sequential creation of a registration plan through a record creator

pub mod result;
pub mod steps;

use hourglass_rs::SafeTimeProvider;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::creator::{CreatorResult, RecordCreator};
use crate::entities::{PersistedAdmin, PersistedClient};
use crate::errors::{RegistrationError, Result};
use crate::events::{EventStore, RegistrationEvent};
use crate::plan::IntentTree;
use crate::types::{EntityId, UNRESOLVED_ID};

pub use result::{ClientResult, Progress, ResultTree, WorkerResult};
pub use steps::{plan_steps, Step};

/// records accumulated while walking the step list
#[derive(Debug, Default)]
struct Walk {
    admin: Option<PersistedAdmin>,
    workers: Vec<WorkerResult>,
    pending_client: Option<PersistedClient>,
    progress: Progress,
}

impl Walk {
    fn admin_id(&self) -> EntityId {
        self.admin.as_ref().map(|a| a.id).unwrap_or(UNRESOLVED_ID)
    }

    fn worker_id(&self, worker: usize) -> EntityId {
        self.workers
            .get(worker)
            .map(|w| w.worker.id)
            .unwrap_or(UNRESOLVED_ID)
    }

    fn client_id(&self) -> EntityId {
        self.pending_client
            .as_ref()
            .map(|c| c.id)
            .unwrap_or(UNRESOLVED_ID)
    }

    fn finish(self, batch_id: Uuid) -> Option<ResultTree> {
        Some(ResultTree {
            batch_id,
            admin: self.admin?,
            workers: self.workers,
        })
    }
}

/// walks a plan one creation call at a time, stopping at the first failure
pub struct Orchestrator<'a> {
    creator: &'a dyn RecordCreator,
    events: EventStore,
}

impl<'a> Orchestrator<'a> {
    pub fn new(creator: &'a dyn RecordCreator) -> Self {
        Self {
            creator,
            events: EventStore::new(),
        }
    }

    pub fn events(&self) -> &[RegistrationEvent] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<RegistrationEvent> {
        self.events.take_events()
    }

    /// create every record of the plan in depth-first order
    ///
    /// There are no retries and no rollback: on failure the error carries the
    /// failed step and how many records already exist.
    pub async fn execute(
        &mut self,
        plan: &IntentTree,
        time_provider: &SafeTimeProvider,
    ) -> Result<ResultTree> {
        let batch_id = Uuid::new_v4();
        let span = info_span!("registration_batch", %batch_id);

        self.walk(plan, batch_id, time_provider).instrument(span).await
    }

    async fn walk(
        &mut self,
        plan: &IntentTree,
        batch_id: Uuid,
        time_provider: &SafeTimeProvider,
    ) -> Result<ResultTree> {
        let steps = plan_steps(plan);
        info!(
            steps = steps.len(),
            workers = plan.worker_count(),
            clients = plan.client_count(),
            "starting registration batch"
        );
        self.events.emit(RegistrationEvent::BatchStarted {
            batch_id,
            workers: plan.worker_count(),
            clients: plan.client_count(),
            timestamp: time_provider.now(),
        });

        let mut walk = Walk::default();

        for step in steps {
            debug!(%step, "issuing creation call");

            if let Err(source) = self.run_step(plan, step, &mut walk).await {
                error!(%step, progress = %walk.progress, "creation call failed: {}", source);
                self.events.emit(RegistrationEvent::StepFailed {
                    step,
                    progress: walk.progress,
                    reason: source.to_string(),
                    timestamp: time_provider.now(),
                });
                return Err(RegistrationError::Creation {
                    step,
                    progress: walk.progress,
                    source,
                });
            }

            walk.progress.record(&step);
        }

        let progress = walk.progress;
        let result = walk
            .finish(batch_id)
            .ok_or_else(|| RegistrationError::validation("registration plan has no administrator"))?;

        self.events.emit(RegistrationEvent::BatchCompleted {
            batch_id,
            progress,
            timestamp: time_provider.now(),
        });
        info!(records = progress.total(), %progress, "registration batch completed");

        Ok(result)
    }

    async fn run_step(&mut self, plan: &IntentTree, step: Step, walk: &mut Walk) -> CreatorResult<()> {
        match step {
            Step::Admin => {
                let admin = self.creator.create_admin(&plan.admin).await?;
                self.events.emit(RegistrationEvent::AdminCreated {
                    id: admin.id,
                    email: admin.email.clone(),
                });
                walk.admin = Some(admin);
            }
            Step::Worker { worker } => {
                let mut payload = plan.workers[worker].payload.clone();
                payload.usuario_id = walk.admin_id();
                debug_assert!(payload.has_resolved_admin());

                let created = self.creator.create_worker(&payload).await?;
                self.events.emit(RegistrationEvent::WorkerCreated {
                    worker,
                    id: created.id,
                    usuario_id: payload.usuario_id,
                });
                walk.workers.push(WorkerResult {
                    worker: created,
                    clients: Vec::new(),
                });
            }
            Step::Client { worker, client } => {
                let mut payload = plan.workers[worker].clients[client].payload.clone();
                payload.trabajador_id = walk.worker_id(worker);
                debug_assert!(payload.has_resolved_worker());

                let created = self.creator.create_client(&payload).await?;
                self.events.emit(RegistrationEvent::ClientCreated {
                    worker,
                    client,
                    id: created.id,
                    trabajador_id: payload.trabajador_id,
                });
                walk.pending_client = Some(created);
            }
            Step::Loan { worker, client } => {
                let intent = &plan.workers[worker].clients[client].loan;
                let mut payload = intent.payload.clone();
                payload.cliente_id = walk.client_id();
                payload.trabajador_id = walk.worker_id(worker);
                debug_assert!(payload.has_resolved_parents());

                let loan = self.creator.create_loan(&payload).await?;
                self.events.emit(RegistrationEvent::LoanCreated {
                    worker,
                    client,
                    id: loan.id,
                    cliente_id: payload.cliente_id,
                    amount: payload.amount,
                    term: intent.schedule.term,
                    is_historical: intent.window.is_historical,
                });

                if let (Some(client), Some(slot)) =
                    (walk.pending_client.take(), walk.workers.get_mut(worker))
                {
                    slot.clients.push(ClientResult { client, loan });
                }
            }
        }

        Ok(())
    }
}

/// run a plan once, discarding the event log
pub async fn execute(
    plan: &IntentTree,
    creator: &dyn RecordCreator,
    time_provider: &SafeTimeProvider,
) -> Result<ResultTree> {
    Orchestrator::new(creator).execute(plan, time_provider).await
}
