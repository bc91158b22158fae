use hourglass_rs::{SafeTimeProvider, TimeSource};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::RegistrationConfig;
use crate::creator::{HttpRecordCreator, RecordCreator};
use crate::decimal::Money;
use crate::errors::Result;
use crate::events::RegistrationEvent;
use crate::orchestrator::{Orchestrator, ResultTree};
use crate::plan::{IntentTree, PlanBuilder, RegistrationInput};
use crate::report::RegistrationSummary;
use crate::schedule::{compute_schedule, DateResolver, RepaymentSchedule};
use crate::types::TermCode;

/// everything a successful submission produced
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub result: ResultTree,
    pub summary: RegistrationSummary,
    pub events: Vec<RegistrationEvent>,
}

/// validate, plan and execute a bulk registration
pub struct RegistrationService {
    config: RegistrationConfig,
    resolver: DateResolver,
    creator: Arc<dyn RecordCreator>,
    time_provider: SafeTimeProvider,
}

impl RegistrationService {
    pub fn new(
        config: RegistrationConfig,
        creator: Arc<dyn RecordCreator>,
        time_provider: SafeTimeProvider,
    ) -> Result<Self> {
        config.validate()?;
        let resolver = DateResolver::from_config(&config.timezone)?;

        Ok(Self {
            config,
            resolver,
            creator,
            time_provider,
        })
    }

    /// service talking to the configured remote endpoints on the system clock
    pub fn with_http(config: RegistrationConfig) -> Result<Self> {
        let creator = HttpRecordCreator::new(&config.api)?;
        Self::new(
            config,
            Arc::new(creator),
            SafeTimeProvider::new(TimeSource::System),
        )
    }

    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    pub fn time_provider(&self) -> &SafeTimeProvider {
        &self.time_provider
    }

    pub fn quote(&self, principal: Money, term: TermCode) -> Result<RepaymentSchedule> {
        compute_schedule(principal, term)
    }

    /// schema validation followed by plan building; no remote calls
    pub fn plan(&self, input: &RegistrationInput) -> Result<IntentTree> {
        input.validate()?;
        PlanBuilder::new(self.resolver, &self.time_provider).build_plan(input)
    }

    pub async fn submit(&self, input: &RegistrationInput) -> Result<RegistrationOutcome> {
        let plan = self.plan(input)?;

        let mut orchestrator = Orchestrator::new(self.creator.as_ref());
        let executed = orchestrator.execute(&plan, &self.time_provider).await;
        let events = orchestrator.take_events();

        match executed {
            Ok(result) => {
                let summary = RegistrationSummary::from_result(&result);
                info!(
                    batch_id = %result.batch_id,
                    workers = summary.worker_count,
                    loans = summary.total_loans,
                    "bulk registration succeeded"
                );
                Ok(RegistrationOutcome {
                    result,
                    summary,
                    events,
                })
            }
            Err(e) => {
                if e.may_have_partial_records() {
                    warn!("registration aborted after partial creation: {}", e);
                }
                Err(e)
            }
        }
    }
}
