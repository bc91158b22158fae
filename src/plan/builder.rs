use hourglass_rs::SafeTimeProvider;
use tracing::debug;

use crate::entities::{AdminPayload, ClientPayload, LoanPayload, WorkerPayload};
use crate::errors::{RegistrationError, Result};
use crate::plan::input::{ClientInput, FieldIssue, RegistrationInput, WorkerInput};
use crate::plan::intent::{ClientIntent, IntentTree, LoanIntent, WorkerIntent};
use crate::schedule::{compute_schedule, DateResolver};
use crate::types::{AdminRole, LoanStatus, WorkerStatus, UNRESOLVED_ID};

/// turns raw input into an immutable intent tree
pub struct PlanBuilder<'a> {
    resolver: DateResolver,
    time: &'a SafeTimeProvider,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(resolver: DateResolver, time: &'a SafeTimeProvider) -> Self {
        Self { resolver, time }
    }

    /// build the plan; fails before any network call on a blank admin or worker email
    pub fn build_plan(&self, input: &RegistrationInput) -> Result<IntentTree> {
        ensure_emails_present(input)?;

        let admin = AdminPayload {
            name: input.admin.name.trim().to_string(),
            email: input.admin.email.trim().to_string(),
            password: input.admin.password.trim().to_string(),
            role: AdminRole::Admin,
        };

        let workers = input
            .workers
            .iter()
            .map(|worker| self.worker_intent(worker))
            .collect::<Result<Vec<_>>>()?;

        let plan = IntentTree { admin, workers };

        debug!(
            workers = plan.worker_count(),
            clients = plan.client_count(),
            "built registration plan"
        );

        Ok(plan)
    }

    fn worker_intent(&self, worker: &WorkerInput) -> Result<WorkerIntent> {
        let payload = WorkerPayload {
            name: worker.name.trim().to_string(),
            email: worker.email.trim().to_string(),
            phone: worker.phone.trim().to_string(),
            password: worker.password.trim().to_string(),
            status: WorkerStatus::Active,
            usuario_id: UNRESOLVED_ID,
        };

        let clients = worker
            .clients
            .iter()
            .map(|client| self.client_intent(client))
            .collect::<Result<Vec<_>>>()?;

        Ok(WorkerIntent { payload, clients })
    }

    fn client_intent(&self, client: &ClientInput) -> Result<ClientIntent> {
        let payload = ClientPayload {
            name: client.name.trim().to_string(),
            phone: client.phone.trim().to_string(),
            address: client.address.trim().to_string(),
            occupation: client.occupation.trim().to_string(),
            trabajador_id: UNRESOLVED_ID,
        };

        let loan = &client.loan;
        let schedule = compute_schedule(loan.amount, loan.term)?;
        let window = self
            .resolver
            .resolve_window(loan.start_policy()?, loan.term.days(), self.time)?;

        let loan_payload = LoanPayload {
            cliente_id: UNRESOLVED_ID,
            trabajador_id: UNRESOLVED_ID,
            amount: loan.amount,
            interest_rate: schedule.interest_rate,
            start_date: window.start_date,
            end_date: window.end_date,
            installment: schedule.installment(),
            notes: loan.notes.as_deref().map(str::trim).unwrap_or_default().to_string(),
            is_manual_historical_entry: window.is_historical,
            status: LoanStatus::Active,
            is_four_week_term: loan.term.is_four_weeks(),
        };

        Ok(ClientIntent {
            payload,
            loan: LoanIntent {
                payload: loan_payload,
                schedule,
                window,
            },
        })
    }
}

/// explicit blank-email guard, independent of schema validation
fn ensure_emails_present(input: &RegistrationInput) -> Result<()> {
    if input.admin.email.trim().is_empty() {
        return Err(RegistrationError::Validation {
            message: "the administrator email is required".to_string(),
            issues: vec![FieldIssue {
                path: "admin.email".to_string(),
                message: "email is required".to_string(),
            }],
        });
    }

    for (i, worker) in input.workers.iter().enumerate() {
        if worker.email.trim().is_empty() {
            let name = worker.name.trim();
            return Err(RegistrationError::Validation {
                message: format!(
                    "the email of worker {} ({}) is required",
                    i + 1,
                    if name.is_empty() { "unnamed" } else { name }
                ),
                issues: vec![FieldIssue {
                    path: format!("trabajadores[{}].email", i),
                    message: "email is required".to_string(),
                }],
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Money, Rate};
    use crate::types::TermCode;
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use serde_json::json;

    fn clock() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 10, 18, 0, 0).unwrap()
        ))
    }

    fn resolver() -> DateResolver {
        DateResolver::new(FixedOffset::west_opt(6 * 3600).unwrap())
    }

    fn input() -> RegistrationInput {
        serde_json::from_value(json!({
            "admin": { "nombre": "  Rosa Admin ", "email": " rosa@example.com ", "password": "secreto1" },
            "trabajadores": [
                {
                    "nombre": " Luis ",
                    "email": "luis@example.com",
                    "phone": " 5512345678 ",
                    "password": "secreto2",
                    "clientes": [
                        {
                            "nombre": " Marta ",
                            "telefono": "5587654321",
                            "direccion": " Calle 1 ",
                            "ocupacion": "Comerciante",
                            "prestamo": { "monto": 1000, "plazo": "15", "observaciones": " primer préstamo " }
                        },
                        {
                            "nombre": "Pedro",
                            "telefono": "5500000000",
                            "direccion": "Calle 2",
                            "ocupacion": "Chofer",
                            "prestamo": {
                                "monto": 2000,
                                "plazo": "28",
                                "useCustomStartDate": true,
                                "customStartDate": "2023-11-01"
                            }
                        }
                    ]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_plan_shape_and_trimming() {
        let time = clock();
        let plan = PlanBuilder::new(resolver(), &time).build_plan(&input()).unwrap();

        assert_eq!(plan.admin.name, "Rosa Admin");
        assert_eq!(plan.admin.email, "rosa@example.com");
        assert_eq!(plan.admin.role, AdminRole::Admin);
        assert_eq!(plan.worker_count(), 1);
        assert_eq!(plan.client_count(), 2);
        assert_eq!(plan.step_count(), 6);

        let worker = &plan.workers[0];
        assert_eq!(worker.payload.name, "Luis");
        assert_eq!(worker.payload.phone, "5512345678");
        assert_eq!(worker.payload.status, WorkerStatus::Active);

        let client = &worker.clients[0];
        assert_eq!(client.payload.name, "Marta");
        assert_eq!(client.payload.address, "Calle 1");
        assert_eq!(client.loan.payload.notes, "primer préstamo");
    }

    #[test]
    fn test_ids_are_placeholders() {
        let time = clock();
        let plan = PlanBuilder::new(resolver(), &time).build_plan(&input()).unwrap();

        for worker in &plan.workers {
            assert_eq!(worker.payload.usuario_id, UNRESOLVED_ID);
            for client in &worker.clients {
                assert_eq!(client.payload.trabajador_id, UNRESOLVED_ID);
                assert!(!client.loan.payload.has_resolved_parents());
            }
        }
    }

    #[test]
    fn test_daily_loan_fields() {
        let time = clock();
        let plan = PlanBuilder::new(resolver(), &time).build_plan(&input()).unwrap();
        let loan = &plan.workers[0].clients[0].loan.payload;

        assert_eq!(loan.amount, Money::from_major(1_000));
        assert_eq!(loan.interest_rate, Rate::from_percentage(38));
        assert_eq!(loan.installment, Money::from_major(92));
        assert_eq!(loan.start_date, NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
        assert_eq!(loan.end_date, NaiveDate::from_ymd_opt(2024, 1, 25).unwrap());
        assert!(!loan.is_manual_historical_entry);
        assert!(!loan.is_four_week_term);
        assert_eq!(loan.status, LoanStatus::Active);
    }

    #[test]
    fn test_four_week_historical_loan_fields() {
        let time = clock();
        let plan = PlanBuilder::new(resolver(), &time).build_plan(&input()).unwrap();
        let intent = &plan.workers[0].clients[1].loan;

        assert_eq!(intent.schedule.term, TermCode::FourWeeks);
        assert_eq!(intent.payload.installment, Money::from_major(700));
        assert_eq!(intent.payload.interest_rate, Rate::from_percentage(40));
        assert_eq!(intent.payload.start_date, NaiveDate::from_ymd_opt(2023, 11, 1).unwrap());
        assert_eq!(intent.payload.end_date, NaiveDate::from_ymd_opt(2023, 11, 28).unwrap());
        assert!(intent.payload.is_manual_historical_entry);
        assert!(intent.payload.is_four_week_term);
    }

    #[test]
    fn test_blank_admin_email_rejected() {
        let time = clock();
        let mut raw = input();
        raw.admin.email = "   ".to_string();

        let err = PlanBuilder::new(resolver(), &time).build_plan(&raw).unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::Validation { ref issues, .. } if issues[0].path == "admin.email"
        ));
    }

    #[test]
    fn test_blank_worker_email_names_the_worker() {
        let time = clock();
        let mut raw = input();
        raw.workers.push(WorkerInput {
            name: "Sofía".to_string(),
            ..WorkerInput::default()
        });

        let err = PlanBuilder::new(resolver(), &time).build_plan(&raw).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: the email of worker 2 (Sofía) is required"
        );
    }

    #[test]
    fn test_plan_is_deterministic_for_a_fixed_clock() {
        let time = clock();
        let builder = PlanBuilder::new(resolver(), &time);
        assert_eq!(builder.build_plan(&input()).unwrap(), builder.build_plan(&input()).unwrap());
    }

    #[test]
    fn test_redacted_masks_passwords() {
        let time = clock();
        let plan = PlanBuilder::new(resolver(), &time).build_plan(&input()).unwrap();
        let redacted = plan.redacted();

        assert_ne!(redacted.admin.password, plan.admin.password);
        assert!(!redacted.to_json_pretty().unwrap().contains("secreto"));
    }
}
