//! In-process record creator used for dry runs and tests

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::creator::{CreatorError, CreatorResult, RecordCreator, RemoteCategory};
use crate::entities::{
    AdminPayload, ClientPayload, LoanPayload, PersistedAdmin, PersistedClient, PersistedLoan,
    PersistedWorker, WorkerPayload,
};
use crate::types::{EntityId, EntityKind};

/// one call received by the in-memory creator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub kind: EntityKind,
    /// name of the record, or "cliente #n" for loans
    pub label: String,
    /// parent id carried by the payload, if any
    pub parent_id: Option<EntityId>,
    /// id assigned on success
    pub assigned_id: Option<EntityId>,
}

#[derive(Debug)]
struct InjectedFailure {
    kind: EntityKind,
    occurrence: usize,
    error: CreatorError,
}

#[derive(Debug, Default)]
struct State {
    next_id: EntityId,
    emails: HashSet<String>,
    calls: Vec<RecordedCall>,
    failures: Vec<InjectedFailure>,
}

impl State {
    fn seen(&self, kind: EntityKind) -> usize {
        self.calls.iter().filter(|c| c.kind == kind).count()
    }

    /// records the call and either returns a fresh id or the injected failure
    fn admit(
        &mut self,
        kind: EntityKind,
        label: String,
        parent_id: Option<EntityId>,
        email: Option<&str>,
    ) -> CreatorResult<EntityId> {
        let occurrence = self.seen(kind);
        let mut call = RecordedCall {
            kind,
            label,
            parent_id,
            assigned_id: None,
        };

        if let Some(pos) = self
            .failures
            .iter()
            .position(|f| f.kind == kind && f.occurrence == occurrence)
        {
            let failure = self.failures.remove(pos);
            self.calls.push(call);
            return Err(failure.error);
        }

        if let Some(email) = email {
            let key = email.to_ascii_lowercase();
            if self.emails.contains(&key) {
                self.calls.push(call);
                return Err(CreatorError::Remote {
                    entity: kind,
                    status: 409,
                    category: Some(RemoteCategory::Duplicate),
                    message: "Email ya registrado".to_string(),
                    details: Some(email.to_string()),
                });
            }
            self.emails.insert(key);
        }

        self.next_id += 1;
        call.assigned_id = Some(self.next_id);
        self.calls.push(call);
        Ok(self.next_id)
    }
}

/// record creator keeping everything in memory with sequential ids
///
/// Emails are unique across admins and workers, case-insensitively.
#[derive(Debug, Default)]
pub struct InMemoryRecordCreator {
    state: Mutex<State>,
}

impl InMemoryRecordCreator {
    pub fn new() -> Self {
        Self::default()
    }

    /// treat an email as already registered
    pub fn with_existing_email(self, email: &str) -> Self {
        self.lock().emails.insert(email.trim().to_ascii_lowercase());
        self
    }

    /// fail the `occurrence`-th (zero-based) call for `kind` with `error`
    pub fn fail_on(self, kind: EntityKind, occurrence: usize, error: CreatorError) -> Self {
        self.lock().failures.push(InjectedFailure {
            kind,
            occurrence,
            error,
        });
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// successful creations of the given kind
    pub fn count(&self, kind: EntityKind) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.kind == kind && c.assigned_id.is_some())
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RecordCreator for InMemoryRecordCreator {
    async fn create_admin(&self, payload: &AdminPayload) -> CreatorResult<PersistedAdmin> {
        let id = self.lock().admit(
            EntityKind::Admin,
            payload.name.clone(),
            None,
            Some(&payload.email),
        )?;
        debug!(id, "stored admin in memory");

        Ok(PersistedAdmin {
            id,
            name: payload.name.clone(),
            email: payload.email.clone(),
            role: Some(payload.role.to_string()),
            status: Some("active".to_string()),
            created_at: None,
            updated_at: None,
        })
    }

    async fn create_worker(&self, payload: &WorkerPayload) -> CreatorResult<PersistedWorker> {
        let id = self.lock().admit(
            EntityKind::Worker,
            payload.name.clone(),
            Some(payload.usuario_id),
            Some(&payload.email),
        )?;
        debug!(id, "stored worker in memory");

        Ok(PersistedWorker {
            id,
            name: payload.name.clone(),
            email: payload.email.clone(),
            phone: Some(payload.phone.clone()),
            usuario_id: Some(payload.usuario_id),
            status: Some(payload.status.to_string()),
            created_at: None,
            updated_at: None,
        })
    }

    async fn create_client(&self, payload: &ClientPayload) -> CreatorResult<PersistedClient> {
        let id = self.lock().admit(
            EntityKind::Client,
            payload.name.clone(),
            Some(payload.trabajador_id),
            None,
        )?;
        debug!(id, "stored client in memory");

        Ok(PersistedClient {
            id,
            name: payload.name.clone(),
            phone: Some(payload.phone.clone()),
            trabajador_id: Some(payload.trabajador_id),
            created_at: None,
            updated_at: None,
        })
    }

    async fn create_loan(&self, payload: &LoanPayload) -> CreatorResult<PersistedLoan> {
        let id = self.lock().admit(
            EntityKind::Loan,
            format!("cliente #{}", payload.cliente_id),
            Some(payload.cliente_id),
            None,
        )?;
        debug!(id, "stored loan in memory");

        Ok(PersistedLoan {
            id,
            cliente_id: payload.cliente_id,
            trabajador_id: payload.trabajador_id,
            amount: payload.amount,
            interest_rate: Some(payload.interest_rate),
            start_date: Some(payload.start_date),
            end_date: Some(payload.end_date),
            installment: Some(payload.installment),
            is_manual_historical_entry: payload.is_manual_historical_entry,
            status: Some(payload.status.to_string()),
            created_at: None,
            updated_at: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creator::TransportKind;
    use crate::types::{AdminRole, WorkerStatus};

    fn admin(email: &str) -> AdminPayload {
        AdminPayload {
            name: "Rosa".to_string(),
            email: email.to_string(),
            password: "secreto1".to_string(),
            role: AdminRole::Admin,
        }
    }

    fn worker(email: &str, usuario_id: EntityId) -> WorkerPayload {
        WorkerPayload {
            name: "Luis".to_string(),
            email: email.to_string(),
            phone: "5512345678".to_string(),
            password: "secreto2".to_string(),
            status: WorkerStatus::Active,
            usuario_id,
        }
    }

    #[tokio::test]
    async fn test_sequential_ids_and_call_log() {
        let creator = InMemoryRecordCreator::new();

        let admin = creator.create_admin(&admin("rosa@example.com")).await.unwrap();
        let worker = creator.create_worker(&worker("luis@example.com", admin.id)).await.unwrap();

        assert_eq!(admin.id, 1);
        assert_eq!(worker.id, 2);
        assert_eq!(worker.usuario_id, Some(1));

        let calls = creator.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].kind, EntityKind::Worker);
        assert_eq!(calls[1].parent_id, Some(1));
        assert_eq!(creator.count(EntityKind::Worker), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let creator = InMemoryRecordCreator::new().with_existing_email("Luis@Example.com");

        creator.create_admin(&admin("rosa@example.com")).await.unwrap();
        let err = creator
            .create_worker(&worker("luis@example.com", 1))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(409));
        assert!(matches!(
            err,
            CreatorError::Remote { category: Some(RemoteCategory::Duplicate), .. }
        ));
        assert_eq!(creator.count(EntityKind::Worker), 0);
        assert_eq!(creator.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let failure = CreatorError::Transport {
            entity: EntityKind::Worker,
            kind: TransportKind::Network,
            message: "connection refused".to_string(),
        };
        let creator = InMemoryRecordCreator::new().fail_on(EntityKind::Worker, 1, failure.clone());

        creator.create_worker(&worker("a@example.com", 1)).await.unwrap();
        let err = creator.create_worker(&worker("b@example.com", 1)).await.unwrap_err();
        assert_eq!(err, failure);

        creator.create_worker(&worker("c@example.com", 1)).await.unwrap();
        assert_eq!(creator.count(EntityKind::Worker), 2);
    }
}
