//! Record creator backed by the admin-panel HTTP endpoints

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::ApiConfig;
use crate::creator::{CreatorError, CreatorResult, RecordCreator, RemoteCategory, TransportKind};
use crate::entities::{
    AdminPayload, ClientPayload, LoanPayload, PersistedAdmin, PersistedClient, PersistedLoan,
    PersistedWorker, WorkerPayload,
};
use crate::errors::{RegistrationError, Result};
use crate::types::EntityKind;

/// error body returned by the service on non-success statuses
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    details: Option<String>,
    message: Option<String>,
    category: Option<String>,
}

#[derive(Debug)]
pub struct HttpRecordCreator {
    client: Client,
    base_url: String,
}

impl HttpRecordCreator {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let name = HeaderName::try_from(key.as_str()).map_err(|e| {
                RegistrationError::InvalidConfiguration {
                    message: format!("invalid header name '{}': {}", key, e),
                }
            })?;
            let value = HeaderValue::try_from(value.as_str()).map_err(|e| {
                RegistrationError::InvalidConfiguration {
                    message: format!("invalid value for header '{}': {}", key, e),
                }
            })?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| RegistrationError::InvalidConfiguration {
                message: format!("cannot build http client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    /// url the given entity is posted to
    pub fn endpoint(&self, entity: EntityKind) -> String {
        format!("{}/{}", self.base_url, entity_path(entity))
    }

    async fn post<P, R>(&self, entity: EntityKind, payload: &P) -> CreatorResult<R>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(entity);
        debug!("Creating {} via {}", entity, url);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!("HTTP request failed to {}: {}", url, e);
                transport_error(entity, &e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read response body from {}: {}", url, e);
            transport_error(entity, &e)
        })?;

        if !status.is_success() {
            error!("Service returned {} creating {}: {}", status, entity, body);
            return Err(remote_error(entity, status.as_u16(), &body));
        }

        let record = unwrap_envelope(entity, &body)?;
        info!("Created {} via {}", entity, url);
        Ok(record)
    }
}

#[async_trait]
impl RecordCreator for HttpRecordCreator {
    async fn create_admin(&self, payload: &AdminPayload) -> CreatorResult<PersistedAdmin> {
        self.post(EntityKind::Admin, payload).await
    }

    async fn create_worker(&self, payload: &WorkerPayload) -> CreatorResult<PersistedWorker> {
        self.post(EntityKind::Worker, payload).await
    }

    async fn create_client(&self, payload: &ClientPayload) -> CreatorResult<PersistedClient> {
        self.post(EntityKind::Client, payload).await
    }

    async fn create_loan(&self, payload: &LoanPayload) -> CreatorResult<PersistedLoan> {
        self.post(EntityKind::Loan, payload).await
    }
}

fn entity_path(entity: EntityKind) -> &'static str {
    match entity {
        EntityKind::Admin => "admin",
        EntityKind::Worker => "trabajador",
        EntityKind::Client => "cliente",
        EntityKind::Loan => "prestamo",
    }
}

/// key wrapping the created record in a success body
fn envelope_key(entity: EntityKind) -> &'static str {
    match entity {
        EntityKind::Admin => "user",
        EntityKind::Worker => "trabajador",
        EntityKind::Client => "client",
        EntityKind::Loan => "loan",
    }
}

fn transport_error(entity: EntityKind, err: &reqwest::Error) -> CreatorError {
    let kind = if err.is_timeout() {
        TransportKind::Timeout
    } else {
        TransportKind::Network
    };
    CreatorError::Transport {
        entity,
        kind,
        message: err.to_string(),
    }
}

fn remote_error(entity: EntityKind, status: u16, body: &str) -> CreatorError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let (message, details) = match parsed.error {
        Some(error) => (error, parsed.details.or(parsed.message)),
        None => match parsed.message {
            Some(message) => (message, parsed.details),
            None if !body.trim().is_empty() => (body.trim().to_string(), parsed.details),
            None => (format!("request failed with status code {}", status), parsed.details),
        },
    };

    CreatorError::Remote {
        entity,
        status,
        category: parsed.category.as_deref().map(RemoteCategory::parse),
        message,
        details,
    }
}

fn unwrap_envelope<R: DeserializeOwned>(entity: EntityKind, body: &str) -> CreatorResult<R> {
    let invalid = |message: String| CreatorError::InvalidResponse { entity, message };

    let mut value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| invalid(format!("body is not json: {}", e)))?;

    let key = envelope_key(entity);
    let record = value
        .get_mut(key)
        .map(serde_json::Value::take)
        .filter(|v| !v.is_null())
        .ok_or_else(|| invalid(format!("missing '{}' in response", key)))?;

    serde_json::from_value(record).map_err(|e| invalid(format!("malformed '{}': {}", key, e)))
}
