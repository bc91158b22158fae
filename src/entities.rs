//! Record payloads sent to the remote service and the records it returns.
//!
//! Field names follow the remote service's JSON contract.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::decimal::{Money, Rate};
use crate::types::{AdminRole, EntityId, LoanStatus, WorkerStatus, UNRESOLVED_ID};

/// administrator account to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPayload {
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: AdminRole,
}

/// worker account to create, owned by an administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPayload {
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub status: WorkerStatus,
    pub usuario_id: EntityId,
}

/// client to create, assigned to a worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPayload {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "ocupacion")]
    pub occupation: String,
    pub trabajador_id: EntityId,
}

/// loan to create for a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanPayload {
    pub cliente_id: EntityId,
    pub trabajador_id: EntityId,
    #[serde(rename = "monto")]
    pub amount: Money,
    #[serde(rename = "interes")]
    pub interest_rate: Rate,
    #[serde(rename = "fecha_inicio")]
    pub start_date: NaiveDate,
    #[serde(rename = "fecha_fin")]
    pub end_date: NaiveDate,
    /// weekly installment on the 4 week term, daily installment otherwise
    #[serde(rename = "pago_diario")]
    pub installment: Money,
    #[serde(rename = "observaciones")]
    pub notes: String,
    #[serde(rename = "es_registro_manual")]
    pub is_manual_historical_entry: bool,
    #[serde(rename = "estado")]
    pub status: LoanStatus,
    #[serde(rename = "plazo_cuatro_semanas")]
    pub is_four_week_term: bool,
}

impl WorkerPayload {
    pub fn has_resolved_admin(&self) -> bool {
        self.usuario_id != UNRESOLVED_ID
    }
}

impl ClientPayload {
    pub fn has_resolved_worker(&self) -> bool {
        self.trabajador_id != UNRESOLVED_ID
    }
}

impl LoanPayload {
    pub fn has_resolved_parents(&self) -> bool {
        self.cliente_id != UNRESOLVED_ID && self.trabajador_id != UNRESOLVED_ID
    }
}

/// administrator as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedAdmin {
    pub id: EntityId,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// worker as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedWorker {
    pub id: EntityId,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub usuario_id: Option<EntityId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// client as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedClient {
    pub id: EntityId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub trabajador_id: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// loan as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedLoan {
    pub id: EntityId,
    pub cliente_id: EntityId,
    pub trabajador_id: EntityId,
    #[serde(rename = "monto")]
    pub amount: Money,
    #[serde(rename = "interes", default)]
    pub interest_rate: Option<Rate>,
    #[serde(rename = "fecha_inicio", default)]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "fecha_fin", default)]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "pago_diario", default)]
    pub installment: Option<Money>,
    #[serde(rename = "es_registro_manual", default)]
    pub is_manual_historical_entry: bool,
    #[serde(rename = "estado", default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// timestamp formats written by the service's database without an offset
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// read a record timestamp without ever rejecting the record
///
/// RFC 3339 values keep their offset; offset-less values are taken as UTC;
/// anything else becomes `None`.
fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(raw)) => raw,
        Some(other) => {
            debug!("ignoring non-text timestamp {}", other);
            return Ok(None);
        }
        None => return Ok(None),
    };
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    let naive = NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok());
    if naive.is_none() {
        debug!("ignoring unparseable timestamp '{}'", raw);
    }
    Ok(naive.map(|n| n.and_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_loan_payload_wire_format() {
        let payload = LoanPayload {
            cliente_id: 7,
            trabajador_id: 3,
            amount: Money::from_major(1_000),
            interest_rate: Rate::from_percentage(38),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 25).unwrap(),
            installment: Money::from_major(92),
            notes: String::new(),
            is_manual_historical_entry: false,
            status: LoanStatus::Active,
            is_four_week_term: false,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "cliente_id": 7,
                "trabajador_id": 3,
                "monto": 1000.0,
                "interes": 0.38,
                "fecha_inicio": "2024-01-11",
                "fecha_fin": "2024-01-25",
                "pago_diario": 92.0,
                "observaciones": "",
                "es_registro_manual": false,
                "estado": "activo",
                "plazo_cuatro_semanas": false
            })
        );
        assert!(payload.has_resolved_parents());
    }

    #[test]
    fn test_worker_payload_wire_format() {
        let payload = WorkerPayload {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: "5512345678".to_string(),
            password: "secreto".to_string(),
            status: WorkerStatus::Active,
            usuario_id: UNRESOLVED_ID,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["nombre"], "Ana");
        assert_eq!(value["status"], "active");
        assert_eq!(value["usuario_id"], 0);
        assert!(!payload.has_resolved_admin());
    }

    #[test]
    fn test_persisted_loan_accepts_text_numerics() {
        let loan: PersistedLoan = serde_json::from_value(json!({
            "id": 41,
            "cliente_id": 7,
            "trabajador_id": 3,
            "monto": "1000.00",
            "interes": "0.3800",
            "fecha_inicio": "2024-01-11",
            "fecha_fin": "2024-01-25",
            "pago_diario": 92,
            "es_registro_manual": false,
            "estado": "activo",
            "created_at": "2024-01-10T18:00:00Z"
        }))
        .unwrap();

        assert_eq!(loan.amount, Money::from_major(1_000));
        assert_eq!(loan.interest_rate, Some(Rate::from_percentage(38)));
        assert_eq!(loan.installment, Some(Money::from_major(92)));
        assert!(loan.created_at.is_some());
        assert!(loan.updated_at.is_none());
    }

    #[test]
    fn test_timestamps_never_reject_a_record() {
        let admin: PersistedAdmin = serde_json::from_value(json!({
            "id": 9,
            "nombre": "Rosa",
            "email": "rosa@example.com",
            "created_at": "2024-01-10T18:00:00.123456",
            "updated_at": "2024-01-10 18:00:00"
        }))
        .unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_micro_opt(18, 0, 0, 123_456)
            .unwrap()
            .and_utc();
        assert_eq!(admin.created_at, Some(expected));
        assert_eq!(
            admin.updated_at,
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap().and_hms_opt(18, 0, 0).map(|n| n.and_utc())
        );

        let client: PersistedClient = serde_json::from_value(json!({
            "id": 4,
            "nombre": "Marta",
            "created_at": "yesterday",
            "updated_at": 1704909600
        }))
        .unwrap();
        assert_eq!(client.created_at, None);
        assert_eq!(client.updated_at, None);

        let worker: PersistedWorker = serde_json::from_value(json!({
            "id": 2,
            "nombre": "Luis",
            "email": "luis@example.com",
            "created_at": "2024-01-10T12:00:00-06:00",
            "updated_at": null
        }))
        .unwrap();
        assert_eq!(worker.created_at, Some(Utc.with_ymd_and_hms(2024, 1, 10, 18, 0, 0).unwrap()));
        assert_eq!(worker.updated_at, None);
    }
}
