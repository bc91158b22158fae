use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::Money;
use crate::errors::{RegistrationError, Result};
use crate::schedule::{StartDatePolicy, MAXIMUM_PRINCIPAL};
use crate::types::TermCode;

/// smallest principal the form accepts
pub const MINIMUM_LOAN_AMOUNT: i64 = 1_000;

/// largest principal the form accepts
pub const MAXIMUM_LOAN_AMOUNT: i64 = MAXIMUM_PRINCIPAL;

/// raw submission as the presentation layer hands it over
///
/// Accepts english keys as well as the spanish keys of the registration form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationInput {
    #[serde(default)]
    pub admin: AdminInput,
    #[serde(alias = "trabajadores", default)]
    pub workers: Vec<WorkerInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminInput {
    #[serde(alias = "nombre")]
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerInput {
    #[serde(alias = "nombre")]
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    #[serde(alias = "clientes")]
    pub clients: Vec<ClientInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInput {
    #[serde(alias = "nombre", default)]
    pub name: String,
    #[serde(alias = "telefono", default)]
    pub phone: String,
    #[serde(alias = "direccion", default)]
    pub address: String,
    #[serde(alias = "ocupacion", default)]
    pub occupation: String,
    #[serde(alias = "prestamo")]
    pub loan: LoanInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    #[serde(alias = "monto")]
    pub amount: Money,
    #[serde(alias = "plazo")]
    pub term: TermCode,
    #[serde(alias = "observaciones", default)]
    pub notes: Option<String>,
    #[serde(alias = "useCustomStartDate", default)]
    pub use_custom_start_date: bool,
    #[serde(alias = "customStartDate", default)]
    pub custom_start_date: Option<String>,
}

/// a single schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// path into the input, e.g. `trabajadores[0].clientes[1].telefono`
    pub path: String,
    pub message: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl LoanInput {
    /// start-date policy chosen for this loan
    pub fn start_policy(&self) -> Result<StartDatePolicy> {
        match self.custom_start_date.as_deref().map(str::trim) {
            Some(raw) if self.use_custom_start_date && !raw.is_empty() => {
                parse_date(raw).map(StartDatePolicy::Explicit)
            }
            _ => Ok(StartDatePolicy::Automatic),
        }
    }
}

impl RegistrationInput {
    pub fn client_count(&self) -> usize {
        self.workers.iter().map(|w| w.clients.len()).sum()
    }

    /// schema validation, reporting every violation at once
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();

        min_chars(&mut issues, "admin.nombre", &self.admin.name, 2, "admin name is required");
        email(&mut issues, "admin.email", &self.admin.email, "admin email is invalid");
        min_chars(&mut issues, "admin.password", &self.admin.password, 6, "admin password needs at least 6 characters");

        if self.workers.is_empty() {
            issues.push(FieldIssue {
                path: "trabajadores".to_string(),
                message: "at least one worker is required".to_string(),
            });
        }

        for (i, worker) in self.workers.iter().enumerate() {
            let at = format!("trabajadores[{}]", i);
            min_chars(&mut issues, &format!("{}.nombre", at), &worker.name, 2, "name is required");
            email(&mut issues, &format!("{}.email", at), &worker.email, "email is invalid");
            min_chars(&mut issues, &format!("{}.phone", at), &worker.phone, 10, "phone is required");
            min_chars(&mut issues, &format!("{}.password", at), &worker.password, 6, "password needs at least 6 characters");

            for (j, client) in worker.clients.iter().enumerate() {
                let at = format!("{}.clientes[{}]", at, j);
                min_chars(&mut issues, &format!("{}.nombre", at), &client.name, 2, "name is required");
                min_chars(&mut issues, &format!("{}.telefono", at), &client.phone, 10, "phone is required");
                min_chars(&mut issues, &format!("{}.direccion", at), &client.address, 1, "address is required");
                min_chars(&mut issues, &format!("{}.ocupacion", at), &client.occupation, 2, "occupation is required");

                if client.loan.amount < Money::from_major(MINIMUM_LOAN_AMOUNT) {
                    issues.push(FieldIssue {
                        path: format!("{}.prestamo.monto", at),
                        message: format!("minimum amount is {}", MINIMUM_LOAN_AMOUNT),
                    });
                } else if client.loan.amount > Money::from_major(MAXIMUM_LOAN_AMOUNT) {
                    issues.push(FieldIssue {
                        path: format!("{}.prestamo.monto", at),
                        message: format!("maximum amount is {}", MAXIMUM_LOAN_AMOUNT),
                    });
                }
                if let Err(e) = client.loan.start_policy() {
                    issues.push(FieldIssue {
                        path: format!("{}.prestamo.customStartDate", at),
                        message: e.to_string(),
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(RegistrationError::Validation {
                message: format!("{} field(s) failed validation", issues.len()),
                issues,
            })
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        RegistrationError::validation(format!("start date '{}' is not a YYYY-MM-DD date", raw))
    })
}

fn min_chars(issues: &mut Vec<FieldIssue>, path: &str, value: &str, min: usize, message: &str) {
    if value.trim().chars().count() < min {
        issues.push(FieldIssue {
            path: path.to_string(),
            message: message.to_string(),
        });
    }
}

fn email(issues: &mut Vec<FieldIssue>, path: &str, value: &str, message: &str) {
    if !is_valid_email(value.trim()) {
        issues.push(FieldIssue {
            path: path.to_string(),
            message: message.to_string(),
        });
    }
}

/// structural email check: one `@`, non-empty local part, dotted domain
pub fn is_valid_email(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_input() -> RegistrationInput {
        serde_json::from_value(json!({
            "admin": { "nombre": "Rosa Admin", "email": "rosa@example.com", "password": "secreto1" },
            "trabajadores": [{
                "nombre": "Luis",
                "email": "luis@example.com",
                "phone": "5512345678",
                "password": "secreto2",
                "clientes": [{
                    "nombre": "Marta",
                    "telefono": "5587654321",
                    "direccion": "Calle 1",
                    "ocupacion": "Comerciante",
                    "prestamo": { "monto": 1000, "plazo": "15" }
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_spanish_form_keys() {
        let input = valid_input();

        assert_eq!(input.admin.name, "Rosa Admin");
        assert_eq!(input.workers.len(), 1);
        assert_eq!(input.workers[0].clients[0].loan.term, TermCode::Days15);
        assert_eq!(input.client_count(), 1);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_schema_violations_are_collected() {
        let mut input = valid_input();
        input.admin.password = "123".to_string();
        input.workers[0].email = "not-an-email".to_string();
        input.workers[0].clients[0].phone = "555".to_string();
        input.workers[0].clients[0].loan.amount = Money::from_major(500);

        let err = input.validate().unwrap_err();
        match err {
            RegistrationError::Validation { issues, .. } => {
                let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
                assert_eq!(
                    paths,
                    vec![
                        "admin.password",
                        "trabajadores[0].email",
                        "trabajadores[0].clientes[0].telefono",
                        "trabajadores[0].clientes[0].prestamo.monto",
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_at_least_one_worker() {
        let mut input = valid_input();
        input.workers.clear();

        let err = input.validate().unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::Validation { ref issues, .. } if issues[0].path == "trabajadores"
        ));
    }

    #[test]
    fn test_invalid_term_rejected_at_parse() {
        let result = serde_json::from_value::<LoanInput>(json!({ "monto": 1000, "plazo": "30" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_start_policy() {
        let mut loan = valid_input().workers[0].clients[0].loan.clone();
        assert_eq!(loan.start_policy().unwrap(), StartDatePolicy::Automatic);

        // a date without the flag is ignored
        loan.custom_start_date = Some("2024-01-02".to_string());
        assert_eq!(loan.start_policy().unwrap(), StartDatePolicy::Automatic);

        loan.use_custom_start_date = true;
        assert_eq!(
            loan.start_policy().unwrap(),
            StartDatePolicy::Explicit(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        );

        // the flag without a date falls back to automatic
        loan.custom_start_date = Some("  ".to_string());
        assert_eq!(loan.start_policy().unwrap(), StartDatePolicy::Automatic);

        loan.custom_start_date = Some("02/01/2024".to_string());
        assert!(loan.start_policy().is_err());
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("a@b.mx"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.mx"));
        assert!(!is_valid_email("a b@c.mx"));
        assert!(!is_valid_email("a@@b.mx"));
    }

    #[test]
    fn test_amount_above_maximum_rejected() {
        let mut input = valid_input();
        input.workers[0].clients[0].loan.amount =
            Money::from_str_exact("60000000000000000000000000000").unwrap();
        input.workers[0].clients[0].loan.term = TermCode::FourWeeks;

        match input.validate().unwrap_err() {
            RegistrationError::Validation { issues, .. } => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].path, "trabajadores[0].clientes[0].prestamo.monto");
                assert_eq!(issues[0].message, "maximum amount is 1000000000");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        input.workers[0].clients[0].loan.amount = Money::from_major(MAXIMUM_LOAN_AMOUNT);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_lengths_count_trimmed_text() {
        let mut input = valid_input();
        input.admin.password = "     a".to_string();
        input.workers[0].name = "  a ".to_string();
        input.workers[0].email = "  luis@example.com ".to_string();
        input.workers[0].clients[0].phone = " 55123456  ".to_string();

        match input.validate().unwrap_err() {
            RegistrationError::Validation { issues, .. } => {
                let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
                assert_eq!(
                    paths,
                    vec![
                        "admin.password",
                        "trabajadores[0].nombre",
                        "trabajadores[0].clientes[0].telefono",
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
