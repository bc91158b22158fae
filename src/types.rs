use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::RegistrationError;

/// identifier assigned by the remote persistence service
pub type EntityId = i64;

/// placeholder id carried by intents until the orchestrator resolves the parent
pub const UNRESOLVED_ID: EntityId = 0;

/// repayment term selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermCode {
    /// 15 days, billed daily
    Days15,
    /// 20 days, billed daily
    Days20,
    /// 23 days, billed daily
    Days23,
    /// 4 weeks (28 calendar days), billed weekly
    FourWeeks,
}

impl TermCode {
    pub const ALL: [TermCode; 4] = [
        TermCode::Days15,
        TermCode::Days20,
        TermCode::Days23,
        TermCode::FourWeeks,
    ];

    /// the code as the operator selects it
    pub fn code(&self) -> u32 {
        match self {
            TermCode::Days15 => 15,
            TermCode::Days20 => 20,
            TermCode::Days23 => 23,
            TermCode::FourWeeks => 28,
        }
    }

    /// calendar days covered by the loan
    pub fn days(&self) -> u32 {
        self.code()
    }

    /// true for the weekly-billed 4 week term
    pub fn is_four_weeks(&self) -> bool {
        matches!(self, TermCode::FourWeeks)
    }

    /// daily payment owed per 1000 borrowed, `None` for the weekly term
    pub fn daily_rate_per_thousand(&self) -> Option<Decimal> {
        match self {
            TermCode::Days15 => Some(dec!(92)),
            TermCode::Days20 => Some(dec!(65)),
            TermCode::Days23 => Some(dec!(60)),
            TermCode::FourWeeks => None,
        }
    }
}

impl TryFrom<u32> for TermCode {
    type Error = RegistrationError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            15 => Ok(TermCode::Days15),
            20 => Ok(TermCode::Days20),
            23 => Ok(TermCode::Days23),
            28 => Ok(TermCode::FourWeeks),
            other => Err(RegistrationError::InvalidTermCode {
                code: other.to_string(),
            }),
        }
    }
}

impl FromStr for TermCode {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<u32>()
            .map_err(|_| RegistrationError::InvalidTermCode {
                code: trimmed.to_string(),
            })
            .and_then(TermCode::try_from)
    }
}

impl fmt::Display for TermCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermCode::FourWeeks => write!(f, "4 weeks"),
            other => write!(f, "{} days", other.code()),
        }
    }
}

impl Serialize for TermCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.code())
    }
}

// the form sends the term as a string ("15"), other callers as a number
impl<'de> Deserialize<'de> for TermCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u32),
            Text(String),
        }

        let parsed = match Repr::deserialize(deserializer)? {
            Repr::Number(n) => TermCode::try_from(n),
            Repr::Text(s) => s.parse(),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

/// role of the top-level account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    #[default]
    Admin,
}

/// worker account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    #[default]
    Active,
}

/// loan status as the remote service spells it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LoanStatus {
    #[default]
    #[serde(rename = "activo", alias = "active")]
    Active,
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "admin")
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "active")
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "activo")
    }
}

/// the four kinds of record the remote service can create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Admin,
    Worker,
    Client,
    Loan,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Admin => "admin",
            EntityKind::Worker => "worker",
            EntityKind::Client => "client",
            EntityKind::Loan => "loan",
        };
        write!(f, "{}", name)
    }
}
