use chrono::{Duration, FixedOffset, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::config::TimezoneConfig;
use crate::errors::{RegistrationError, Result};

/// how the start date of a loan is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartDatePolicy {
    /// tomorrow in the reference timezone
    Automatic,
    /// the given calendar date, unshifted
    Explicit(NaiveDate),
}

/// the calendar span a loan covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// end date already passed: the loan is a backfilled historical record
    pub is_historical: bool,
}

/// resolves loan windows against a clock anchored to a fixed timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateResolver {
    offset: FixedOffset,
}

impl DateResolver {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// resolver for the configured reference timezone
    pub fn from_config(config: &TimezoneConfig) -> Result<Self> {
        Ok(Self::new(config.offset()?))
    }

    /// today's calendar date in the reference timezone
    pub fn today(&self, time: &SafeTimeProvider) -> NaiveDate {
        time.now().with_timezone(&self.offset).date_naive()
    }

    /// compute start, end and historical classification for a loan
    pub fn resolve_window(
        &self,
        policy: StartDatePolicy,
        term_days: u32,
        time: &SafeTimeProvider,
    ) -> Result<LoanWindow> {
        if term_days == 0 {
            return Err(RegistrationError::InvalidDate {
                message: "term must cover at least one day".to_string(),
            });
        }

        let today = self.today(time);

        let start_date = match policy {
            StartDatePolicy::Automatic => add_days(today, 1)?,
            StartDatePolicy::Explicit(date) => date,
        };
        let end_date = add_days(start_date, i64::from(term_days) - 1)?;

        Ok(LoanWindow {
            start_date,
            end_date,
            is_historical: end_date < today,
        })
    }
}

fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
        .ok_or_else(|| RegistrationError::InvalidDate {
            message: format!("{} + {} days is out of range", date, days),
        })
}
