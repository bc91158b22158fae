pub mod calculator;
pub mod window;

use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::TermCode;

pub use calculator::{compute_schedule, MAXIMUM_PRINCIPAL};
pub use window::{DateResolver, LoanWindow, StartDatePolicy};

/// repayment schedule for a single loan
///
/// For the 4 week term only `weekly_payment` and `weekly_fine` are billed; the
/// daily fields are kept so every term exposes the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentSchedule {
    pub principal: Money,
    pub term: TermCode,
    pub total_interest: Money,
    pub total_payment: Money,
    pub daily_payment: Money,
    pub weekly_payment: Money,
    pub interest_rate: Rate,
    pub fine_per_day_equivalent: Money,
    pub weekly_fine: Money,
}

impl RepaymentSchedule {
    /// degenerate schedule for a non-positive principal
    pub fn zero(principal: Money, term: TermCode) -> Self {
        Self {
            principal,
            term,
            total_interest: Money::ZERO,
            total_payment: Money::ZERO,
            daily_payment: Money::ZERO,
            weekly_payment: Money::ZERO,
            interest_rate: Rate::ZERO,
            fine_per_day_equivalent: Money::ZERO,
            weekly_fine: Money::ZERO,
        }
    }

    /// the installment actually collected: weekly for 4 weeks, daily otherwise
    pub fn installment(&self) -> Money {
        if self.term.is_four_weeks() {
            self.weekly_payment
        } else {
            self.daily_payment
        }
    }
}
