use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::decimal::{round_half_up, Money, Rate};
use crate::errors::{RegistrationError, Result};
use crate::schedule::RepaymentSchedule;
use crate::types::TermCode;

/// largest principal the calculator accepts
pub const MAXIMUM_PRINCIPAL: i64 = 1_000_000_000;

/// principal unit every per-term constant is scaled by
const BLOCK_SIZE: Decimal = dec!(1000);

/// daily fine per 1000 borrowed on the daily-billed terms
const DAILY_FINE_PER_BLOCK: Decimal = dec!(20);

/// weekly payment per 1000 borrowed on the 4 week term
const WEEKLY_PAYMENT_PER_BLOCK: Decimal = dec!(350);

/// weekly fine per 1000 borrowed on the 4 week term
const WEEKLY_FINE_PER_BLOCK: Decimal = dec!(120);

const WEEKS_IN_TERM: Decimal = dec!(4);
const DAYS_IN_WEEK: Decimal = dec!(7);
const DAYS_IN_FOUR_WEEKS: Decimal = dec!(28);

/// compute the repayment schedule for a principal and term
///
/// Intermediate values stay exact; each output field is rounded once. A
/// non-positive principal yields the all-zero schedule; a principal above
/// [`MAXIMUM_PRINCIPAL`] is rejected.
pub fn compute_schedule(principal: Money, term: TermCode) -> Result<RepaymentSchedule> {
    let maximum = Money::from_major(MAXIMUM_PRINCIPAL);
    if principal > maximum {
        return Err(RegistrationError::AmountOutOfRange {
            amount: principal,
            maximum,
        });
    }
    if !principal.is_positive() {
        return Ok(RepaymentSchedule::zero(principal, term));
    }

    let amount = principal.as_decimal();
    let blocks = amount / BLOCK_SIZE;

    Ok(match term.daily_rate_per_thousand() {
        Some(per_block) => daily_billed(principal, term, blocks, per_block),
        None => weekly_billed(principal, term, blocks),
    })
}

/// 15, 20 and 23 day terms: fixed daily installment per block
fn daily_billed(principal: Money, term: TermCode, blocks: Decimal, per_block: Decimal) -> RepaymentSchedule {
    let amount = principal.as_decimal();

    let daily_payment = blocks * per_block;
    let total_payment = daily_payment * Decimal::from(term.days());
    let total_interest = total_payment - amount;
    let interest_rate = total_interest / amount;
    let fine_per_day = round_half_up(amount / BLOCK_SIZE * DAILY_FINE_PER_BLOCK, 0);

    RepaymentSchedule {
        principal,
        term,
        total_interest: Money::from_decimal(total_interest),
        total_payment: Money::from_decimal(total_payment),
        daily_payment: Money::from_decimal(daily_payment),
        weekly_payment: Money::from_decimal(daily_payment * DAYS_IN_WEEK),
        interest_rate: Rate::from_decimal(interest_rate),
        fine_per_day_equivalent: Money::from_decimal(fine_per_day),
        weekly_fine: Money::from_decimal(round_half_up(fine_per_day * DAYS_IN_WEEK, 0)),
    }
}

/// 4 week term: independent weekly constants, daily fields are display only
fn weekly_billed(principal: Money, term: TermCode, blocks: Decimal) -> RepaymentSchedule {
    let amount = principal.as_decimal();

    let weekly_payment = blocks * WEEKLY_PAYMENT_PER_BLOCK;
    let total_payment = weekly_payment * WEEKS_IN_TERM;
    let total_interest = total_payment - amount;
    let interest_rate = total_interest / amount;
    let weekly_fine = blocks * WEEKLY_FINE_PER_BLOCK;

    RepaymentSchedule {
        principal,
        term,
        total_interest: Money::from_decimal(total_interest),
        total_payment: Money::from_decimal(total_payment),
        daily_payment: Money::from_decimal(total_payment / DAYS_IN_FOUR_WEEKS),
        weekly_payment: Money::from_decimal(weekly_payment),
        interest_rate: Rate::from_decimal(interest_rate),
        fine_per_day_equivalent: Money::from_decimal(round_half_up(weekly_fine / DAYS_IN_WEEK, 0)),
        weekly_fine: Money::from_decimal(round_half_up(weekly_fine, 0)),
    }
}
