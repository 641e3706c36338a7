//! Money helpers
//!
//! Amounts are `rust_decimal::Decimal` in major units (rupees). Payment
//! gateways speak integer minor units (paise).

use crate::error::{TuitionError, TuitionResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Minor units per major unit
pub const MINOR_PER_MAJOR: i64 = 100;

/// Largest single amount accepted anywhere, in major units
pub const MAX_AMOUNT_MAJOR: i64 = 1_000_000_000_000;

const OUT_OF_RANGE: &str = "Amount out of range.";

/// Largest single amount accepted anywhere
pub fn max_amount() -> Decimal {
    Decimal::from(MAX_AMOUNT_MAJOR)
}

/// Convert a major-unit amount to minor units, rounding half away from zero.
pub fn to_minor_units(amount: Decimal) -> TuitionResult<i64> {
    amount
        .checked_mul(Decimal::from(MINOR_PER_MAJOR))
        .and_then(|minor| {
            minor
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        })
        .ok_or_else(|| TuitionError::invalid("amount", OUT_OF_RANGE))
}

/// Sum amounts, failing instead of overflowing.
pub fn checked_total(field: &str, amounts: impl IntoIterator<Item = Decimal>) -> TuitionResult<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
        .ok_or_else(|| TuitionError::invalid(field, OUT_OF_RANGE))
}

/// Convert minor units back to a two-decimal major-unit amount.
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// Round to two decimals, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
