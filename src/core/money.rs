//! Two-decimal money helpers.
//!
//! All amounts in the engine are [`rust_decimal::Decimal`] — never floating
//! point. A cent is the smallest observable unit: anything with an absolute
//! value below `0.01` is "zero" for balance and current-payer decisions.

use rust_decimal::{Decimal, RoundingStrategy};

/// The domain zero threshold: one cent.
pub fn cent() -> Decimal {
    Decimal::new(1, 2)
}

/// True when `amount` is zero at money resolution (`|amount| < 0.01`).
pub fn is_zero_amount(amount: Decimal) -> bool {
    amount.abs() < cent()
}

/// Round to two decimal places, half-up (commercial rounding).
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
