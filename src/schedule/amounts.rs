//! Allowable/billable schedule amounts and period multipliers.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::{Frequency, SaleRentType};

use super::{is_maintenance_month, normalize_month, period_end, period_end2};

/// Payer-specific allowable amount for one billing month.
///
/// Flat-rate lines bill quantity 1. The capped-rental 75% phase (months
/// 4–15) applies to the allowable only; Rent-to-Purchase pays out the
/// remaining purchase price at month 10.
pub fn allowable_amount(
    rent_type: SaleRentType,
    billing_month: i32,
    price: Decimal,
    quantity: Decimal,
    sale_price: Decimal,
    flat_rate: bool,
) -> Decimal {
    let m = normalize_month(billing_month);
    let qty = if flat_rate { Decimal::ONE } else { quantity };

    match rent_type {
        SaleRentType::OneTimeSale | SaleRentType::ReOccurringSale | SaleRentType::OneTimeRental => {
            if m == 1 {
                price * qty
            } else {
                Decimal::ZERO
            }
        }
        SaleRentType::MedicareOxygenRental | SaleRentType::MonthlyRental => price * qty,
        SaleRentType::RentToPurchase => {
            if m <= 9 {
                price * qty
            } else if m == 10 {
                (sale_price - dec!(9) * price) * qty
            } else {
                Decimal::ZERO
            }
        }
        SaleRentType::CappedRental => {
            if m <= 3 {
                price * qty
            } else if m <= 15 {
                dec!(0.75) * price * qty
            } else if is_maintenance_month(m) {
                price * qty
            } else {
                Decimal::ZERO
            }
        }
        SaleRentType::ParentalCappedRental => {
            if m <= 15 || is_maintenance_month(m) {
                price * qty
            } else {
                Decimal::ZERO
            }
        }
    }
}

/// Nominal billable amount for one billing month.
///
/// Identical to [`allowable_amount`] except both capped regimes bill the
/// full price through month 15 — the 75% reduction never reaches the
/// charge side.
pub fn billable_amount(
    rent_type: SaleRentType,
    billing_month: i32,
    price: Decimal,
    quantity: Decimal,
    sale_price: Decimal,
    flat_rate: bool,
) -> Decimal {
    let m = normalize_month(billing_month);
    let qty = if flat_rate { Decimal::ONE } else { quantity };

    match rent_type {
        SaleRentType::CappedRental | SaleRentType::ParentalCappedRental => {
            if m <= 15 || is_maintenance_month(m) {
                price * qty
            } else {
                Decimal::ZERO
            }
        }
        _ => allowable_amount(rent_type, m, price, quantity, sale_price, flat_rate),
    }
}

/// Number of ordered periods contained in the billed period starting at
/// `from`. Scales an ordered-period price/quantity up to the invoice
/// period (e.g. ordered daily, billed monthly → the day count of that
/// month).
pub fn multiplier(
    from: NaiveDate,
    to: NaiveDate,
    ordered_when: Frequency,
    billed_when: Frequency,
) -> Decimal {
    if ordered_when == billed_when {
        return Decimal::ONE;
    }

    let span_days = match billed_when {
        // Custom periods are bounded by the order's inclusive DOS span.
        Frequency::Custom => (to - from).num_days() + 1,
        _ => (period_end(from, billed_when) - from).num_days(),
    };
    let span_days = span_days.max(0);

    match ordered_when {
        Frequency::Daily => Decimal::from(span_days),
        Frequency::Weekly => Decimal::from(span_days) / dec!(7),
        _ => Decimal::ONE,
    }
}

/// Multiplier applied to schedule amounts when generating an invoice line.
///
/// Fixed-rate rental regimes bill one period at a time. Sales scale by the
/// ordered-per-billed period count. A monthly rental billed daily bills
/// the exact day count to the next period start, clipped by the pickup
/// date when the equipment came back mid-period.
pub fn amount_multiplier(
    from: NaiveDate,
    to: NaiveDate,
    pickup_date: Option<NaiveDate>,
    rent_type: SaleRentType,
    ordered_when: Frequency,
    billed_when: Frequency,
) -> Decimal {
    if rent_type.is_sale() {
        return multiplier(from, to, ordered_when, billed_when);
    }
    match rent_type {
        SaleRentType::MonthlyRental if billed_when == Frequency::Daily => {
            let end = period_end2(from, pickup_date, Frequency::Monthly);
            Decimal::from((end - from).num_days().max(0))
        }
        _ => Decimal::ONE,
    }
}

/// Multiplier applied to the billed quantity when generating an invoice
/// line. Quantities scale the same way amounts do.
pub fn quantity_multiplier(
    from: NaiveDate,
    to: NaiveDate,
    pickup_date: Option<NaiveDate>,
    rent_type: SaleRentType,
    ordered_when: Frequency,
    billed_when: Frequency,
) -> Decimal {
    amount_multiplier(from, to, pickup_date, rent_type, ordered_when, billed_when)
}
