//! Skip and close decision tables.
//!
//! `invoice_must_be_skipped` decides whether a billing month produces an
//! invoice line at all; `order_must_be_skipped` additionally holds pre-DRA
//! capped rentals in months 12–15 until the beneficiary election modifier
//! (`BP`/`BR`/`BU`) is on file; `order_must_be_closed` decides whether the
//! generator retires the order line after billing.

use chrono::NaiveDate;

use crate::core::SaleRentType;

use super::{dra_cutover, is_maintenance_month, normalize_month, oxygen_dos_cutover};

/// True when no invoice line is produced for this billing month.
pub fn invoice_must_be_skipped(
    delivery_date: NaiveDate,
    dos_from: NaiveDate,
    rent_type: SaleRentType,
    billing_month: i32,
) -> bool {
    let m = normalize_month(billing_month);

    match rent_type {
        SaleRentType::OneTimeSale | SaleRentType::ReOccurringSale | SaleRentType::OneTimeRental => {
            m > 1
        }
        SaleRentType::MedicareOxygenRental => {
            if delivery_date < dra_cutover() {
                dos_from >= oxygen_dos_cutover() && m > 36
            } else {
                m > 36
            }
        }
        SaleRentType::MonthlyRental => false,
        SaleRentType::RentToPurchase => m > 10,
        SaleRentType::CappedRental | SaleRentType::ParentalCappedRental => {
            if delivery_date < dra_cutover() {
                match m {
                    ..=15 => false,
                    16..=21 => true,
                    _ => !is_maintenance_month(m),
                }
            } else {
                m > 13
            }
        }
    }
}

/// True when the order line itself must not bill this month.
///
/// Same table as [`invoice_must_be_skipped`], except pre-DRA capped
/// rentals additionally hold in months 12–15 until the election modifier
/// is present in slot 3.
pub fn order_must_be_skipped(
    delivery_date: NaiveDate,
    dos_from: NaiveDate,
    rent_type: SaleRentType,
    billing_month: i32,
    modifier3: &str,
) -> bool {
    let m = normalize_month(billing_month);

    if rent_type.is_capped()
        && delivery_date < dra_cutover()
        && (12..=15).contains(&m)
        && !matches!(modifier3, "BP" | "BR" | "BU")
    {
        return true;
    }

    invoice_must_be_skipped(delivery_date, dos_from, rent_type, m)
}

/// True when the generator retires the order line after this billing
/// month.
///
/// Oxygen rentals stop paying at 36 months but the supplier obligation
/// runs to the 60-month reasonable useful lifetime; pre-DRA capped
/// rentals close early only on a purchase election (`BP`) in months
/// 12–13.
pub fn order_must_be_closed(
    delivery_date: NaiveDate,
    dos_from: NaiveDate,
    rent_type: SaleRentType,
    billing_month: i32,
    modifier3: &str,
) -> bool {
    let m = normalize_month(billing_month);

    match rent_type {
        SaleRentType::OneTimeSale | SaleRentType::ReOccurringSale | SaleRentType::OneTimeRental => {
            m >= 1
        }
        SaleRentType::MedicareOxygenRental => {
            if delivery_date < dra_cutover() {
                dos_from >= oxygen_dos_cutover() && m >= 36
            } else {
                m >= 60
            }
        }
        SaleRentType::MonthlyRental => false,
        SaleRentType::RentToPurchase => m >= 10,
        SaleRentType::CappedRental | SaleRentType::ParentalCappedRental => {
            if delivery_date < dra_cutover() {
                (m == 12 || m == 13) && modifier3 == "BP"
            } else {
                m >= 13
            }
        }
    }
}
