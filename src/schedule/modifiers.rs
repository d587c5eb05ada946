//! Claim-line modifier selection.
//!
//! Capped rentals carry computed HCPCS pricing modifiers: `RR` (rental)
//! switching to `MS` (maintenance and servicing) on cycle months, the
//! round indicators `KH`/`KI`/`KJ` in slot 2, and the DRA-era `KX`
//! (documentation on file) in slot 3 from month 12. Every other regime
//! echoes the modifiers stored on the order line.

use chrono::NaiveDate;

use crate::core::SaleRentType;

use super::{dra_cutover, is_maintenance_month, normalize_month};

/// Modifier for one claim-line slot (1..=4) of one billing month.
///
/// `mods` are the four modifiers stored on the order line; they are echoed
/// wherever no computed value applies. Slots outside 1..=4 yield an empty
/// modifier.
pub fn invoice_modifier(
    delivery_date: NaiveDate,
    rent_type: SaleRentType,
    billing_month: i32,
    slot: usize,
    mods: &[String; 4],
) -> String {
    if !(1..=4).contains(&slot) {
        return String::new();
    }
    if !rent_type.is_capped() {
        return mods[slot - 1].clone();
    }

    let m = normalize_month(billing_month);
    let cycle = is_maintenance_month(m);
    let pre_dra = delivery_date < dra_cutover();

    match slot {
        1 => {
            if cycle {
                "MS".into()
            } else {
                "RR".into()
            }
        }
        2 => {
            if m == 1 {
                "KH".into()
            } else if m <= 3 {
                "KI".into()
            } else if m <= 15 {
                "KJ".into()
            } else if cycle && mods[3] == "KX" {
                "KX".into()
            } else {
                String::new()
            }
        }
        3 => {
            if pre_dra {
                if cycle { String::new() } else { mods[2].clone() }
            } else if m >= 12 {
                "KX".into()
            } else {
                mods[2].clone()
            }
        }
        _ => {
            if pre_dra {
                if cycle { String::new() } else { mods[3].clone() }
            } else if m >= 12 {
                String::new()
            } else {
                mods[3].clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn no_mods() -> [String; 4] {
        [String::new(), String::new(), String::new(), String::new()]
    }

    fn post_dra() -> NaiveDate {
        date(2024, 1, 10)
    }

    #[test]
    fn slot_one_rental_then_maintenance() {
        let mods = no_mods();
        let m1 = |m| invoice_modifier(post_dra(), SaleRentType::CappedRental, m, 1, &mods);
        assert_eq!(m1(1), "RR");
        assert_eq!(m1(15), "RR");
        assert_eq!(m1(22), "MS");
        assert_eq!(m1(23), "RR");
        assert_eq!(m1(28), "MS");
    }

    #[test]
    fn slot_two_round_indicators() {
        let mods = no_mods();
        let m2 = |m| invoice_modifier(post_dra(), SaleRentType::CappedRental, m, 2, &mods);
        assert_eq!(m2(1), "KH");
        assert_eq!(m2(2), "KI");
        assert_eq!(m2(3), "KI");
        assert_eq!(m2(4), "KJ");
        assert_eq!(m2(15), "KJ");
        assert_eq!(m2(22), "");
    }

    #[test]
    fn slot_two_kx_carries_through_cycle() {
        let mut mods = no_mods();
        mods[3] = "KX".into();
        assert_eq!(
            invoice_modifier(post_dra(), SaleRentType::ParentalCappedRental, 22, 2, &mods),
            "KX"
        );
        assert_eq!(
            invoice_modifier(post_dra(), SaleRentType::ParentalCappedRental, 23, 2, &mods),
            ""
        );
    }

    #[test]
    fn slot_three_kx_from_month_twelve() {
        let mods = no_mods();
        let m3 = |m| invoice_modifier(post_dra(), SaleRentType::CappedRental, m, 3, &mods);
        assert_eq!(m3(11), "");
        assert_eq!(m3(12), "KX");
        assert_eq!(m3(22), "KX");
    }

    #[test]
    fn slot_three_pre_dra_blanks_cycle_months() {
        let mut mods = no_mods();
        mods[2] = "BU".into();
        let pre = date(2005, 6, 1);
        assert_eq!(
            invoice_modifier(pre, SaleRentType::CappedRental, 22, 3, &mods),
            ""
        );
        assert_eq!(
            invoice_modifier(pre, SaleRentType::CappedRental, 13, 3, &mods),
            "BU"
        );
    }

    #[test]
    fn slot_four_blank_from_month_twelve() {
        let mut mods = no_mods();
        mods[3] = "59".into();
        assert_eq!(
            invoice_modifier(post_dra(), SaleRentType::CappedRental, 11, 4, &mods),
            "59"
        );
        assert_eq!(
            invoice_modifier(post_dra(), SaleRentType::CappedRental, 12, 4, &mods),
            ""
        );
    }

    #[test]
    fn non_capped_types_echo_order_modifiers() {
        let mut mods = no_mods();
        mods[0] = "NU".into();
        mods[1] = "BP".into();
        assert_eq!(
            invoice_modifier(post_dra(), SaleRentType::MonthlyRental, 22, 1, &mods),
            "NU"
        );
        assert_eq!(
            invoice_modifier(post_dra(), SaleRentType::OneTimeSale, 1, 2, &mods),
            "BP"
        );
    }

    #[test]
    fn capped_month_four_scenario() {
        let mods = no_mods();
        let slots: Vec<String> = (1..=4)
            .map(|s| invoice_modifier(post_dra(), SaleRentType::CappedRental, 4, s, &mods))
            .collect();
        assert_eq!(slots, vec!["RR", "KJ", "", ""]);
    }
}
