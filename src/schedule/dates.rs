//! Billing-cycle date rolls.
//!
//! All spans are inclusive (`DOSFrom..=DOSTo`); `period_end` is the
//! exclusive start of the following period, which is what day-count
//! multipliers measure against.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::core::Frequency;

/// Start of the billing period that follows the `from..=to` span.
///
/// `Custom` spans continue the day after `to`; `Calendar Monthly` snaps to
/// the first of the next month; `One time` does not advance.
pub fn next_dos_from(from: NaiveDate, to: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::OneTime => from,
        Frequency::Daily => from + Days::new(1),
        Frequency::Weekly => from + Days::new(7),
        Frequency::Monthly => from + Months::new(1),
        Frequency::CalendarMonthly => first_of_next_month(from),
        Frequency::Quarterly => from + Months::new(3),
        Frequency::SemiAnnually => from + Months::new(6),
        Frequency::Annually => from + Months::new(12),
        Frequency::Custom => to + Days::new(1),
    }
}

/// Inclusive end of the billing period that starts at `from`.
///
/// For `Custom`, the reference span `from..=to` fixes the period length.
/// `Calendar Monthly` snaps to the last day of the month.
pub fn new_dos_to(from: NaiveDate, to: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::OneTime => to,
        Frequency::Daily => from,
        Frequency::Weekly => from + Days::new(6),
        Frequency::Monthly => from + Months::new(1) - Days::new(1),
        Frequency::CalendarMonthly => first_of_next_month(from) - Days::new(1),
        Frequency::Quarterly => from + Months::new(3) - Days::new(1),
        Frequency::SemiAnnually => from + Months::new(6) - Days::new(1),
        Frequency::Annually => from + Months::new(12) - Days::new(1),
        Frequency::Custom => from + (to - from),
    }
}

/// Inclusive end of the period that follows the `from..=to` span: the
/// `DOSTo` the order line advances to. Custom periods keep their span
/// length.
pub fn next_dos_to(from: NaiveDate, to: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Custom => next_dos_from(from, to, frequency) + (to - from),
        _ => new_dos_to(next_dos_from(from, to, frequency), to, frequency),
    }
}

/// Exclusive end (next-period start) of the period beginning at `from`.
pub fn period_end(from: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::OneTime | Frequency::Daily | Frequency::Custom => from + Days::new(1),
        Frequency::Weekly => from + Days::new(7),
        Frequency::Monthly => from + Months::new(1),
        Frequency::CalendarMonthly => first_of_next_month(from),
        Frequency::Quarterly => from + Months::new(3),
        Frequency::SemiAnnually => from + Months::new(6),
        Frequency::Annually => from + Months::new(12),
    }
}

/// [`period_end`] clamped by a pickup date: equipment returned mid-period
/// bills through the pickup day and no further.
pub fn period_end2(
    from: NaiveDate,
    pickup_date: Option<NaiveDate>,
    frequency: Frequency,
) -> NaiveDate {
    let end = period_end(from, frequency);
    match pickup_date {
        Some(pickup) if pickup + Days::new(1) < end => pickup + Days::new(1),
        _ => end,
    }
}

fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}
