//! Month arithmetic used for cadence checks and horizon extension.

use chrono::{Datelike, Months, NaiveDate};

/// Last calendar day of `year-month`.
pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// First calendar day of `year-month`.
pub fn month_start(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Whole calendar months from `from` to `to` (negative if `to` is earlier).
///
/// Day-of-month is ignored: 2024-01-31 -> 2024-02-01 is one month.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let years = i64::from(to.year()) - i64::from(from.year());
    years * 12 + i64::from(to.month()) - i64::from(from.month())
}

/// Fractional calendar year, e.g. 2024-07-01 -> ~2024.497.
///
/// Used as the shared x coordinate for charts.
pub fn decimal_year(date: NaiveDate) -> f64 {
    let year = date.year();
    let days_in_year = days_in_year(year);
    f64::from(year) + f64::from(date.ordinal0()) / days_in_year
}

/// Inverse of [`decimal_year`] at day precision (for axis labels).
pub fn from_decimal_year(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    let year = x.floor() as i32;
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let days_in_year = days_in_year(year);
    let ordinal0 = ((x - f64::from(year)) * days_in_year).round() as u64;
    start.checked_add_days(chrono::Days::new(ordinal0))
}

fn days_in_year(year: i32) -> f64 {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    if leap { 366.0 } else { 365.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_end_handles_february_and_december() {
        assert_eq!(month_end(2024, 2), Some(d(2024, 2, 29)));
        assert_eq!(month_end(2023, 2), Some(d(2023, 2, 28)));
        assert_eq!(month_end(2023, 12), Some(d(2023, 12, 31)));
    }

    #[test]
    fn months_between_ignores_day_of_month() {
        assert_eq!(months_between(d(2024, 1, 31), d(2024, 2, 1)), 1);
        assert_eq!(months_between(d(2022, 11, 30), d(2024, 1, 31)), 14);
        assert_eq!(months_between(d(2024, 3, 1), d(2024, 1, 1)), -2);
    }

    #[test]
    fn decimal_year_round_trips_at_day_precision() {
        for date in [d(2020, 1, 1), d(2021, 6, 30), d(2024, 12, 31)] {
            let x = decimal_year(date);
            assert_eq!(from_decimal_year(x), Some(date));
        }
    }
}
