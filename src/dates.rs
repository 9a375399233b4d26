//! Date normalization for spreadsheet cells.
//!
//! Sheets arrive with serial day numbers, `DD.MM.YYYY` strings, ISO dates and
//! whatever a locale happened to print. Everything funnels into
//! [`normalize_date`], which returns `None` instead of failing.

use crate::schema::CellValue;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};

/// Day zero of spreadsheet serial dates. Using 1899-12-30 rather than
/// 1899-12-31 absorbs the phantom 1900-02-29 of the legacy format.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Serial of 9999-12-31, the last day a four-digit month key can hold.
const MAX_SERIAL_DAYS: f64 = 2_958_465.0;

/// Years that render as a `YYYY-MM` key and sort chronologically as text.
const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%a, %d %b %Y",
];

/// Dates outside years 0000..=9999 come back as `None`.
pub fn normalize_date(value: &CellValue) -> Option<NaiveDate> {
    let date = match value {
        CellValue::Number(serial) => serial_to_date(*serial),
        CellValue::Date(date) => Some(*date),
        CellValue::Text(text) => parse_date_str(text),
        CellValue::Empty | CellValue::Bool(_) => None,
    };
    date.filter(|d| SUPPORTED_YEARS.contains(&d.year()))
}

/// Converts a spreadsheet serial (days since 1899-12-30, fraction = time of
/// day) into a calendar date. Serial 1 is 1899-12-31; negative serials and
/// anything past 9999-12-31 give `None`.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }

    let days = serial.floor();
    if !(0.0..=MAX_SERIAL_DAYS).contains(&days) {
        return None;
    }

    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;

    epoch.checked_add_days(Days::new(days as u64))
}

pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim().trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return None;
    }

    parse_dotted_dmy(text)
        .or_else(|| parse_dashed_ymd(text))
        .or_else(|| parse_generic(text))
}

/// `D.M.YYYY` / `DD.MM.YYYY`
fn parse_dotted_dmy(text: &str) -> Option<NaiveDate> {
    let [day, month, year] = split_three(text, '.')?;
    if !is_digits(day, 1, 2) || !is_digits(month, 1, 2) || !is_digits(year, 4, 4) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// `YYYY-M-D` / `YYYY-MM-DD`
fn parse_dashed_ymd(text: &str) -> Option<NaiveDate> {
    let [year, month, day] = split_three(text, '-')?;
    if !is_digits(year, 4, 4) || !is_digits(month, 1, 2) || !is_digits(day, 1, 2) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn parse_generic(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        })
}

fn split_three(text: &str, sep: char) -> Option<[&str; 3]> {
    let mut parts = text.split(sep);
    let first = parts.next()?;
    let second = parts.next()?;
    let third = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some([first, second, third])
}

fn is_digits(part: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&part.len()) && part.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_serial_dates_count_from_1899_12_30() {
        assert_eq!(serial_to_date(0.0), Some(ymd(1899, 12, 30)));
        assert_eq!(serial_to_date(1.0), Some(ymd(1899, 12, 31)));
        assert_eq!(serial_to_date(44927.0), Some(ymd(2023, 1, 1)));
        assert_eq!(serial_to_date(45000.0), Some(ymd(2023, 3, 15)));
        // time-of-day fraction is dropped
        assert_eq!(serial_to_date(45000.99), Some(ymd(2023, 3, 15)));
    }

    #[test]
    fn test_serial_dates_reject_garbage() {
        assert_eq!(serial_to_date(f64::NAN), None);
        assert_eq!(serial_to_date(f64::INFINITY), None);
        assert_eq!(serial_to_date(1.0e12), None);
        assert_eq!(serial_to_date(-1.0), None);
        assert_eq!(serial_to_date(-700_000.0), None);
        assert_eq!(serial_to_date(2_958_465.0), Some(ymd(9999, 12, 31)));
        assert_eq!(serial_to_date(2_958_466.0), None);
    }

    #[test]
    fn test_dates_beyond_four_digit_years_are_rejected() {
        let far_future = NaiveDate::from_ymd_opt(12345, 1, 1).unwrap();
        assert_eq!(normalize_date(&CellValue::Date(far_future)), None);

        let before_year_zero = NaiveDate::from_ymd_opt(-17, 6, 1).unwrap();
        assert_eq!(normalize_date(&CellValue::Date(before_year_zero)), None);

        assert_eq!(normalize_date(&CellValue::Number(-700_000.0)), None);
        assert_eq!(
            normalize_date(&CellValue::Date(ymd(9999, 12, 31))),
            Some(ymd(9999, 12, 31))
        );
    }

    #[test]
    fn test_dotted_day_month_year() {
        assert_eq!(parse_date_str("5.1.2026"), Some(ymd(2026, 1, 5)));
        assert_eq!(parse_date_str("05.01.2026"), Some(ymd(2026, 1, 5)));
        assert_eq!(parse_date_str(" 31.12.2025 "), Some(ymd(2025, 12, 31)));
        assert_eq!(parse_date_str("31.02.2024"), None);
    }

    #[test]
    fn test_dashed_year_month_day() {
        assert_eq!(parse_date_str("2024-2-9"), Some(ymd(2024, 2, 9)));
        assert_eq!(parse_date_str("2024-02-09"), Some(ymd(2024, 2, 9)));
        assert_eq!(parse_date_str("2023-02-29"), None);
    }

    #[test]
    fn test_generic_layouts() {
        assert_eq!(parse_date_str("2024/03/15"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date_str("03/15/2024"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date_str("15 Mar 2024"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date_str("March 15, 2024"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date_str("2024-03-15T10:30:00Z"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date_str("2024-03-15 08:05:00"), Some(ymd(2024, 3, 15)));
    }

    #[test]
    fn test_unparseable_values() {
        assert_eq!(parse_date_str(""), None);
        assert_eq!(parse_date_str("not a date"), None);
        assert_eq!(parse_date_str("12.2024"), None);
        assert_eq!(normalize_date(&CellValue::Empty), None);
        assert_eq!(normalize_date(&CellValue::Bool(true)), None);
    }

    #[test]
    fn test_normalize_dispatches_on_cell_shape() {
        assert_eq!(
            normalize_date(&CellValue::Number(45000.0)),
            Some(ymd(2023, 3, 15))
        );
        assert_eq!(
            normalize_date(&CellValue::Date(ymd(2022, 6, 1))),
            Some(ymd(2022, 6, 1))
        );
        assert_eq!(
            normalize_date(&CellValue::from("20.06.2022")),
            Some(ymd(2022, 6, 20))
        );
    }
}
