//! Best-effort, day-first birth date parsing.
//!
//! Accepted shapes:
//! - `Date` cells, kept as-is;
//! - `Datetime` cells, reduced to their calendar date (time part dropped);
//! - text `d.m.yyyy`, `d/m/yyyy`, `d-m-yyyy`, `d.m.yy`, `yyyy-m-d`,
//!   `yyyy/m/d`, optionally followed by a time part after whitespace or `T`;
//! - numbers read as Excel 1900-system serial day numbers.
//!
//! Anything else yields `None`.

use bdaykit_io_xlsx::derive_naive_date_from_days;
use chrono::{DateTime, Duration, NaiveDate};
use polars::prelude::{AnyValue, TimeUnit};

/// Largest Excel serial day number (`9999-12-31`).
pub const N_EXCEL_SERIAL_MAX: f64 = 2_958_465.0;
/// Excel's phantom `1900-02-29`.
const N_EXCEL_SERIAL_LEAP_BUG: i64 = 60;

/// Parse one birth-date cell.
///
/// `n_year_pivot` resolves two-digit years: `yy` becomes `20yy` when that is
/// not after the pivot, `19yy` otherwise.
pub fn parse_birth_date(value: &AnyValue<'_>, n_year_pivot: i32) -> Option<NaiveDate> {
    match value {
        AnyValue::Date(days) => derive_naive_date_from_days(*days),
        AnyValue::Datetime(val, unit, _) | AnyValue::DatetimeOwned(val, unit, _) => {
            derive_date_from_timestamp(*val, *unit)
        }
        AnyValue::String(text) => parse_birth_date_text(text, n_year_pivot),
        AnyValue::StringOwned(text) => parse_birth_date_text(text.as_str(), n_year_pivot),
        AnyValue::UInt8(val) => derive_date_from_excel_serial(*val as f64),
        AnyValue::UInt16(val) => derive_date_from_excel_serial(*val as f64),
        AnyValue::UInt32(val) => derive_date_from_excel_serial(*val as f64),
        AnyValue::UInt64(val) => derive_date_from_excel_serial(*val as f64),
        AnyValue::Int8(val) => derive_date_from_excel_serial(*val as f64),
        AnyValue::Int16(val) => derive_date_from_excel_serial(*val as f64),
        AnyValue::Int32(val) => derive_date_from_excel_serial(*val as f64),
        AnyValue::Int64(val) => derive_date_from_excel_serial(*val as f64),
        AnyValue::Float32(val) => derive_date_from_excel_serial(*val as f64),
        AnyValue::Float64(val) => derive_date_from_excel_serial(*val),
        _ => None,
    }
}

/// Parse a day-first date string; `03/04/2000` is 3 April 2000.
pub fn parse_birth_date_text(text: &str, n_year_pivot: i32) -> Option<NaiveDate> {
    let c_date = text
        .trim()
        .split(|chr: char| chr.is_whitespace() || chr == 'T')
        .next()?;
    let chr_sep = c_date.chars().find(|chr| matches!(chr, '.' | '/' | '-'))?;

    let l_parts: Vec<&str> = c_date.split(chr_sep).collect();
    let [c_first, c_second, c_third] = l_parts.as_slice() else {
        return None;
    };
    if !([c_first, c_second, c_third]
        .iter()
        .all(|c_part| !c_part.is_empty() && c_part.bytes().all(|b| b.is_ascii_digit())))
    {
        return None;
    }

    // ISO order only when the year leads; '.' never introduces ISO dates.
    if c_first.len() == 4 && chr_sep != '.' {
        if c_second.len() > 2 || c_third.len() > 2 {
            return None;
        }
        return NaiveDate::from_ymd_opt(
            c_first.parse().ok()?,
            c_second.parse().ok()?,
            c_third.parse().ok()?,
        );
    }

    if c_first.len() > 2 || c_second.len() > 2 {
        return None;
    }
    let n_year = match c_third.len() {
        4 => c_third.parse().ok()?,
        2 if chr_sep == '.' => derive_year_from_two_digits(c_third.parse().ok()?, n_year_pivot),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(n_year, c_second.parse().ok()?, c_first.parse().ok()?)
}

fn derive_year_from_two_digits(n_yy: i32, n_year_pivot: i32) -> i32 {
    let n_year = 2000 + n_yy;
    if n_year > n_year_pivot { n_year - 100 } else { n_year }
}

/// Calendar date of a polars `Datetime` physical value (UTC, time dropped).
pub fn derive_date_from_timestamp(value: i64, unit: TimeUnit) -> Option<NaiveDate> {
    let datetime = match unit {
        TimeUnit::Nanoseconds => DateTime::from_timestamp_nanos(value),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value)?,
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value)?,
    };
    Some(datetime.date_naive())
}

/// Convert an Excel 1900-system serial (fraction = time of day, ignored).
pub fn derive_date_from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..N_EXCEL_SERIAL_MAX + 1.0).contains(&serial) {
        return None;
    }
    let n_serial = serial.floor() as i64;
    let date_base = match n_serial {
        n if n < N_EXCEL_SERIAL_LEAP_BUG => NaiveDate::from_ymd_opt(1899, 12, 31)?,
        N_EXCEL_SERIAL_LEAP_BUG => return None,
        _ => NaiveDate::from_ymd_opt(1899, 12, 30)?,
    };
    date_base.checked_add_signed(Duration::days(n_serial))
}
