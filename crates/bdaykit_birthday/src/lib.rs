//! `bdaykit_birthday` v1:
//! Birthday list report built from a contact export.
//!
//! Modules:
//! - `conf`      : canonical column names and locale strings
//! - `columns`   : ordered header matcher rules
//! - `date`      : day-first birth date parsing
//! - `normalize` : Normalizer (dates, order, age, header cleanup)
//! - `report`    : ReportBuilder (month sheets, highlights, placeholder)
//! - `stats`     : aggregate counts
//! - `spec`      : options and outputs
//! - `error`     : error type
pub mod columns;
pub mod conf;
pub mod date;
pub mod error;
pub mod normalize;
pub mod report;
pub mod spec;
pub mod stats;

use polars::prelude::DataFrame;

pub use columns::{EnumColumnRule, find_column, find_column_name, normalize_header};
pub use conf::{
    C_COL_BIRTH_DATE, C_COL_FIRST_NAME, C_COL_MEMBERSHIP, C_SHEET_PLACEHOLDER, C_SHEET_UNDATED,
    N_TARGET_YEAR_DEFAULT, N_TARGET_YEAR_MAX, N_TARGET_YEAR_MIN, TUP_HONORARY_TOKENS,
    TUP_MONTH_NAMES, derive_age_column_name,
};
pub use date::{parse_birth_date, parse_birth_date_text};
pub use error::BirthdayReportError;
pub use normalize::normalize;
pub use report::build;
pub use spec::{OutputBirthdayReport, SpecBirthdayReportOptions};
pub use stats::ReportBirthdayStats;

/// Normalize a raw table and build the report in one call.
pub fn build_birthday_report(
    df_raw: &DataFrame,
    options: &SpecBirthdayReportOptions,
) -> Result<OutputBirthdayReport, BirthdayReportError> {
    let df = normalize(df_raw, options.target_year)?;
    build(&df, options)
}
