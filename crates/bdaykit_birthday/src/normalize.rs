//! Normalizer: parse birth dates, order by birthday, derive age, clean headers.

use bdaykit_io_xlsx::derive_days_from_naive_date;
use chrono::{Datelike, NaiveDate};
use polars::prelude::{Column, DataFrame, DataType, IdxCa, IdxSize};
use tracing::{debug, warn};

use crate::conf::{C_COL_BIRTH_DATE, TUP_OBSOLETE_COLUMNS, TUP_RENAME_MAP, derive_age_column_name};
use crate::date::parse_birth_date;
use crate::error::BirthdayReportError;

/// Normalize a raw contact table for `target_year`.
///
/// With a `Geburtsdatum` column present:
/// 1. every cell is parsed day-first into a `Date` (failures become null);
/// 2. rows are stably ordered by (month, day) ignoring the year, nulls last;
/// 3. `Alter {target_year}` (`Int32`) is set to `target_year - birth year`
///    for dated rows, replacing an existing age column in place.
///
/// Then `Kontakte`/`Anredeart` are dropped and the correction/correspondence
/// language headers are renamed to their canonical names unless the target
/// already exists. Other columns are left untouched; running it twice gives
/// the same table.
pub fn normalize(df_raw: &DataFrame, target_year: i32) -> Result<DataFrame, BirthdayReportError> {
    let mut df = df_raw.clone();

    if df.column(C_COL_BIRTH_DATE).is_ok() {
        let l_dates = derive_birth_dates(&df, target_year)?;
        let cnt_unparsed = l_dates.iter().filter(|date| date.is_none()).count();
        debug!(n_rows = l_dates.len(), cnt_unparsed, "birth dates parsed");

        let l_idx_order = derive_birthday_order(&l_dates);
        let l_dates_sorted: Vec<Option<NaiveDate>> =
            l_idx_order.iter().map(|n_idx| l_dates[*n_idx as usize]).collect();
        df = df.take(&IdxCa::from_vec("idx".into(), l_idx_order))?;

        let l_days: Vec<Option<i32>> = l_dates_sorted
            .iter()
            .map(|date| date.map(derive_days_from_naive_date))
            .collect();
        df.with_column(Column::new(C_COL_BIRTH_DATE.into(), l_days).cast(&DataType::Date)?)?;

        let l_ages: Vec<Option<i32>> = l_dates_sorted
            .iter()
            .map(|date| date.map(|d| target_year - d.year()))
            .collect();
        df.with_column(Column::new(derive_age_column_name(target_year).into(), l_ages))?;
    }

    for c_col in TUP_OBSOLETE_COLUMNS {
        if df.column(c_col).is_ok() {
            df.drop_in_place(c_col)?;
            debug!(column = c_col, "obsolete column dropped");
        }
    }

    for (c_src, c_dst) in TUP_RENAME_MAP {
        if df.column(c_src).is_err() {
            continue;
        }
        if df.column(c_dst).is_ok() {
            warn!(from = c_src, to = c_dst, "rename skipped, target already exists");
            continue;
        }
        df.rename(c_src, c_dst.into())?;
        debug!(from = c_src, to = c_dst, "column renamed");
    }

    Ok(df)
}

fn derive_birth_dates(
    df: &DataFrame,
    target_year: i32,
) -> Result<Vec<Option<NaiveDate>>, BirthdayReportError> {
    let col = df.column(C_COL_BIRTH_DATE)?;
    let mut l_dates = Vec::with_capacity(df.height());
    for n_idx in 0..df.height() {
        l_dates.push(parse_birth_date(&col.get(n_idx)?, target_year));
    }
    Ok(l_dates)
}

/// Stable permutation ordering rows by (month, day), missing dates last.
pub fn derive_birthday_order(dates: &[Option<NaiveDate>]) -> Vec<IdxSize> {
    let mut l_idx: Vec<IdxSize> = (0..dates.len() as IdxSize).collect();
    l_idx.sort_by_key(|n_idx| match dates[*n_idx as usize] {
        Some(date) => (false, date.month(), date.day()),
        None => (true, 0, 0),
    });
    l_idx
}
