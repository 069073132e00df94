//! Stateless helper utilities used by the XLSX reader and writer kernels.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_xlsxwriter::column_number_to_name;

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
use crate::error::XlsxIoError;
use crate::spec::{EnumCellValue, EnumHighlightPredicate, EnumHighlightTarget};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Blank out `NaN`/`Inf`; numbers outside numeric columns are written as text.
pub fn convert_cell_value(value: &EnumCellValue, if_is_numeric_col: bool) -> EnumCellValue {
    match value {
        EnumCellValue::Number(n) if !n.is_finite() => EnumCellValue::None,
        EnumCellValue::Number(n) if !if_is_numeric_col => EnumCellValue::String(n.to_string()),
        _ => value.clone(),
    }
}

/// Days between `0001-01-01` (CE day 1) and the Unix epoch.
const N_DAYS_CE_TO_UNIX_EPOCH: i32 = 719_163;

/// Convert a polars `Date` physical value (days since Unix epoch).
pub fn derive_naive_date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(N_DAYS_CE_TO_UNIX_EPOCH)?)
}

/// Inverse of [`derive_naive_date_from_days`].
pub fn derive_days_from_naive_date(date: NaiveDate) -> i32 {
    chrono::Datelike::num_days_from_ce(&date) - N_DAYS_CE_TO_UNIX_EPOCH
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DataFrameLikeUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), XlsxIoError> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter(|(_, l_pos)| l_pos.len() > 1)
        .map(|(c_name, l_pos)| format!("{c_name:?} x{} at indices {:?}", l_pos.len(), l_pos))
        .collect::<Vec<_>>()
        .join("; ");

    Err(XlsxIoError::InvalidArgument(format!(
        "Duplicate column names detected: {c_msg}"
    )))
}

/// Make raw header cells usable as column names.
///
/// Blank headers become `Unnamed: {idx}`; repeats get `.1`, `.2`, ... suffixes.
pub fn derive_unique_headers(headers_raw: &[String]) -> Vec<String> {
    let mut set_seen: BTreeSet<String> = BTreeSet::new();
    let mut l_headers = Vec::with_capacity(headers_raw.len());

    for (n_idx, c_raw) in headers_raw.iter().enumerate() {
        let c_base = if c_raw.trim().is_empty() {
            format!("Unnamed: {n_idx}")
        } else {
            c_raw.clone()
        };

        let mut c_name = c_base.clone();
        let mut n_dup = 1usize;
        while set_seen.contains(&c_name) {
            c_name = format!("{c_base}.{n_dup}");
            n_dup += 1;
        }
        set_seen.insert(c_name.clone());
        l_headers.push(c_name);
    }

    l_headers
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HighlightRules

/// Evaluate a highlight predicate against one cell, mirroring the Excel formula.
///
/// Blank cells never match. `RoundNumber` only matches numeric cells and uses
/// Excel `MOD` semantics (result takes the divisor's sign), so `0` matches.
pub fn is_highlight_match(predicate: &EnumHighlightPredicate, value: &EnumCellValue) -> bool {
    match predicate {
        EnumHighlightPredicate::RoundNumber { divisor } => match value {
            EnumCellValue::Number(n) if n.is_finite() && *divisor != 0 => {
                n.rem_euclid(f64::from(*divisor)) == 0.0
            }
            _ => false,
        },
        EnumHighlightPredicate::Contains { token } => match value {
            EnumCellValue::String(s) => s.contains(token.as_str()),
            EnumCellValue::Number(n) => n.to_string().contains(token.as_str()),
            EnumCellValue::None | EnumCellValue::Date(_) => false,
        },
    }
}

/// A1 reference to `(row_idx, col_idx)` (zero-based), column-absolute if requested.
pub fn derive_a1_ref(row_idx: u32, col_idx: u16, if_col_absolute: bool) -> String {
    format!(
        "{}{}{}",
        if if_col_absolute { "$" } else { "" },
        column_number_to_name(col_idx),
        row_idx + 1
    )
}

/// Render an Excel conditional-format formula for a highlight predicate.
///
/// `row_idx_first`/`col_idx` address the first data cell of the tested
/// column; Excel shifts the relative row for every cell in the target range.
pub fn render_highlight_formula(
    predicate: &EnumHighlightPredicate,
    target: EnumHighlightTarget,
    row_idx_first: u32,
    col_idx: u16,
) -> String {
    let c_ref = derive_a1_ref(
        row_idx_first,
        col_idx,
        matches!(target, EnumHighlightTarget::Row),
    );
    match predicate {
        EnumHighlightPredicate::RoundNumber { divisor } => {
            format!("=AND(MOD({c_ref},{divisor})=0,NOT(ISBLANK({c_ref})))")
        }
        EnumHighlightPredicate::Contains { token } => {
            format!(
                "=ISNUMBER(FIND(\"{}\",{c_ref}))",
                token.replace('"', "\"\"")
            )
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
