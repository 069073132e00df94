//! ReportBuilder: partition by birth month and render the workbook.
//!
//! Sheet order: one sheet per non-empty month (`Januar` … `Dezember`), then
//! `Ohne_Geburtsdatum` when requested and non-empty. A workbook that would
//! otherwise have no sheet gets the single `Keine_Daten` placeholder.

use std::collections::BTreeMap;

use bdaykit_io_xlsx::{
    C_NUM_FORMAT_DATE, EnumHighlightPredicate, EnumHighlightTarget, SpecCellFormat,
    SpecHighlightRule, SpecSheetReport, SpecXlsxSheetWriteOptions, XlsxWriter,
    derive_fmt_highlight_green, derive_fmt_highlight_yellow,
};
use chrono::{Datelike, NaiveDate};
use polars::prelude::{Column, DataFrame, IdxCa, IdxSize};
use tracing::{debug, info};

use crate::columns::{
    derive_correspondence_language_rules, derive_membership_rules, find_column_name,
};
use crate::conf::{
    C_COL_BIRTH_DATE, C_COL_BIRTH_DATE_DISPLAY, C_COL_CITY, C_COL_COMPANY, C_COL_FIRST_NAME,
    C_COL_LAST_NAME, C_COL_MEMBERSHIP, C_COL_PLACEHOLDER, C_COL_POSTAL_CODE, C_COL_STREET,
    C_FMT_DATE_DISPLAY, C_SHEET_PLACEHOLDER, C_SHEET_UNDATED, C_TEXT_PLACEHOLDER,
    N_ROUND_BIRTHDAY_DIVISOR, N_TARGET_YEAR_MAX, N_TARGET_YEAR_MIN, TUP_HONORARY_TOKENS,
    derive_age_column_name, derive_month_name,
};
use crate::date::parse_birth_date;
use crate::error::BirthdayReportError;
use crate::spec::{OutputBirthdayReport, SpecBirthdayReportOptions};
use crate::stats::ReportBirthdayStats;

/// Row indices of the normalized table split into month buckets and undated rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecBirthdayPartition {
    /// Month (`1..=12`) → row indices sorted by day, stable on ties.
    pub dict_months: BTreeMap<u32, Vec<IdxSize>>,
    /// Rows without a birth date, in table order.
    pub l_undated: Vec<IdxSize>,
}

/// Build the birthday workbook from a normalized table.
pub fn build(
    df: &DataFrame,
    options: &SpecBirthdayReportOptions,
) -> Result<OutputBirthdayReport, BirthdayReportError> {
    let SpecBirthdayReportOptions {
        target_year,
        include_undated_sheet,
    } = *options;
    if !(N_TARGET_YEAR_MIN..=N_TARGET_YEAR_MAX).contains(&target_year) {
        return Err(BirthdayReportError::InvalidArgument(format!(
            "target_year must be within {N_TARGET_YEAR_MIN}..={N_TARGET_YEAR_MAX}; got {target_year}."
        )));
    }

    let l_dates = derive_birth_dates(df, target_year)?;
    let partition = partition_by_month(&l_dates);
    let mut writer = XlsxWriter::new();
    let mut l_sheets: Vec<SpecSheetReport> = Vec::new();

    for (n_month, l_idx) in &partition.dict_months {
        let Some(sheet_name) = derive_month_name(*n_month) else {
            continue;
        };
        let l_dates_month: Vec<Option<NaiveDate>> =
            l_idx.iter().map(|n_idx| l_dates[*n_idx as usize]).collect();
        let mut df_month = take_rows(df, l_idx)?;
        df_month.with_column(derive_display_date_column(&l_dates_month))?;

        let l_headers = derive_headers(&df_month);
        let l_cols = derive_month_sheet_columns(&l_headers, target_year);
        let df_sheet = df_month.select(l_cols.iter().map(String::as_str))?;

        let mut l_rules = Vec::new();
        let c_col_age = derive_age_column_name(target_year);
        if l_cols.contains(&c_col_age) {
            l_rules.push(derive_round_birthday_rule(&c_col_age));
        }
        if let Some(c_col_membership) = find_column_name(&l_headers, &derive_membership_rules())
            && l_cols.contains(&c_col_membership)
        {
            l_rules.extend(derive_honorary_rules(&c_col_membership));
        }

        let mut cols_fmt_overrides = BTreeMap::new();
        if l_cols.iter().any(|c| c == C_COL_BIRTH_DATE_DISPLAY) {
            cols_fmt_overrides.insert(
                C_COL_BIRTH_DATE_DISPLAY.to_string(),
                SpecCellFormat {
                    num_format: Some(C_NUM_FORMAT_DATE.to_string()),
                    ..Default::default()
                },
            );
        }

        let sheet_options = SpecXlsxSheetWriteOptions {
            cols_fmt_overrides,
            highlight_rules: l_rules,
            ..Default::default()
        };
        let sheet_report = writer.write_sheet_from_dataframe(&df_sheet, sheet_name, &sheet_options)?;
        info!(
            sheet = %sheet_report.sheet_name,
            n_rows = sheet_report.n_rows,
            "month sheet written"
        );
        l_sheets.push(sheet_report);
    }

    if include_undated_sheet && !partition.l_undated.is_empty() {
        let df_undated = take_rows(df, &partition.l_undated)?;
        let l_cols = derive_undated_sheet_columns(&derive_headers(&df_undated));
        let df_sheet = df_undated.select(l_cols.iter().map(String::as_str))?;

        let l_rules = if l_cols.iter().any(|c| c == C_COL_MEMBERSHIP) {
            derive_honorary_rules(C_COL_MEMBERSHIP)
        } else {
            Vec::new()
        };
        let sheet_options = SpecXlsxSheetWriteOptions {
            highlight_rules: l_rules,
            ..Default::default()
        };
        let sheet_report =
            writer.write_sheet_from_dataframe(&df_sheet, C_SHEET_UNDATED, &sheet_options)?;
        info!(n_rows = sheet_report.n_rows, "undated sheet written");
        l_sheets.push(sheet_report);
    }

    if l_sheets.is_empty() {
        let df_placeholder = DataFrame::new(vec![Column::new(
            C_COL_PLACEHOLDER.into(),
            vec![C_TEXT_PLACEHOLDER],
        )])?;
        let sheet_report = writer.write_sheet_from_dataframe(
            &df_placeholder,
            C_SHEET_PLACEHOLDER,
            &SpecXlsxSheetWriteOptions::default(),
        )?;
        debug!("no data rows, placeholder sheet written");
        l_sheets.push(sheet_report);
    }

    let bytes = writer.close()?;
    let stats = ReportBirthdayStats::from_dataframe(df, &l_dates);
    info!(
        n_sheets = l_sheets.len(),
        n_bytes = bytes.len(),
        %stats,
        "birthday report built"
    );

    Ok(OutputBirthdayReport {
        bytes,
        stats,
        sheets: l_sheets,
    })
}

/// Per-row birth dates; all `None` without a birth date column.
fn derive_birth_dates(
    df: &DataFrame,
    target_year: i32,
) -> Result<Vec<Option<NaiveDate>>, BirthdayReportError> {
    let Ok(col) = df.column(C_COL_BIRTH_DATE) else {
        return Ok(vec![None; df.height()]);
    };
    let mut l_dates = Vec::with_capacity(df.height());
    for n_idx in 0..df.height() {
        l_dates.push(parse_birth_date(&col.get(n_idx)?, target_year));
    }
    Ok(l_dates)
}

/// Split row indices into month buckets (day-sorted) and undated rows.
pub fn partition_by_month(dates: &[Option<NaiveDate>]) -> SpecBirthdayPartition {
    let mut partition = SpecBirthdayPartition::default();
    for (n_idx, date) in dates.iter().enumerate() {
        let n_idx = n_idx as IdxSize;
        match date {
            Some(date) => partition
                .dict_months
                .entry(date.month())
                .or_default()
                .push(n_idx),
            None => partition.l_undated.push(n_idx),
        }
    }
    for l_idx in partition.dict_months.values_mut() {
        l_idx.sort_by_key(|n_idx| dates[*n_idx as usize].map(|date| date.day()));
    }
    partition
}

/// Month sheet column order.
///
/// `Vorname`, `Nachname`, display date, `Firma`, `Strasse`, `PLZ`, `Ort`,
/// [correspondence language], `Alter {Y}`, [membership]; absent names are
/// skipped, an empty result falls back to every header.
pub fn derive_month_sheet_columns(headers: &[String], target_year: i32) -> Vec<String> {
    let c_col_membership = find_column_name(headers, &derive_membership_rules());
    let c_col_language = find_column_name(headers, &derive_correspondence_language_rules());

    let mut l_preferred: Vec<String> = [
        C_COL_FIRST_NAME,
        C_COL_LAST_NAME,
        C_COL_BIRTH_DATE_DISPLAY,
        C_COL_COMPANY,
        C_COL_STREET,
        C_COL_POSTAL_CODE,
        C_COL_CITY,
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    l_preferred.extend(c_col_language.clone());
    l_preferred.push(derive_age_column_name(target_year));
    l_preferred.extend(c_col_membership);

    derive_ordered_columns(headers, &l_preferred, c_col_language.as_deref(), false)
}

/// Undated sheet column order.
///
/// `Vorname`, `Nachname`, `Firma`, `Strasse`, `PLZ`, `Ort`,
/// [correspondence language], `Mitgliedschaft`, then every other header in
/// table order.
pub fn derive_undated_sheet_columns(headers: &[String]) -> Vec<String> {
    let c_col_language = find_column_name(headers, &derive_correspondence_language_rules());

    let mut l_preferred: Vec<String> = [
        C_COL_FIRST_NAME,
        C_COL_LAST_NAME,
        C_COL_COMPANY,
        C_COL_STREET,
        C_COL_POSTAL_CODE,
        C_COL_CITY,
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    l_preferred.extend(c_col_language);
    l_preferred.push(C_COL_MEMBERSHIP.to_string());

    derive_ordered_columns(headers, &l_preferred, None, true)
}

fn derive_ordered_columns(
    headers: &[String],
    preferred: &[String],
    col_append: Option<&str>,
    if_append_rest: bool,
) -> Vec<String> {
    let mut l_cols: Vec<String> = Vec::new();
    for c_col in preferred {
        if headers.contains(c_col) && !l_cols.contains(c_col) {
            l_cols.push(c_col.clone());
        }
    }
    if let Some(c_col) = col_append
        && !l_cols.iter().any(|c| c == c_col)
    {
        l_cols.push(c_col.to_string());
    }
    if if_append_rest {
        for c_col in headers {
            if !l_cols.contains(c_col) {
                l_cols.push(c_col.clone());
            }
        }
    }
    if l_cols.is_empty() {
        return headers.to_vec();
    }
    l_cols
}

/// Green cell highlight for ages divisible by ten (zero included).
pub fn derive_round_birthday_rule(col_age: &str) -> SpecHighlightRule {
    SpecHighlightRule {
        col_name: col_age.to_string(),
        predicate: EnumHighlightPredicate::RoundNumber {
            divisor: N_ROUND_BIRTHDAY_DIVISOR,
        },
        target: EnumHighlightTarget::Cell,
        format: derive_fmt_highlight_green(),
    }
}

/// Yellow row highlight, one rule per honorary token.
pub fn derive_honorary_rules(col_membership: &str) -> Vec<SpecHighlightRule> {
    TUP_HONORARY_TOKENS
        .iter()
        .map(|c_token| SpecHighlightRule {
            col_name: col_membership.to_string(),
            predicate: EnumHighlightPredicate::Contains {
                token: c_token.to_string(),
            },
            target: EnumHighlightTarget::Row,
            format: derive_fmt_highlight_yellow(),
        })
        .collect()
}

fn derive_display_date_column(dates: &[Option<NaiveDate>]) -> Column {
    let l_text: Vec<Option<String>> = dates
        .iter()
        .map(|date| date.map(|d| d.format(C_FMT_DATE_DISPLAY).to_string()))
        .collect();
    Column::new(C_COL_BIRTH_DATE_DISPLAY.into(), l_text)
}

fn derive_headers(df: &DataFrame) -> Vec<String> {
    df.get_column_names_str()
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

fn take_rows(df: &DataFrame, idx: &[IdxSize]) -> Result<DataFrame, BirthdayReportError> {
    Ok(df.take(&IdxCa::from_vec("idx".into(), idx.to_vec()))?)
}

#[cfg(test)]
mod tests {
    use polars::prelude::df;

    use super::*;

    fn headers(l_names: &[&str]) -> Vec<String> {
        l_names.iter().map(ToString::to_string).collect()
    }

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_partition_is_complete_and_day_sorted() {
        let l_dates = vec![
            ymd(1950, 7, 20),
            None,
            ymd(1990, 7, 3),
            ymd(1926, 10, 10),
            ymd(1960, 7, 3),
            None,
        ];

        let partition = partition_by_month(&l_dates);

        assert_eq!(partition.dict_months.len(), 2);
        assert_eq!(partition.dict_months[&7], vec![2, 4, 0]);
        assert_eq!(partition.dict_months[&10], vec![3]);
        assert_eq!(partition.l_undated, vec![1, 5]);

        let mut l_all: Vec<IdxSize> = partition
            .dict_months
            .values()
            .flatten()
            .chain(partition.l_undated.iter())
            .copied()
            .collect();
        l_all.sort_unstable();
        assert_eq!(l_all, (0..l_dates.len() as IdxSize).collect::<Vec<_>>());
    }

    #[test]
    fn test_month_columns_full_order() {
        let l_headers = headers(&[
            "Mitglied",
            "Ort",
            "PLZ",
            "Korresp. Sprache",
            "Vorname",
            "Extra",
            "Alter 2026",
            "Nachname",
            "Geburtsdatum",
            "Strasse",
            "Firma",
            "Geburtsdatum (TT.MM.JJJJ)",
        ]);

        assert_eq!(
            derive_month_sheet_columns(&l_headers, 2026),
            headers(&[
                "Vorname",
                "Nachname",
                "Geburtsdatum (TT.MM.JJJJ)",
                "Firma",
                "Strasse",
                "PLZ",
                "Ort",
                "Korresp. Sprache",
                "Alter 2026",
                "Mitglied",
            ])
        );
    }

    #[test]
    fn test_month_columns_skip_absent_and_fall_back() {
        assert_eq!(
            derive_month_sheet_columns(&headers(&["Nachname", "Alter 2025", "Vorname"]), 2026),
            headers(&["Vorname", "Nachname"])
        );
        assert_eq!(
            derive_month_sheet_columns(&headers(&["A", "B"]), 2026),
            headers(&["A", "B"])
        );
    }

    #[test]
    fn test_undated_columns_append_rest_in_table_order() {
        let l_headers = headers(&[
            "Geburtsdatum",
            "Mitgliedschaft",
            "Vorname",
            "Korrespondenzsprache",
            "Ort",
            "Alter 2026",
        ]);

        assert_eq!(
            derive_undated_sheet_columns(&l_headers),
            headers(&[
                "Vorname",
                "Ort",
                "Korrespondenzsprache",
                "Mitgliedschaft",
                "Geburtsdatum",
                "Alter 2026",
            ])
        );
        assert!(derive_undated_sheet_columns(&[]).is_empty());
    }

    #[test]
    fn test_highlight_rule_shapes() {
        let rule = derive_round_birthday_rule("Alter 2026");
        assert_eq!(rule.target, EnumHighlightTarget::Cell);
        assert_eq!(
            rule.predicate,
            EnumHighlightPredicate::RoundNumber { divisor: 10 }
        );

        let l_rules = derive_honorary_rules("Mitgliedschaft");
        assert_eq!(l_rules.len(), 3);
        assert!(l_rules.iter().all(|r| r.target == EnumHighlightTarget::Row));
        assert_eq!(
            l_rules[2].predicate,
            EnumHighlightPredicate::Contains {
                token: "Prinzenrolle".to_string()
            }
        );
    }

    #[test]
    fn test_build_rejects_out_of_range_year() {
        let options = SpecBirthdayReportOptions {
            target_year: 1899,
            include_undated_sheet: true,
        };
        let err = build(&DataFrame::empty(), &options).unwrap_err();
        assert!(matches!(err, BirthdayReportError::InvalidArgument(_)));
    }

    #[test]
    fn test_build_counts_unparsed_text_as_missing() {
        let df_raw = df![
            "Vorname" => ["Bert", "Anna"],
            "Geburtsdatum" => ["irgendwann", "03.07.1950"],
        ]
        .unwrap();

        let output = build(&df_raw, &SpecBirthdayReportOptions::default()).unwrap();

        assert_eq!(output.stats.cnt_names, Some(2));
        assert_eq!(output.stats.cnt_birth_dates, Some(1));
        assert_eq!(output.stats.cnt_birth_dates_missing, Some(1));
        assert_eq!(output.sheet_names(), vec!["Juli", "Ohne_Geburtsdatum"]);
    }
}
