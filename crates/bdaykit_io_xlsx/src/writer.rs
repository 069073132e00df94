//! XLSX writer kernel that renders polars DataFrames into an in-memory workbook.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use polars::prelude::{AnyValue, DataFrame, DataType};
use rust_xlsxwriter::{
    ConditionalFormatFormula, ExcelDateTime, Format, FormatAlign, Workbook, Worksheet,
};
use tracing::{debug, warn};

use crate::conf::{
    EnumFmtKey, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    derive_default_xlsx_formats,
};
use crate::error::XlsxIoError;
use crate::spec::{
    EnumCellValue, EnumHighlightTarget, SpecCellFormat, SpecSheetReport,
    SpecXlsxSheetWriteOptions,
};
use crate::util::{
    convert_cell_value, derive_naive_date_from_days, is_highlight_match,
    render_highlight_formula, sanitize_sheet_name, validate_unique_columns,
};

/// Header occupies exactly one worksheet row.
const N_ROWS_HEADER: usize = 1;

/// Inputs of [`plan_column_formats`].
pub struct SpecColumnFormatPlanOptions<'a> {
    /// Number of columns in current sheet.
    pub width_data: usize,
    /// Numeric column indices.
    pub cols_idx_numeric: &'a [usize],
    /// Integer column indices.
    pub cols_idx_integer: &'a [usize],
    /// Date column indices.
    pub cols_idx_date: &'a [usize],
    /// Optional per-column format overrides.
    pub cols_fmt_overrides: &'a BTreeMap<usize, SpecCellFormat>,
    /// Base text format.
    pub fmt_text: &'a SpecCellFormat,
    /// Base integer format.
    pub fmt_integer: &'a SpecCellFormat,
    /// Base decimal format.
    pub fmt_decimal: &'a SpecCellFormat,
    /// Base date format.
    pub fmt_date: &'a SpecCellFormat,
}

/// Stateful workbook writer.
///
/// Sheets are buffered in memory; [`Self::close`] serializes the workbook and
/// hands back the document bytes.
pub struct XlsxWriter {
    workbook: Workbook,
    fmt_text: SpecCellFormat,
    fmt_integer: SpecCellFormat,
    fmt_decimal: SpecCellFormat,
    fmt_date: SpecCellFormat,
    fmt_header: SpecCellFormat,
    set_sheet_names_existing: BTreeSet<String>,
    v_bytes_out: Option<Vec<u8>>,
}

impl Default for XlsxWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XlsxWriter {
    /// Create writer using [`derive_default_xlsx_formats`] presets.
    pub fn new() -> Self {
        let mut dict_fmt = derive_default_xlsx_formats();
        let mut take = |key: EnumFmtKey| dict_fmt.remove(&key).unwrap_or_default();
        Self {
            workbook: Workbook::new(),
            fmt_text: take(EnumFmtKey::Text),
            fmt_integer: take(EnumFmtKey::Integer),
            fmt_decimal: take(EnumFmtKey::Decimal),
            fmt_date: take(EnumFmtKey::Date),
            fmt_header: take(EnumFmtKey::Header),
            set_sheet_names_existing: BTreeSet::new(),
            v_bytes_out: None,
        }
    }

    /// Number of sheets written so far.
    pub fn sheet_count(&self) -> usize {
        self.set_sheet_names_existing.len()
    }

    /// Serialize workbook into XLSX bytes. Idempotent.
    pub fn close(&mut self) -> Result<Vec<u8>, XlsxIoError> {
        if let Some(v_bytes) = &self.v_bytes_out {
            return Ok(v_bytes.clone());
        }
        let v_bytes = self.workbook.save_to_buffer()?;
        debug!(n_bytes = v_bytes.len(), "workbook serialized");
        self.v_bytes_out = Some(v_bytes.clone());
        Ok(v_bytes)
    }

    /// Write one sheet (header row + data rows) from an in-memory dataframe.
    pub fn write_sheet_from_dataframe(
        &mut self,
        df_data: &DataFrame,
        sheet_name: &str,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<SpecSheetReport, XlsxIoError> {
        if self.v_bytes_out.is_some() {
            return Err(XlsxIoError::Closed);
        }
        self.write_sheet(df_data, sheet_name, options)
    }

    fn write_sheet(
        &mut self,
        df_data: &DataFrame,
        sheet_name: &str,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<SpecSheetReport, XlsxIoError> {
        if !(options.width_col > 0.0 && options.width_col <= 255.0) {
            return Err(XlsxIoError::InvalidArgument(format!(
                "width_col must be within (0, 255]; got {}.",
                options.width_col
            )));
        }

        let l_colnames_df: Vec<String> = df_data
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        validate_unique_columns(&l_colnames_df)?;

        let n_width_df = l_colnames_df.len();
        let n_height_df = df_data.height();
        if n_width_df > N_NCOLS_EXCEL_MAX {
            return Err(XlsxIoError::InvalidArgument(format!(
                "Too many columns for one sheet: {n_width_df} > {N_NCOLS_EXCEL_MAX}."
            )));
        }
        if n_height_df + N_ROWS_HEADER > N_NROWS_EXCEL_MAX {
            return Err(XlsxIoError::InvalidArgument(format!(
                "Too many rows for one sheet: {n_height_df} + header > {N_NROWS_EXCEL_MAX}."
            )));
        }

        let l_cols_idx_numeric = derive_numeric_column_indices(df_data);
        let l_cols_idx_integer = derive_integer_column_indices(df_data, &l_cols_idx_numeric);
        let l_cols_idx_date = derive_date_column_indices(df_data);

        let mut l_warnings: Vec<String> = Vec::new();
        let mut dict_fmt_overrides_by_idx = BTreeMap::new();
        for (c_col_name, fmt_override) in &options.cols_fmt_overrides {
            match l_colnames_df.iter().position(|c| c == c_col_name) {
                Some(n_idx) => {
                    dict_fmt_overrides_by_idx.insert(n_idx, fmt_override.clone());
                }
                None => l_warnings.push(format!(
                    "Format override for missing column {c_col_name:?} ignored."
                )),
            }
        }

        let l_fmts_by_col = plan_column_formats(SpecColumnFormatPlanOptions {
            width_data: n_width_df,
            cols_idx_numeric: &l_cols_idx_numeric,
            cols_idx_integer: &l_cols_idx_integer,
            cols_idx_date: &l_cols_idx_date,
            cols_fmt_overrides: &dict_fmt_overrides_by_idx,
            fmt_text: &self.fmt_text,
            fmt_integer: &self.fmt_integer,
            fmt_decimal: &self.fmt_decimal,
            fmt_date: &self.fmt_date,
        });
        let l_fmt_data_by_col: Vec<Format> = l_fmts_by_col
            .iter()
            .map(derive_rust_xlsx_format)
            .collect();
        let fmt_header = derive_rust_xlsx_format(&self.fmt_header);

        let mut l_rules_resolved = Vec::with_capacity(options.highlight_rules.len());
        for rule in &options.highlight_rules {
            match l_colnames_df.iter().position(|c| c == &rule.col_name) {
                Some(n_idx) => l_rules_resolved.push(Some(n_idx)),
                None => {
                    l_warnings.push(format!(
                        "Highlight rule on missing column {:?} skipped.",
                        rule.col_name
                    ));
                    l_rules_resolved.push(None);
                }
            }
        }

        let sheet_name_unique =
            self.derive_unique_sheet_name(&sanitize_sheet_name(sheet_name, "_"));
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name_unique)?;

        for (n_idx_col, c_col_name) in l_colnames_df.iter().enumerate() {
            worksheet.write_string_with_format(
                cast_row_num(0)?,
                cast_col_num(n_idx_col)?,
                c_col_name,
                &fmt_header,
            )?;
            worksheet.set_column_width(cast_col_num(n_idx_col)?, options.width_col)?;
            if dict_fmt_overrides_by_idx.contains_key(&n_idx_col) {
                worksheet
                    .set_column_format(cast_col_num(n_idx_col)?, &l_fmt_data_by_col[n_idx_col])?;
            }
        }

        let set_cols_idx_numeric: BTreeSet<usize> = l_cols_idx_numeric.iter().copied().collect();

        let mut l_cnt_rows_highlighted = vec![0usize; options.highlight_rules.len()];
        let mut l_values_row = vec![EnumCellValue::None; n_width_df];
        let l_cols = df_data.get_columns();

        for n_idx_row in 0..n_height_df {
            for (n_idx_col, col) in l_cols.iter().enumerate() {
                let value_raw = derive_cell_value_from_any_value(col.get(n_idx_row)?);
                let value =
                    convert_cell_value(&value_raw, set_cols_idx_numeric.contains(&n_idx_col));
                write_cell_with_format(
                    worksheet,
                    N_ROWS_HEADER + n_idx_row,
                    n_idx_col,
                    &value,
                    &l_fmt_data_by_col[n_idx_col],
                )?;
                l_values_row[n_idx_col] = value;
            }

            for (n_idx_rule, rule) in options.highlight_rules.iter().enumerate() {
                if let Some(n_idx_col) = l_rules_resolved[n_idx_rule]
                    && is_highlight_match(&rule.predicate, &l_values_row[n_idx_col])
                {
                    l_cnt_rows_highlighted[n_idx_rule] += 1;
                }
            }
        }

        if n_height_df > 0 && n_width_df > 0 {
            let n_row_first = cast_row_num(N_ROWS_HEADER)?;
            let n_row_last = cast_row_num(N_ROWS_HEADER + n_height_df - 1)?;
            for (rule, n_idx_col) in options.highlight_rules.iter().zip(&l_rules_resolved) {
                let Some(n_idx_col) = n_idx_col else {
                    continue;
                };
                let n_col = cast_col_num(*n_idx_col)?;
                let c_formula =
                    render_highlight_formula(&rule.predicate, rule.target, n_row_first, n_col);
                let (n_col_first, n_col_last) = match rule.target {
                    EnumHighlightTarget::Cell => (n_col, n_col),
                    EnumHighlightTarget::Row => (0, cast_col_num(n_width_df - 1)?),
                };
                let cond_format = ConditionalFormatFormula::new()
                    .set_rule(c_formula.as_str())
                    .set_format(derive_rust_xlsx_format(&rule.format));
                worksheet.add_conditional_format(
                    n_row_first,
                    n_col_first,
                    n_row_last,
                    n_col_last,
                    &cond_format,
                )?;
                debug!(sheet = %sheet_name_unique, formula = %c_formula, "conditional format added");
            }
        }

        for c_warning in &l_warnings {
            warn!(sheet = %sheet_name_unique, "{c_warning}");
        }

        Ok(SpecSheetReport {
            sheet_name: sheet_name_unique,
            n_rows: n_height_df,
            n_cols: n_width_df,
            cnt_rows_highlighted: l_cnt_rows_highlighted,
            warnings: l_warnings,
        })
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if !self.set_sheet_names_existing.contains(name) {
            self.set_sheet_names_existing.insert(name.to_string());
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if !self.set_sheet_names_existing.contains(&candidate) {
                self.set_sheet_names_existing.insert(candidate.clone());
                return candidate;
            }
            n_idx += 1;
        }
    }
}

/// Build the final per-column data format for one sheet (overrides applied last).
pub fn plan_column_formats(options: SpecColumnFormatPlanOptions<'_>) -> Vec<SpecCellFormat> {
    let SpecColumnFormatPlanOptions {
        width_data,
        cols_idx_numeric,
        cols_idx_integer,
        cols_idx_date,
        cols_fmt_overrides,
        fmt_text,
        fmt_integer,
        fmt_decimal,
        fmt_date,
    } = options;

    let set_cols_idx_numeric: BTreeSet<usize> = cols_idx_numeric.iter().copied().collect();
    let set_cols_idx_integer: BTreeSet<usize> = cols_idx_integer.iter().copied().collect();
    let set_cols_idx_date: BTreeSet<usize> = cols_idx_date.iter().copied().collect();

    (0..width_data)
        .map(|col_idx| {
            let fmt_base = if set_cols_idx_date.contains(&col_idx) {
                fmt_date
            } else if set_cols_idx_integer.contains(&col_idx) {
                fmt_integer
            } else if set_cols_idx_numeric.contains(&col_idx) {
                fmt_decimal
            } else {
                fmt_text
            };
            match cols_fmt_overrides.get(&col_idx) {
                Some(fmt_override) => fmt_base.merge(fmt_override),
                None => fmt_base.clone(),
            }
        })
        .collect()
}

fn derive_numeric_column_indices(df: &DataFrame) -> Vec<usize> {
    df.get_columns()
        .iter()
        .enumerate()
        .filter(|(_, c_col)| c_col.dtype().is_numeric())
        .map(|(n_idx, _)| n_idx)
        .collect()
}

fn derive_integer_column_indices(df: &DataFrame, cols_idx_numeric: &[usize]) -> Vec<usize> {
    cols_idx_numeric
        .iter()
        .copied()
        .filter(|n_idx| df.get_columns()[*n_idx].dtype().is_integer())
        .collect()
}

fn derive_date_column_indices(df: &DataFrame) -> Vec<usize> {
    df.get_columns()
        .iter()
        .enumerate()
        .filter(|(_, c_col)| matches!(c_col.dtype(), DataType::Date))
        .map(|(n_idx, _)| n_idx)
        .collect()
}

/// Convert one polars cell into the kernel's cell model.
pub fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::Date(days) => match derive_naive_date_from_days(days) {
            Some(date) => EnumCellValue::Date(date),
            None => EnumCellValue::None,
        },
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), XlsxIoError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
        EnumCellValue::Date(val) => {
            let datetime = u16::try_from(val.year())
                .ok()
                .and_then(|n_year| {
                    ExcelDateTime::from_ymd(n_year, val.month() as u8, val.day() as u8).ok()
                });
            match datetime {
                Some(datetime) => {
                    worksheet.write_datetime_with_format(n_row, n_col, &datetime, format)?;
                }
                // Outside Excel's 1900..=9999 epoch: keep it readable as text.
                None => {
                    worksheet.write_string_with_format(
                        n_row,
                        n_col,
                        val.format("%d.%m.%Y").to_string(),
                        format,
                    )?;
                }
            }
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_valign(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    format
}

fn derive_format_valign(valign: &str) -> Option<FormatAlign> {
    let value = valign.trim().to_ascii_lowercase();
    match value.as_str() {
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxIoError> {
    u32::try_from(value)
        .map_err(|_| XlsxIoError::InvalidArgument(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, XlsxIoError> {
    u16::try_from(value)
        .map_err(|_| XlsxIoError::InvalidArgument(format!("column index overflow: {value}")))
}
