//! Spreadsheet reader that turns the first worksheet into a polars DataFrame.
//!
//! The first non-empty row is the header. Column dtypes are inferred from
//! the cell types below the header:
//! - only date cells          -> `Date`
//! - only integral numbers    -> `Int64`
//! - only numbers             -> `Float64`
//! - anything else / mixed    -> `String`

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use chrono::NaiveDate;
use polars::prelude::{Column, DataFrame, DataType};
use tracing::debug;

use crate::error::XlsxIoError;
use crate::util::{derive_days_from_naive_date, derive_unique_headers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumColumnKind {
    Empty,
    Date,
    Integer,
    Float,
    Text,
}

/// Read the first worksheet of an `.xlsx`/`.xls`/`.ods` file.
pub fn read_table_from_path(path: impl AsRef<Path>) -> Result<DataFrame, XlsxIoError> {
    let path = path.as_ref();
    let workbook = open_workbook_auto(path).map_err(|err| {
        XlsxIoError::InputFormat(format!("Cannot open {}: {err}", path.display()))
    })?;
    derive_dataframe_from_workbook(workbook)
}

/// Read the first worksheet of an in-memory spreadsheet document.
pub fn read_table_from_bytes(v_bytes: &[u8]) -> Result<DataFrame, XlsxIoError> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(v_bytes))
        .map_err(|err| XlsxIoError::InputFormat(format!("Cannot open workbook: {err}")))?;
    derive_dataframe_from_workbook(workbook)
}

fn derive_dataframe_from_workbook<RS>(mut workbook: Sheets<RS>) -> Result<DataFrame, XlsxIoError>
where
    RS: Read + Seek,
{
    let Some(sheet_name) = workbook.sheet_names().into_iter().next() else {
        return Err(XlsxIoError::InputFormat(
            "Workbook contains no worksheet.".to_string(),
        ));
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| XlsxIoError::InputFormat(format!("Cannot read {sheet_name:?}: {err}")))?;

    let l_rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();
    debug!(sheet = %sheet_name, n_rows = l_rows.len(), "worksheet loaded");
    derive_dataframe_from_cells(&l_rows)
}

/// Build a DataFrame from a header row followed by data rows.
pub fn derive_dataframe_from_cells(rows: &[Vec<Data>]) -> Result<DataFrame, XlsxIoError> {
    let Some((row_header, l_rows_body)) = rows.split_first() else {
        return Ok(DataFrame::empty());
    };

    let l_headers_raw: Vec<String> = row_header
        .iter()
        .map(|cell| derive_text_from_cell(cell).unwrap_or_default())
        .collect();
    let l_headers = derive_unique_headers(&l_headers_raw);

    let mut l_columns = Vec::with_capacity(l_headers.len());
    for (n_idx_col, c_header) in l_headers.iter().enumerate() {
        let l_cells: Vec<&Data> = l_rows_body
            .iter()
            .map(|row| row.get(n_idx_col).unwrap_or(&Data::Empty))
            .collect();
        l_columns.push(derive_column_from_cells(c_header, &l_cells)?);
    }

    Ok(DataFrame::new(l_columns)?)
}

fn derive_column_kind(cells: &[&Data]) -> EnumColumnKind {
    let mut kind = EnumColumnKind::Empty;
    for cell in cells {
        let kind_cell = match cell {
            Data::Empty => continue,
            Data::String(s) if s.is_empty() => continue,
            Data::DateTime(_) => EnumColumnKind::Date,
            Data::Int(_) => EnumColumnKind::Integer,
            Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => EnumColumnKind::Integer,
            Data::Float(_) => EnumColumnKind::Float,
            _ => return EnumColumnKind::Text,
        };
        kind = match (kind, kind_cell) {
            (EnumColumnKind::Empty, k) => k,
            (a, b) if a == b => a,
            (EnumColumnKind::Integer, EnumColumnKind::Float)
            | (EnumColumnKind::Float, EnumColumnKind::Integer) => EnumColumnKind::Float,
            _ => return EnumColumnKind::Text,
        };
    }
    kind
}

fn derive_column_from_cells(name: &str, cells: &[&Data]) -> Result<Column, XlsxIoError> {
    let column = match derive_column_kind(cells) {
        EnumColumnKind::Date => {
            let l_days: Vec<Option<i32>> = cells
                .iter()
                .map(|cell| derive_date_from_cell(cell).map(derive_days_from_naive_date))
                .collect();
            Column::new(name.into(), l_days).cast(&DataType::Date)?
        }
        EnumColumnKind::Integer => {
            let l_values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(n) => Some(*n),
                    Data::Float(n) => Some(*n as i64),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), l_values)
        }
        EnumColumnKind::Float => {
            let l_values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(n) => Some(*n as f64),
                    Data::Float(n) => Some(*n),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), l_values)
        }
        EnumColumnKind::Text | EnumColumnKind::Empty => {
            let l_values: Vec<Option<String>> =
                cells.iter().map(|cell| derive_text_from_cell(cell)).collect();
            Column::new(name.into(), l_values)
        }
    };
    Ok(column)
}

fn derive_date_from_cell(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|v| v.date()),
        _ => None,
    }
}

/// Render one cell as text; blanks and error cells become `None`.
fn derive_text_from_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Int(n) => Some(n.to_string()),
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some((*n as i64).to_string()),
        Data::Float(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(_) => derive_date_from_cell(cell).map(|d| d.format("%d.%m.%Y").to_string()),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}
