//! `bdaykit_io_xlsx` v1:
//! Spreadsheet IO kernel for the birthday list report.
//!
//! Modules:
//! - `conf`   : constants and default presets
//! - `spec`   : specs/models/options
//! - `util`   : pure helper functions (value conversion, highlight rules)
//! - `reader` : first-worksheet reader into a DataFrame
//! - `writer` : DataFrame-to-worksheet writer kernel
//! - `error`  : shared error type
pub mod conf;
pub mod error;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_NUM_FORMAT_DATE, EnumFmtKey, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX,
    N_NROWS_EXCEL_MAX, N_WIDTH_COL_DEFAULT, TUP_EXCEL_ILLEGAL, derive_default_xlsx_formats,
    derive_fmt_highlight_green, derive_fmt_highlight_yellow,
};
pub use error::XlsxIoError;
pub use reader::{read_table_from_bytes, read_table_from_path};
pub use spec::{
    EnumCellValue, EnumHighlightPredicate, EnumHighlightTarget, SpecCellFormat,
    SpecHighlightRule, SpecSheetReport, SpecXlsxSheetWriteOptions,
};
pub use util::{
    derive_days_from_naive_date, derive_naive_date_from_days, is_highlight_match,
    render_highlight_formula, sanitize_sheet_name,
};
pub use writer::{XlsxWriter, derive_cell_value_from_any_value};
