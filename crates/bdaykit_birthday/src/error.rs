//! Error type of the birthday report pipeline.

use bdaykit_io_xlsx::XlsxIoError;
use polars::prelude::PolarsError;

/// Failures surfaced by [`crate::normalize`] and [`crate::report`].
///
/// Bad cells and missing optional columns are never errors; only the table
/// engine and the workbook encoder can fail a run.
#[derive(Debug, thiserror::Error)]
pub enum BirthdayReportError {
    /// Reading the input or writing the workbook failed.
    #[error(transparent)]
    Io(#[from] XlsxIoError),
    /// Dataframe operation failed.
    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),
    /// Caller-supplied options are out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
