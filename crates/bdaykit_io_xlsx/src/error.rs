//! Error type shared by the reader and writer kernels.

use polars::prelude::PolarsError;
use rust_xlsxwriter::XlsxError;

/// Failures surfaced by [`crate::reader`] and [`crate::writer`].
#[derive(Debug, thiserror::Error)]
pub enum XlsxIoError {
    /// Input document cannot be interpreted as a table.
    #[error("input format error: {0}")]
    InputFormat(String),
    /// Caller-supplied arguments are inconsistent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Writer was used after [`crate::writer::XlsxWriter::close`].
    #[error("Cannot write after close().")]
    Closed,
    /// Underlying workbook encoder failure.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
    /// Underlying dataframe failure.
    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),
}
