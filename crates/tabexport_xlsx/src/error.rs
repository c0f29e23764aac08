//! Crate-wide error type.

use thiserror::Error;

/// Errors raised by format registration, value writing and workbook output.
///
/// "No format found" is not an error: [`crate::FormatRegistry::resolve`]
/// returns `None` and the caller applies the fallback format.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The value has no cell representation (no number/date/text/boolean form).
    #[error("Type {type_name} not supported for cell values.")]
    UnsupportedValueType {
        /// Runtime type name reported by the value projection.
        type_name: String,
    },

    /// Override rejected at registration time.
    #[error("Malformed format override: {0}")]
    MalformedOverride(String),

    /// Row or column index does not fit the spreadsheet index type.
    #[error("{axis} index overflow: {value}")]
    IndexOverflow {
        /// `row` or `column`.
        axis: &'static str,
        /// Offending zero-based index.
        value: usize,
    },

    /// Sheet id is not known to the document.
    #[error("Unknown sheet id: {0}")]
    UnknownSheet(usize),

    /// Row referenced by a sheet operation does not exist yet.
    #[error("Unknown row index: {0}")]
    UnknownRow(usize),

    /// Merged region bounds are inverted.
    #[error("Invalid region: rows {first_row}..={last_row}, cols {first_col}..={last_col}")]
    InvalidRegion {
        /// First row (inclusive).
        first_row: usize,
        /// Last row (inclusive).
        last_row: usize,
        /// First column (inclusive).
        first_col: usize,
        /// Last column (inclusive).
        last_col: usize,
    },

    /// Error raised by `rust_xlsxwriter` while building or saving a workbook.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Error raised while reading or scanning a DataFrame source.
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Export options could not be deserialized.
    #[error("Invalid export options: {0}")]
    Config(#[from] serde_json::Error),
}

impl ExportError {
    /// Shorthand for [`ExportError::UnsupportedValueType`].
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        Self::UnsupportedValueType {
            type_name: type_name.into(),
        }
    }
}
