//! `tabexport_xlsx` v1:
//! Styled tabular export kernel.
//!
//! Module layout:
//! - `conf`     : constants and default presets
//! - `spec`     : cell formats, values, column specs and options
//! - `util`     : pure helper functions
//! - `error`    : crate error type
//! - `document` : document-model seam and in-memory document
//! - `registry` : name/value-class format registries
//! - `cache`    : per-document style cache
//! - `provider` : format resolution and row styling
//! - `sheet`    : sheet/row/cell model and workbook
//! - `exporter` : item-list and data-frame exporter
//! - `writer`   : pure-Rust xlsx writer kernel
pub mod cache;
pub mod conf;
pub mod document;
pub mod error;
pub mod exporter;
pub mod provider;
pub mod registry;
pub mod sheet;
pub mod spec;
pub mod util;
pub mod writer;

pub use cache::StyleCache;
pub use conf::{
    C_FORMAT_CURRENCY, C_FORMAT_DECIMAL, C_FORMAT_INTEGER, C_FORMAT_TEXT,
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, N_WIDTH_COL_DEFAULT,
    N_WIDTH_COL_NARROW,
};
pub use document::{
    DocumentModel, FormatCode, MemoryDocument, SheetId, SpecCellRange, SpecCellRef, StyleHandle,
};
pub use error::ExportError;
pub use exporter::ExcelExporter;
pub use provider::{ContentProvider, FormatHook, ValueHook};
pub use registry::FormatRegistry;
pub use sheet::{ExportCell, ExportRow, ExportSheet, ExportWorkbook};
pub use spec::{
    EnumAlignment, EnumCellValue, EnumColor, EnumDateFormatType, EnumPropertyType, EnumValueClass,
    SpecCellFormat, SpecColumnHeader, SpecDateFormats, SpecExportColumn, SpecExportOptions,
    SpecFont, SpecSessionFonts,
};
pub use util::sanitize_sheet_name;
pub use writer::XlsxWriter;
