//! Export constants and default preset factories.

use crate::spec::{
    EnumAlignment, EnumDateFormatType, EnumValueClass, SpecCellFormat, SpecDateFormats,
    SpecExportOptions,
};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Auto-filter covers at most this many header columns (`A1:Z1`).
pub const N_NCOLS_AUTOFILTER_MAX: usize = 26;

/// Currency pattern: two decimals, negative amounts in red.
pub const C_FORMAT_CURRENCY: &str = "#,##0.00;[Red]-#,##0.00";
/// Integer pattern with thousands grouping.
pub const C_FORMAT_INTEGER: &str = "#,##0";
/// Decimal pattern with thousands grouping and up to six fraction digits.
pub const C_FORMAT_DECIMAL: &str = "#,###.######";
/// Text pattern used by the fallback format.
pub const C_FORMAT_TEXT: &str = "@";

/// Default date pattern.
pub const C_PATTERN_DATE: &str = "MM/dd/yyyy";
/// Default date pattern with minutes.
pub const C_PATTERN_TIMESTAMP_MINUTES: &str = "MM/dd/yyyy HH:mm";
/// Default date pattern with seconds.
pub const C_PATTERN_TIMESTAMP_SECONDS: &str = "MM/dd/yyyy HH:mm:ss";
/// Default date pattern with milliseconds.
pub const C_PATTERN_TIMESTAMP_MILLIS: &str = "MM/dd/yyyy HH:mm:ss.000";

/// Default column width in characters.
pub const N_WIDTH_COL_DEFAULT: usize = 20;
/// Width for currency, integer and boolean columns.
pub const N_WIDTH_COL_NARROW: usize = 10;
/// Border weight applied to every side of a cached style.
pub const N_BORDER_WIDTH: u8 = 1;

/// Build the default value-class rules, most specific class first.
///
/// Integer values hit `Integer` before `Number`; dates and timestamps hit their
/// own rule before the generic `DateTime` rule.
pub fn derive_default_type_formats(
    date_formats: &SpecDateFormats,
) -> Vec<(EnumValueClass, SpecCellFormat)> {
    vec![
        (
            EnumValueClass::Integer,
            SpecCellFormat::from_data_format_aligned(C_FORMAT_INTEGER, EnumAlignment::Right),
        ),
        (
            EnumValueClass::Number,
            SpecCellFormat::from_data_format_aligned(C_FORMAT_DECIMAL, EnumAlignment::Right),
        ),
        (
            EnumValueClass::Date,
            SpecCellFormat::from_data_format(date_formats.pattern(EnumDateFormatType::Date)),
        ),
        (
            EnumValueClass::Timestamp,
            SpecCellFormat::from_data_format(
                date_formats.pattern(EnumDateFormatType::TimestampMillis),
            ),
        ),
        (
            EnumValueClass::DateTime,
            SpecCellFormat::from_data_format(
                date_formats.pattern(EnumDateFormatType::TimestampMinutes),
            ),
        ),
    ]
}

/// Format applied when neither registry has a match.
pub fn derive_fallback_cell_format() -> SpecCellFormat {
    SpecCellFormat {
        data_format: Some(C_FORMAT_TEXT.to_string()),
        alignment: EnumAlignment::Left,
        wrap_text: true,
        ..Default::default()
    }
}

/// Build default export options.
pub fn derive_default_export_options() -> SpecExportOptions {
    SpecExportOptions::default()
}
