//! Stateless helper utilities shared by the sheet model and the xlsx writer.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::error::ExportError;

/// Day number (from CE) of the Excel 1900 epoch, `1899-12-30`.
const N_DAYS_CE_EXCEL_EPOCH: i32 = 693_594;
const N_SECS_PER_DAY: f64 = 86_400.0;

////////////////////////////////////////////////////////////////////////////////
// #region IndexCasting

/// Convert a zero-based row index into the spreadsheet row type.
pub fn cast_row_num(value: usize) -> Result<u32, ExportError> {
    if value >= N_NROWS_EXCEL_MAX {
        return Err(ExportError::IndexOverflow { axis: "row", value });
    }
    u32::try_from(value).map_err(|_| ExportError::IndexOverflow { axis: "row", value })
}

/// Convert a zero-based column index into the spreadsheet column type.
pub fn cast_col_num(value: usize) -> Result<u16, ExportError> {
    if value >= N_NCOLS_EXCEL_MAX {
        return Err(ExportError::IndexOverflow {
            axis: "column",
            value,
        });
    }
    u16::try_from(value).map_err(|_| ExportError::IndexOverflow {
        axis: "column",
        value,
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DateConversion

/// Excel serial day number (1900 date system) of `date`.
pub fn convert_date_to_excel_serial(date: &NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce() - N_DAYS_CE_EXCEL_EPOCH)
}

/// Excel serial number of `dt`; the fraction encodes the time of day.
pub fn convert_datetime_to_excel_serial(dt: &NaiveDateTime) -> f64 {
    let time = dt.time();
    let n_secs = f64::from(time.num_seconds_from_midnight())
        + f64::from(time.nanosecond().min(999_999_999)) / 1e9;
    convert_date_to_excel_serial(&dt.date()) + n_secs / N_SECS_PER_DAY
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
///
/// Excel also rejects a leading or trailing apostrophe, so those are stripped.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }

    let c_name: String = c_name
        .trim()
        .trim_matches('\'')
        .trim()
        .chars()
        .take(N_LEN_EXCEL_SHEET_NAME_MAX)
        .collect();
    let c_name = c_name.trim_end().trim_end_matches('\'');
    if c_name.is_empty() {
        return "Sheet".to_string();
    }
    c_name.to_string()
}

/// Return `name` or the first free `name__N` variant, and record it as taken.
///
/// Comparison is case-insensitive like Excel's own sheet-name check.
pub fn derive_unique_sheet_name(name: &str, set_names_existing: &mut BTreeSet<String>) -> String {
    if set_names_existing.insert(name.to_lowercase()) {
        return name.to_string();
    }

    let mut n_idx = 2usize;
    loop {
        let candidate = create_sheet_identifier(name, n_idx);
        if set_names_existing.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n_idx += 1;
    }
}

/// Create suffixed sheet name (`base__2`, `base__3`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx: usize) -> String {
    let c_sheet_name_suffix = format!("__{part_idx}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
