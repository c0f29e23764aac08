//! High-level exporter: typed item lists and polars frames into styled sheets.

use std::io::Cursor;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::{AnyValue, DataFrame, DataType, IpcReader, SerReader, TimeUnit};
use tracing::info;

use crate::conf::{C_FORMAT_CURRENCY, N_WIDTH_COL_NARROW, derive_default_export_options};
use crate::document::{DocumentModel, MemoryDocument};
use crate::error::ExportError;
use crate::provider::ContentProvider;
use crate::sheet::{ExportSheet, ExportWorkbook};
use crate::spec::{
    EnumCellValue, EnumDateFormatType, EnumPropertyType, EnumValueClass, SpecColumnHeader,
    SpecExportColumn, SpecExportOptions,
};

/// Days between `0001-01-01` (CE day 1) and the Unix epoch.
const N_DAYS_CE_UNIX_EPOCH: i32 = 719_163;

/// Builds one workbook from lists of items or data frames.
#[derive(Debug)]
pub struct ExcelExporter<D: DocumentModel = MemoryDocument> {
    options: SpecExportOptions,
    workbook: ExportWorkbook<D>,
}

impl Default for ExcelExporter<MemoryDocument> {
    fn default() -> Self {
        Self::new()
    }
}

impl ExcelExporter<MemoryDocument> {
    /// Exporter with default options, buffering into memory.
    pub fn new() -> Self {
        Self::with_options(derive_default_export_options())
    }

    /// Exporter with explicit options, buffering into memory.
    pub fn with_options(options: SpecExportOptions) -> Self {
        Self::with_document(MemoryDocument::new(), options)
    }

    /// Flush and save as xlsx.
    pub fn save(&mut self, path_file_out: impl AsRef<Path>) -> Result<(), ExportError> {
        self.workbook.save(path_file_out)
    }

    /// Flush and render xlsx bytes.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>, ExportError> {
        self.workbook.save_to_buffer()
    }
}

impl<D: DocumentModel> ExcelExporter<D> {
    /// Exporter writing into `document`.
    pub fn with_document(document: D, options: SpecExportOptions) -> Self {
        Self {
            options,
            workbook: ExportWorkbook::with_document(document),
        }
    }

    /// Export options.
    pub fn options(&self) -> &SpecExportOptions {
        &self.options
    }

    /// Fresh provider for one sheet, built from the exporter options.
    pub fn create_provider(&self) -> ContentProvider {
        ContentProvider::new(self.options.clone())
    }

    /// Width (characters) for columns that declare none.
    pub fn set_default_col_width(&mut self, n_width: usize) -> &mut Self {
        self.options.default_col_width = n_width;
        self
    }

    /// Workbook being built.
    pub fn workbook(&self) -> &ExportWorkbook<D> {
        &self.workbook
    }

    /// Mutable workbook, e.g. for hand-built sheets.
    pub fn workbook_mut(&mut self) -> &mut ExportWorkbook<D> {
        &mut self.workbook
    }

    /// Consume the exporter and return its workbook.
    pub fn into_workbook(self) -> ExportWorkbook<D> {
        self.workbook
    }

    ////////////////////////////////////////////////////////////////////////////
    // #region ItemSheets

    /// Add a sheet with a header row of column titles and one row per item.
    ///
    /// Each column's declared type registers its format on `provider`. With no
    /// items the sheet stays empty.
    pub fn add_sheet<T>(
        &mut self,
        mut provider: ContentProvider,
        title: &str,
        items: &[T],
        columns: &[SpecExportColumn<T>],
    ) -> Result<&mut ExportSheet, ExportError> {
        if items.is_empty() {
            info!(sheet = title, "nothing to export");
            return Ok(self.workbook.add_sheet(title, provider));
        }

        let mut l_headers = Vec::with_capacity(columns.len());
        for column in columns {
            let n_width = self.put_field_format(
                &mut provider,
                &column.name,
                column.property_type,
                column.value_class,
            )?;
            l_headers.push(SpecColumnHeader {
                name: column.name.clone(),
                title: column.title.clone(),
                width: column.width.unwrap_or(n_width),
            });
        }

        let if_freeze_header = self.options.if_freeze_header;
        let sheet = self.workbook.add_sheet(title, provider);
        if if_freeze_header {
            sheet.create_freeze_pane(1, 0);
        }
        sheet.set_columns(&l_headers)?;
        for item in items {
            sheet.add_row_values(columns.iter().map(|column| column.extract(item)))?;
        }
        Ok(sheet)
    }

    /// Register the format implied by a column's declared type.
    ///
    /// Returns the column width to use when the column sets none.
    fn put_field_format(
        &self,
        provider: &mut ContentProvider,
        name: &str,
        property_type: EnumPropertyType,
        value_class: Option<EnumValueClass>,
    ) -> Result<usize, ExportError> {
        let date_formats = &self.options.date_formats;
        let n_width_default = self.options.default_col_width;
        let rule_date = match property_type {
            EnumPropertyType::Currency => {
                provider.register_override_pattern(name, C_FORMAT_CURRENCY)?;
                return Ok(N_WIDTH_COL_NARROW);
            }
            EnumPropertyType::Date => Some(EnumDateFormatType::Date),
            EnumPropertyType::DateTime => Some(EnumDateFormatType::TimestampMinutes),
            EnumPropertyType::DateTimeSeconds => Some(EnumDateFormatType::TimestampSeconds),
            EnumPropertyType::DateTimeMillis => Some(EnumDateFormatType::TimestampMillis),
            EnumPropertyType::Unspecified => match value_class {
                Some(EnumValueClass::Date) => Some(EnumDateFormatType::Date),
                Some(EnumValueClass::DateTime | EnumValueClass::Timestamp) => {
                    Some(EnumDateFormatType::TimestampMinutes)
                }
                Some(EnumValueClass::Integer | EnumValueClass::Boolean) => {
                    return Ok(N_WIDTH_COL_NARROW);
                }
                _ => None,
            },
        };
        if let Some(rule_date) = rule_date {
            provider.register_override_pattern(name, date_formats.pattern(rule_date))?;
        }
        Ok(n_width_default)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region FrameSheets

    /// Add a sheet from a polars frame: column names as header, one row per frame row.
    pub fn add_sheet_from_dataframe(
        &mut self,
        mut provider: ContentProvider,
        title: &str,
        df: &DataFrame,
    ) -> Result<&mut ExportSheet, ExportError> {
        if df.height() == 0 {
            info!(sheet = title, "nothing to export");
            return Ok(self.workbook.add_sheet(title, provider));
        }

        let l_cols = df.get_columns();
        let mut l_headers = Vec::with_capacity(l_cols.len());
        for col in l_cols {
            let c_name = col.name().to_string();
            let value_class = derive_value_class_from_dtype(col.dtype());
            let n_width = self.put_field_format(
                &mut provider,
                &c_name,
                EnumPropertyType::Unspecified,
                value_class,
            )?;
            l_headers.push(SpecColumnHeader {
                title: c_name.clone(),
                name: c_name,
                width: n_width,
            });
        }

        let if_freeze_header = self.options.if_freeze_header;
        let sheet = self.workbook.add_sheet(title, provider);
        if if_freeze_header {
            sheet.create_freeze_pane(1, 0);
        }
        sheet.set_columns(&l_headers)?;
        for n_row in 0..df.height() {
            let mut l_values = Vec::with_capacity(l_cols.len());
            for col in l_cols {
                l_values.push(derive_cell_value_from_any_value(col.get(n_row)?));
            }
            sheet.add_row_values(l_values)?;
        }
        Ok(sheet)
    }

    /// Add a sheet from Arrow IPC bytes.
    pub fn add_sheet_from_ipc_bytes(
        &mut self,
        provider: ContentProvider,
        title: &str,
        v_ipc_df: &[u8],
    ) -> Result<&mut ExportSheet, ExportError> {
        let df = derive_dataframe_from_ipc_bytes(v_ipc_df)?;
        self.add_sheet_from_dataframe(provider, title, &df)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
}

fn derive_dataframe_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<DataFrame, ExportError> {
    Ok(IpcReader::new(Cursor::new(v_ipc_df)).finish()?)
}

fn derive_value_class_from_dtype(dtype: &DataType) -> Option<EnumValueClass> {
    match dtype {
        DataType::Boolean => Some(EnumValueClass::Boolean),
        DataType::Date => Some(EnumValueClass::Date),
        DataType::Datetime(_, _) => Some(EnumValueClass::Timestamp),
        DataType::String => Some(EnumValueClass::Text),
        dtype if dtype.is_integer() => Some(EnumValueClass::Integer),
        dtype if dtype.is_float() => Some(EnumValueClass::Number),
        _ => None,
    }
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::Blank,
        AnyValue::Boolean(val) => EnumCellValue::Boolean(val),
        AnyValue::String(val) => EnumCellValue::Text(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::Text(val.to_string()),
        AnyValue::UInt8(val) => EnumCellValue::Integer(i64::from(val)),
        AnyValue::UInt16(val) => EnumCellValue::Integer(i64::from(val)),
        AnyValue::UInt32(val) => EnumCellValue::Integer(i64::from(val)),
        AnyValue::UInt64(val) => i64::try_from(val)
            .map(EnumCellValue::Integer)
            .unwrap_or(EnumCellValue::Number(val as f64)),
        AnyValue::Int8(val) => EnumCellValue::Integer(i64::from(val)),
        AnyValue::Int16(val) => EnumCellValue::Integer(i64::from(val)),
        AnyValue::Int32(val) => EnumCellValue::Integer(i64::from(val)),
        AnyValue::Int64(val) => EnumCellValue::Integer(val),
        AnyValue::Int128(val) => i64::try_from(val)
            .map(EnumCellValue::Integer)
            .unwrap_or(EnumCellValue::Number(val as f64)),
        AnyValue::Float32(val) => EnumCellValue::Number(f64::from(val)),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        AnyValue::Date(n_days) => convert_days_to_date(n_days)
            .map(EnumCellValue::Date)
            .unwrap_or(EnumCellValue::Blank),
        AnyValue::Datetime(val, unit, _) | AnyValue::DatetimeOwned(val, unit, _) => {
            convert_epoch_to_datetime(val, unit)
                .map(EnumCellValue::Timestamp)
                .unwrap_or(EnumCellValue::Blank)
        }
        _ => EnumCellValue::Text(value.to_string()),
    }
}

fn convert_days_to_date(n_days_unix: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(n_days_unix.checked_add(N_DAYS_CE_UNIX_EPOCH)?)
}

fn convert_epoch_to_datetime(val: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(val)?,
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(val)?,
        TimeUnit::Nanoseconds => DateTime::from_timestamp_nanos(val),
    };
    Some(dt.naive_utc())
}
