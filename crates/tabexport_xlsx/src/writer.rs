//! XLSX writer kernel that renders a buffered [`MemoryDocument`] into a workbook.

use std::path::Path;

use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatPattern, Workbook, Worksheet,
};
use tracing::debug;

use crate::document::{MemoryDocument, SpecSheetBuffer, SpecStyleRecord};
use crate::error::ExportError;
use crate::spec::{EnumAlignment, EnumCellValue, EnumColor};
use crate::util::{
    cast_col_num, cast_row_num, convert_date_to_excel_serial, convert_datetime_to_excel_serial,
};

/// Grey used for banded rows (`GREY_25_PERCENT`).
const N_RGB_GREY_25_PERCENT: u32 = 0xC0C0C0;

/// Renders one document; styles are converted once and shared by all sheets.
pub struct XlsxWriter<'a> {
    document: &'a MemoryDocument,
    l_formats: Vec<Format>,
}

impl<'a> XlsxWriter<'a> {
    /// Prepare a writer for `document`.
    pub fn new(document: &'a MemoryDocument) -> Self {
        let l_formats = document
            .styles()
            .iter()
            .map(|record| derive_rust_xlsx_format(record, document))
            .collect();
        Self {
            document,
            l_formats,
        }
    }

    /// Build the in-memory workbook.
    pub fn build_workbook(&self) -> Result<Workbook, ExportError> {
        let mut workbook = Workbook::new();
        for sheet in self.document.sheets() {
            let worksheet = workbook.add_worksheet();
            self.write_sheet(worksheet, sheet)?;
        }
        Ok(workbook)
    }

    /// Save the workbook to `path_file_out`.
    pub fn save(&self, path_file_out: impl AsRef<Path>) -> Result<(), ExportError> {
        let path_file_out = path_file_out.as_ref();
        self.build_workbook()?.save(path_file_out)?;
        debug!(
            path = %path_file_out.display(),
            n_sheets = self.document.sheets().len(),
            n_styles = self.l_formats.len(),
            "saved workbook"
        );
        Ok(())
    }

    /// Render the workbook into xlsx bytes.
    pub fn save_to_buffer(&self) -> Result<Vec<u8>, ExportError> {
        Ok(self.build_workbook()?.save_to_buffer()?)
    }

    fn write_sheet(
        &self,
        worksheet: &mut Worksheet,
        sheet: &SpecSheetBuffer,
    ) -> Result<(), ExportError> {
        let fmt_default = Format::new();
        worksheet.set_name(&sheet.name)?;

        for (n_col, n_width) in &sheet.dict_col_widths {
            worksheet.set_column_width(*n_col, *n_width as f64)?;
        }

        // Merges first: `merge_range` writes an empty anchor that the cell pass overwrites.
        for range in &sheet.l_merges {
            let fmt_anchor = sheet
                .cell(range.first_row, range.first_col)
                .and_then(|cell| cell.style)
                .and_then(|style| self.l_formats.get(style.index()))
                .unwrap_or(&fmt_default);
            worksheet.merge_range(
                cast_row_num(range.first_row)?,
                cast_col_num(range.first_col)?,
                cast_row_num(range.last_row)?,
                cast_col_num(range.last_col)?,
                "",
                fmt_anchor,
            )?;
        }

        for ((n_row, n_col), cell) in &sheet.dict_cells {
            let format = cell
                .style
                .and_then(|style| self.l_formats.get(style.index()))
                .unwrap_or(&fmt_default);
            write_cell_with_format(worksheet, *n_row, *n_col, cell.value.as_ref(), format)?;
        }

        if let Some((n_row, n_col)) = sheet.freeze_panes {
            worksheet.set_freeze_panes(n_row, n_col)?;
        }
        if let Some(range) = &sheet.autofilter {
            worksheet.autofilter(
                cast_row_num(range.first_row)?,
                cast_col_num(range.first_col)?,
                cast_row_num(range.last_row)?,
                cast_col_num(range.last_col)?,
            )?;
        }
        if let Some(n_zoom) = sheet.zoom {
            worksheet.set_zoom(n_zoom);
        }
        Ok(())
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    n_row: u32,
    n_col: u16,
    value: Option<&EnumCellValue>,
    format: &Format,
) -> Result<(), ExportError> {
    let Some(value) = value else {
        worksheet.write_blank(n_row, n_col, format)?;
        return Ok(());
    };
    match value {
        EnumCellValue::Blank => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumCellValue::Boolean(val) => {
            worksheet.write_boolean_with_format(n_row, n_col, *val, format)?;
        }
        EnumCellValue::Integer(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val as f64, format)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
        EnumCellValue::Date(val) => {
            worksheet.write_number_with_format(
                n_row,
                n_col,
                convert_date_to_excel_serial(val),
                format,
            )?;
        }
        EnumCellValue::DateTime(val) | EnumCellValue::Timestamp(val) => {
            worksheet.write_number_with_format(
                n_row,
                n_col,
                convert_datetime_to_excel_serial(val),
                format,
            )?;
        }
        EnumCellValue::Text(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumCellValue::Formula(val) => {
            worksheet.write_formula_with_format(n_row, n_col, val.as_str(), format)?;
        }
        EnumCellValue::Opaque(type_name) => {
            return Err(ExportError::unsupported(type_name.clone()));
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(record: &SpecStyleRecord, document: &MemoryDocument) -> Format {
    let mut format = Format::new().set_align(derive_format_align(record.alignment));

    if let Some(color) = record.fill_color {
        format = format
            .set_pattern(FormatPattern::Solid)
            .set_background_color(derive_color(color));
    }

    if let Some(font) = &record.font {
        if font.bold {
            format = format.set_bold();
        }
        if let Some(color) = font.color {
            format = format.set_font_color(derive_color(color));
        }
        if let Some(size) = font.size_points {
            format = format.set_font_size(f64::from(size));
        }
    }

    format = format
        .set_border_top(derive_format_border(record.border.top))
        .set_border_bottom(derive_format_border(record.border.bottom))
        .set_border_left(derive_format_border(record.border.left))
        .set_border_right(derive_format_border(record.border.right));

    if record.wrap_text {
        format = format.set_text_wrap();
    }

    if let Some(pattern) = record.data_format.and_then(|code| document.data_format(code)) {
        format = format.set_num_format(pattern);
    }

    format
}

fn derive_format_border(border: u8) -> FormatBorder {
    match border {
        0 => FormatBorder::None,
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        _ => FormatBorder::Thin,
    }
}

fn derive_format_align(alignment: EnumAlignment) -> FormatAlign {
    match alignment {
        EnumAlignment::Left => FormatAlign::Left,
        EnumAlignment::Right => FormatAlign::Right,
        EnumAlignment::Center => FormatAlign::Center,
    }
}

fn derive_color(color: EnumColor) -> Color {
    match color {
        EnumColor::White => Color::White,
        EnumColor::Grey25Percent => Color::RGB(N_RGB_GREY_25_PERCENT),
        EnumColor::Red => Color::Red,
        EnumColor::Rgb(n_rgb) => Color::RGB(n_rgb),
    }
}
