//! Document-model seam consumed by the export core, plus the buffered model.
//!
//! The core only emits into a [`DocumentModel`]; it never reads back. The
//! [`MemoryDocument`] records every call so it can be rendered by
//! [`crate::XlsxWriter`] or inspected directly.

use std::collections::BTreeMap;

use crate::error::ExportError;
use crate::spec::{EnumAlignment, EnumCellValue, EnumColor, SpecFont};
use crate::util::{cast_col_num, cast_row_num};

////////////////////////////////////////////////////////////////////////////////
// #region Handles

/// Opaque style resource owned by the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleHandle(pub(crate) usize);

impl StyleHandle {
    /// Position in the document's style table.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Numeric code of a registered data-format pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatCode(pub(crate) usize);

/// Sheet identifier inside one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetId(pub(crate) usize);

impl SheetId {
    /// Zero-based sheet position.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Address of one cell (zero-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecCellRef {
    /// Owning sheet.
    pub sheet: SheetId,
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
}

/// Inclusive rectangular cell range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecCellRange {
    /// First row (inclusive).
    pub first_row: usize,
    /// First column (inclusive).
    pub first_col: usize,
    /// Last row (inclusive).
    pub last_row: usize,
    /// Last column (inclusive).
    pub last_col: usize,
}

impl SpecCellRange {
    /// Validate bounds order.
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.first_row > self.last_row || self.first_col > self.last_col {
            return Err(ExportError::InvalidRegion {
                first_row: self.first_row,
                last_row: self.last_row,
                first_col: self.first_col,
                last_col: self.last_col,
            });
        }
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DocumentModel

/// Capabilities a document-writing backend provides to the export core.
pub trait DocumentModel {
    /// Append a worksheet named `name` (already sanitized and unique).
    fn add_sheet(&mut self, name: &str) -> SheetId;

    /// Allocate an empty style.
    fn create_style(&mut self) -> StyleHandle;
    /// Register `pattern`, reusing the code of an identical earlier pattern.
    fn register_data_format(&mut self, pattern: &str) -> FormatCode;
    /// Set horizontal alignment.
    fn set_style_alignment(&mut self, style: StyleHandle, alignment: EnumAlignment);
    /// Set fill color with a solid pattern.
    fn set_style_fill(&mut self, style: StyleHandle, color: EnumColor);
    /// Set font.
    fn set_style_font(&mut self, style: StyleHandle, font: &SpecFont);
    /// Set the same border weight on all four sides.
    fn set_style_border(&mut self, style: StyleHandle, width: u8);
    /// Set text wrapping.
    fn set_style_wrap_text(&mut self, style: StyleHandle, wrap_text: bool);
    /// Attach a registered data format.
    fn set_style_data_format(&mut self, style: StyleHandle, code: FormatCode);

    /// Write a value into a cell.
    fn set_cell_value(&mut self, cell: SpecCellRef, value: &EnumCellValue)
    -> Result<(), ExportError>;
    /// Attach a style to a cell.
    fn set_cell_style(&mut self, cell: SpecCellRef, style: StyleHandle) -> Result<(), ExportError>;

    /// Set column width in characters.
    fn set_column_width(&mut self, sheet: SheetId, col: usize, width: usize)
    -> Result<(), ExportError>;
    /// Freeze rows above `row` and columns left of `col`.
    fn set_freeze_panes(&mut self, sheet: SheetId, row: usize, col: usize)
    -> Result<(), ExportError>;
    /// Merge a range of cells.
    fn merge_range(&mut self, sheet: SheetId, range: SpecCellRange) -> Result<(), ExportError>;
    /// Set the auto-filter range.
    fn set_autofilter(&mut self, sheet: SheetId, range: SpecCellRange) -> Result<(), ExportError>;
    /// Set zoom in percent.
    fn set_zoom(&mut self, sheet: SheetId, zoom: u16) -> Result<(), ExportError>;
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MemoryDocument

/// Border weight per side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecCellBorder {
    /// Top border weight.
    pub top: u8,
    /// Bottom border weight.
    pub bottom: u8,
    /// Left border weight.
    pub left: u8,
    /// Right border weight.
    pub right: u8,
}

/// Concrete style as accumulated from the style mutators.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecStyleRecord {
    /// Horizontal alignment.
    pub alignment: EnumAlignment,
    /// Solid fill color.
    pub fill_color: Option<EnumColor>,
    /// Font.
    pub font: Option<SpecFont>,
    /// Borders.
    pub border: SpecCellBorder,
    /// Text wrapping.
    pub wrap_text: bool,
    /// Attached data-format code.
    pub data_format: Option<FormatCode>,
}

/// One buffered cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecCellBuffer {
    /// Written value; `None` when only a style was set.
    pub value: Option<EnumCellValue>,
    /// Attached style.
    pub style: Option<StyleHandle>,
}

/// One buffered worksheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetBuffer {
    /// Sheet name.
    pub name: String,
    /// Cells by `(row, col)`.
    pub dict_cells: BTreeMap<(u32, u16), SpecCellBuffer>,
    /// Column widths in characters.
    pub dict_col_widths: BTreeMap<u16, usize>,
    /// Freeze pane `(row, col)`.
    pub freeze_panes: Option<(u32, u16)>,
    /// Merged ranges.
    pub l_merges: Vec<SpecCellRange>,
    /// Auto-filter range.
    pub autofilter: Option<SpecCellRange>,
    /// Zoom in percent.
    pub zoom: Option<u16>,
}

impl SpecSheetBuffer {
    /// Buffered cell at `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> Option<&SpecCellBuffer> {
        let n_row = u32::try_from(row).ok()?;
        let n_col = u16::try_from(col).ok()?;
        self.dict_cells.get(&(n_row, n_col))
    }
}

/// In-memory document that buffers every call until rendered.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    l_sheets: Vec<SpecSheetBuffer>,
    l_styles: Vec<SpecStyleRecord>,
    l_data_formats: Vec<String>,
}

impl MemoryDocument {
    /// Empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// All buffered sheets in creation order.
    pub fn sheets(&self) -> &[SpecSheetBuffer] {
        &self.l_sheets
    }

    /// Buffered sheet by id.
    pub fn sheet(&self, sheet: SheetId) -> Option<&SpecSheetBuffer> {
        self.l_sheets.get(sheet.0)
    }

    /// All allocated styles; the handle is the index.
    pub fn styles(&self) -> &[SpecStyleRecord] {
        &self.l_styles
    }

    /// Style by handle.
    pub fn style(&self, style: StyleHandle) -> Option<&SpecStyleRecord> {
        self.l_styles.get(style.0)
    }

    /// Registered pattern for `code`.
    pub fn data_format(&self, code: FormatCode) -> Option<&str> {
        self.l_data_formats.get(code.0).map(String::as_str)
    }

    /// Pattern attached to `style`, if any.
    pub fn style_data_format(&self, style: StyleHandle) -> Option<&str> {
        self.style(style)
            .and_then(|record| record.data_format)
            .and_then(|code| self.data_format(code))
    }

    /// Number of distinct registered patterns.
    pub fn data_format_count(&self) -> usize {
        self.l_data_formats.len()
    }

    fn sheet_mut(&mut self, sheet: SheetId) -> Result<&mut SpecSheetBuffer, ExportError> {
        self.l_sheets
            .get_mut(sheet.0)
            .ok_or(ExportError::UnknownSheet(sheet.0))
    }

    fn update_style(&mut self, style: StyleHandle, apply: impl FnOnce(&mut SpecStyleRecord)) {
        // Handles minted by another document are ignored.
        if let Some(record) = self.l_styles.get_mut(style.0) {
            apply(record);
        }
    }

    fn cell_mut(&mut self, cell: SpecCellRef) -> Result<&mut SpecCellBuffer, ExportError> {
        let key = (cast_row_num(cell.row)?, cast_col_num(cell.col)?);
        Ok(self.sheet_mut(cell.sheet)?.dict_cells.entry(key).or_default())
    }
}

impl DocumentModel for MemoryDocument {
    fn add_sheet(&mut self, name: &str) -> SheetId {
        self.l_sheets.push(SpecSheetBuffer {
            name: name.to_string(),
            ..Default::default()
        });
        SheetId(self.l_sheets.len() - 1)
    }

    fn create_style(&mut self) -> StyleHandle {
        self.l_styles.push(SpecStyleRecord::default());
        StyleHandle(self.l_styles.len() - 1)
    }

    fn register_data_format(&mut self, pattern: &str) -> FormatCode {
        if let Some(n_idx) = self.l_data_formats.iter().position(|c| c == pattern) {
            return FormatCode(n_idx);
        }
        self.l_data_formats.push(pattern.to_string());
        FormatCode(self.l_data_formats.len() - 1)
    }

    fn set_style_alignment(&mut self, style: StyleHandle, alignment: EnumAlignment) {
        self.update_style(style, |record| record.alignment = alignment);
    }

    fn set_style_fill(&mut self, style: StyleHandle, color: EnumColor) {
        self.update_style(style, |record| record.fill_color = Some(color));
    }

    fn set_style_font(&mut self, style: StyleHandle, font: &SpecFont) {
        self.update_style(style, |record| record.font = Some(font.clone()));
    }

    fn set_style_border(&mut self, style: StyleHandle, width: u8) {
        self.update_style(style, |record| {
            record.border = SpecCellBorder {
                top: width,
                bottom: width,
                left: width,
                right: width,
            }
        });
    }

    fn set_style_wrap_text(&mut self, style: StyleHandle, wrap_text: bool) {
        self.update_style(style, |record| record.wrap_text = wrap_text);
    }

    fn set_style_data_format(&mut self, style: StyleHandle, code: FormatCode) {
        self.update_style(style, |record| record.data_format = Some(code));
    }

    fn set_cell_value(
        &mut self,
        cell: SpecCellRef,
        value: &EnumCellValue,
    ) -> Result<(), ExportError> {
        value.validate_writable()?;
        self.cell_mut(cell)?.value = Some(value.clone());
        Ok(())
    }

    fn set_cell_style(&mut self, cell: SpecCellRef, style: StyleHandle) -> Result<(), ExportError> {
        self.cell_mut(cell)?.style = Some(style);
        Ok(())
    }

    fn set_column_width(
        &mut self,
        sheet: SheetId,
        col: usize,
        width: usize,
    ) -> Result<(), ExportError> {
        let n_col = cast_col_num(col)?;
        self.sheet_mut(sheet)?.dict_col_widths.insert(n_col, width);
        Ok(())
    }

    fn set_freeze_panes(
        &mut self,
        sheet: SheetId,
        row: usize,
        col: usize,
    ) -> Result<(), ExportError> {
        let freeze_panes = (cast_row_num(row)?, cast_col_num(col)?);
        self.sheet_mut(sheet)?.freeze_panes = Some(freeze_panes);
        Ok(())
    }

    fn merge_range(&mut self, sheet: SheetId, range: SpecCellRange) -> Result<(), ExportError> {
        range.validate()?;
        self.sheet_mut(sheet)?.l_merges.push(range);
        Ok(())
    }

    fn set_autofilter(&mut self, sheet: SheetId, range: SpecCellRange) -> Result<(), ExportError> {
        range.validate()?;
        self.sheet_mut(sheet)?.autofilter = Some(range);
        Ok(())
    }

    fn set_zoom(&mut self, sheet: SheetId, zoom: u16) -> Result<(), ExportError> {
        self.sheet_mut(sheet)?.zoom = Some(zoom);
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
