//! Sheet model: rows of resolved, auto-styled cells buffered until flushed
//! into a document through the workbook's style cache.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::{debug, warn};

use crate::cache::StyleCache;
use crate::conf::N_NCOLS_AUTOFILTER_MAX;
use crate::document::{DocumentModel, MemoryDocument, SheetId, SpecCellRange, SpecCellRef};
use crate::error::ExportError;
use crate::provider::ContentProvider;
use crate::spec::{EnumCellValue, SpecCellFormat, SpecColumnHeader};
use crate::util::{cast_col_num, cast_row_num, derive_unique_sheet_name, sanitize_sheet_name};
use crate::writer::XlsxWriter;

////////////////////////////////////////////////////////////////////////////////
// #region RowModel

/// One cell waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportCell {
    value: EnumCellValue,
    property: Option<String>,
    format: SpecCellFormat,
}

impl ExportCell {
    /// Value that will be written (after the value hook).
    pub fn value(&self) -> &EnumCellValue {
        &self.value
    }

    /// Property name the format was resolved for.
    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// Resolved and auto-styled format.
    pub fn format(&self) -> &SpecCellFormat {
        &self.format
    }

    /// Mutable format for manual customization before flush.
    pub fn format_mut(&mut self) -> &mut SpecCellFormat {
        &mut self.format
    }
}

/// One buffered row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    n_row: usize,
    l_cells: Vec<ExportCell>,
}

impl ExportRow {
    /// Zero-based row index in the sheet.
    pub fn index(&self) -> usize {
        self.n_row
    }

    /// Cells in column order.
    pub fn cells(&self) -> &[ExportCell] {
        &self.l_cells
    }

    /// Cell in column `col_idx`.
    pub fn cell_mut(&mut self, col_idx: usize) -> Option<&mut ExportCell> {
        self.l_cells.get_mut(col_idx)
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.l_cells.len()
    }

    /// Whether the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.l_cells.is_empty()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportSheet

/// Worksheet under construction. Owns its provider.
#[derive(Debug)]
pub struct ExportSheet {
    name: String,
    sheet: SheetId,
    provider: ContentProvider,
    l_rows: Vec<ExportRow>,
    n_rows: usize,
    l_property_names: Vec<String>,
    freeze_panes: Option<(usize, usize)>,
    zoom: Option<u16>,
    l_merges: Vec<(SpecCellRange, EnumCellValue)>,
    autofilter: Option<SpecCellRange>,
}

impl ExportSheet {
    fn new(name: String, sheet: SheetId, provider: ContentProvider) -> Self {
        Self {
            name,
            sheet,
            provider,
            l_rows: Vec::new(),
            n_rows: 0,
            l_property_names: Vec::new(),
            freeze_panes: None,
            zoom: None,
            l_merges: Vec::new(),
            autofilter: None,
        }
    }

    /// Final (sanitized, unique) sheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Document sheet id.
    pub fn id(&self) -> SheetId {
        self.sheet
    }

    /// Provider used for this sheet.
    pub fn provider(&self) -> &ContentProvider {
        &self.provider
    }

    /// Mutable provider, e.g. to register overrides before rows are added.
    pub fn provider_mut(&mut self) -> &mut ContentProvider {
        &mut self.provider
    }

    /// Number of rows added so far, flushed ones included.
    pub fn row_count(&self) -> usize {
        self.n_rows
    }

    /// Rows not yet flushed.
    pub fn pending_rows(&self) -> &[ExportRow] {
        &self.l_rows
    }

    /// Pending row by sheet row index.
    pub fn row_mut(&mut self, row_idx: usize) -> Option<&mut ExportRow> {
        self.l_rows.iter_mut().find(|row| row.n_row == row_idx)
    }

    /// Property names bound to columns by [`Self::set_columns`].
    pub fn property_names(&self) -> &[String] {
        &self.l_property_names
    }

    fn add_row(&mut self) -> &mut ExportRow {
        let n_row = self.n_rows;
        self.n_rows += 1;
        self.l_rows.push(ExportRow {
            n_row,
            l_cells: Vec::new(),
        });
        let n_idx = self.l_rows.len() - 1;
        &mut self.l_rows[n_idx]
    }

    /// Append a row from positional values.
    ///
    /// Column `i` resolves its format under the `i`-th property name, if any.
    pub fn add_row_values<I, V>(&mut self, values: I) -> Result<&mut ExportRow, ExportError>
    where
        I: IntoIterator<Item = V>,
        V: Into<EnumCellValue>,
    {
        let l_named: Vec<(Option<String>, EnumCellValue)> = values
            .into_iter()
            .enumerate()
            .map(|(col_idx, value)| (self.l_property_names.get(col_idx).cloned(), value.into()))
            .collect();
        self.push_row(l_named)
    }

    /// Append a row by property mapping, in the column order of [`Self::set_columns`].
    ///
    /// Missing properties become blank cells.
    pub fn add_row_mapped(
        &mut self,
        dict_values: &BTreeMap<String, EnumCellValue>,
    ) -> Result<&mut ExportRow, ExportError> {
        let l_named: Vec<(Option<String>, EnumCellValue)> = self
            .l_property_names
            .iter()
            .map(|name| {
                let value = dict_values.get(name).cloned().unwrap_or(EnumCellValue::Blank);
                (Some(name.clone()), value)
            })
            .collect();
        self.push_row(l_named)
    }

    fn push_row(
        &mut self,
        l_named: Vec<(Option<String>, EnumCellValue)>,
    ) -> Result<&mut ExportRow, ExportError> {
        let mut l_cells = Vec::with_capacity(l_named.len());
        for (property, value) in l_named {
            let (value, format) = self.provider.prepare_cell(value, property.as_deref())?;
            l_cells.push(ExportCell {
                value,
                property,
                format,
            });
        }

        cast_row_num(self.n_rows)?;
        if let Some(n_col_last) = l_cells.len().checked_sub(1) {
            cast_col_num(n_col_last)?;
        }

        self.provider
            .apply_row_style(self.n_rows, l_cells.iter_mut().map(|cell| &mut cell.format));

        let row = self.add_row();
        row.l_cells = l_cells;
        Ok(row)
    }

    /// Bind columns: property names, widths and a header row of titles.
    pub fn set_columns(&mut self, columns: &[SpecColumnHeader]) -> Result<(), ExportError> {
        self.l_property_names = columns.iter().map(|col| col.name.clone()).collect();
        for (col_idx, col) in columns.iter().enumerate() {
            self.provider.set_column_width(col_idx, col.width);
        }

        let l_titles: Vec<(Option<String>, EnumCellValue)> = columns
            .iter()
            .map(|col| (None, EnumCellValue::Text(col.title.clone())))
            .collect();
        self.push_row(l_titles)?;
        Ok(())
    }

    /// Merge a region and place `value` in its top-left cell.
    pub fn set_merged_region(
        &mut self,
        first_row: usize,
        last_row: usize,
        first_col: usize,
        last_col: usize,
        value: impl Into<EnumCellValue>,
    ) -> Result<(), ExportError> {
        let range = SpecCellRange {
            first_row,
            first_col,
            last_row,
            last_col,
        };
        range.validate()?;
        cast_row_num(last_row)?;
        cast_col_num(last_col)?;
        let value = value.into();
        self.provider.prepare_cell(value.clone(), None)?;
        self.l_merges.push((range, value));
        Ok(())
    }

    /// Freeze rows above `row_idx` and columns left of `col_idx`.
    pub fn create_freeze_pane(&mut self, row_idx: usize, col_idx: usize) {
        self.freeze_panes = Some((row_idx, col_idx));
    }

    /// Set zoom in percent.
    pub fn set_zoom(&mut self, zoom: u16) {
        self.zoom = Some(zoom);
    }

    /// Put an auto-filter on the header row (at most 26 columns).
    pub fn set_autofilter(&mut self) -> Result<(), ExportError> {
        if self.n_rows == 0 {
            return Err(ExportError::UnknownRow(0));
        }
        let n_cols = self
            .l_rows
            .iter()
            .find(|row| row.n_row == 0)
            .map(ExportRow::len)
            .unwrap_or(self.l_property_names.len())
            .max(1);
        let n_cols_filtered = if n_cols > N_NCOLS_AUTOFILTER_MAX {
            warn!(
                sheet = %self.name,
                n_cols,
                n_cols_max = N_NCOLS_AUTOFILTER_MAX,
                "auto-filter clipped to the first columns"
            );
            N_NCOLS_AUTOFILTER_MAX
        } else {
            n_cols
        };
        self.autofilter = Some(SpecCellRange {
            first_row: 0,
            first_col: 0,
            last_row: 0,
            last_col: n_cols_filtered - 1,
        });
        Ok(())
    }

    /// Write pending rows, merges and sheet settings into `document`.
    ///
    /// Rows and merges are drained once everything is written, so flushing
    /// twice does not duplicate cells and a failed flush keeps them pending.
    pub fn flush<D: DocumentModel + ?Sized>(
        &mut self,
        document: &mut D,
        cache: &mut StyleCache,
    ) -> Result<(), ExportError> {
        self.provider.update_sheet_style(document, self.sheet)?;

        for row in &self.l_rows {
            for (col_idx, cell) in row.l_cells.iter().enumerate() {
                let cell_ref = SpecCellRef {
                    sheet: self.sheet,
                    row: row.n_row,
                    col: col_idx,
                };
                self.provider
                    .write_cell(document, cache, cell_ref, &cell.value, &cell.format)?;
            }
        }

        for (range, value) in &self.l_merges {
            let range = *range;
            if range.first_row != range.last_row || range.first_col != range.last_col {
                document.merge_range(self.sheet, range)?;
            }
            let cell_ref = SpecCellRef {
                sheet: self.sheet,
                row: range.first_row,
                col: range.first_col,
            };
            self.provider
                .resolve_and_apply(document, cache, cell_ref, value.clone(), None)?;
        }

        if let Some((row_idx, col_idx)) = self.freeze_panes {
            document.set_freeze_panes(self.sheet, row_idx, col_idx)?;
        }
        if let Some(range) = self.autofilter {
            document.set_autofilter(self.sheet, range)?;
        }
        if let Some(zoom) = self.zoom {
            document.set_zoom(self.sheet, zoom)?;
        }

        debug!(sheet = %self.name, n_rows = self.l_rows.len(), "flushed sheet");
        self.l_rows.clear();
        self.l_merges.clear();
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportWorkbook

/// A document plus its style cache and the sheets being built.
///
/// The cache is shared by every sheet of the document.
#[derive(Debug)]
pub struct ExportWorkbook<D: DocumentModel = MemoryDocument> {
    document: D,
    cache: StyleCache,
    l_sheets: Vec<ExportSheet>,
    set_sheet_names: BTreeSet<String>,
}

impl<D: DocumentModel + Default> Default for ExportWorkbook<D> {
    fn default() -> Self {
        Self::with_document(D::default())
    }
}

impl<D: DocumentModel> ExportWorkbook<D> {
    /// Workbook writing into `document`.
    pub fn with_document(document: D) -> Self {
        Self {
            document,
            cache: StyleCache::new(),
            l_sheets: Vec::new(),
            set_sheet_names: BTreeSet::new(),
        }
    }

    /// Add a sheet; the name is sanitized and made unique.
    pub fn add_sheet(&mut self, name: &str, provider: ContentProvider) -> &mut ExportSheet {
        let c_name =
            derive_unique_sheet_name(&sanitize_sheet_name(name, "_"), &mut self.set_sheet_names);
        let sheet = self.document.add_sheet(&c_name);
        self.l_sheets.push(ExportSheet::new(c_name, sheet, provider));
        let n_idx = self.l_sheets.len() - 1;
        &mut self.l_sheets[n_idx]
    }

    /// Sheets in creation order.
    pub fn sheets(&self) -> &[ExportSheet] {
        &self.l_sheets
    }

    /// Sheet by position.
    pub fn sheet_mut(&mut self, sheet_idx: usize) -> Option<&mut ExportSheet> {
        self.l_sheets.get_mut(sheet_idx)
    }

    /// Flush every sheet into the document.
    pub fn flush(&mut self) -> Result<(), ExportError> {
        for sheet in &mut self.l_sheets {
            sheet.flush(&mut self.document, &mut self.cache)?;
        }
        Ok(())
    }

    /// Target document.
    pub fn document(&self) -> &D {
        &self.document
    }

    /// Style cache of this document.
    pub fn style_cache(&self) -> &StyleCache {
        &self.cache
    }

    /// Flush and hand back the document.
    pub fn into_document(mut self) -> Result<D, ExportError> {
        self.flush()?;
        Ok(self.document)
    }
}

impl ExportWorkbook<MemoryDocument> {
    /// Workbook buffering into a [`MemoryDocument`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Flush and save as xlsx.
    pub fn save(&mut self, path_file_out: impl AsRef<Path>) -> Result<(), ExportError> {
        self.flush()?;
        XlsxWriter::new(&self.document).save(path_file_out)
    }

    /// Flush and render xlsx bytes.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>, ExportError> {
        self.flush()?;
        XlsxWriter::new(&self.document).save_to_buffer()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::conf::{C_FORMAT_INTEGER, C_FORMAT_TEXT, C_PATTERN_DATE};
    use crate::spec::EnumColor;

    fn build_header(name: &str, title: &str) -> SpecColumnHeader {
        SpecColumnHeader {
            name: name.to_string(),
            title: title.to_string(),
            width: 15,
        }
    }

    #[test]
    fn rows_are_resolved_banded_and_written() {
        let mut workbook = ExportWorkbook::new();
        let sheet = workbook.add_sheet("Orders", ContentProvider::default());
        sheet
            .set_columns(&[build_header("qty", "Quantity"), build_header("day", "Day")])
            .expect("columns");
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).expect("date");
        sheet
            .add_row_values([EnumCellValue::Integer(3), EnumCellValue::Date(date)])
            .expect("row 1");
        sheet
            .add_row_values([EnumCellValue::Integer(4), EnumCellValue::Date(date)])
            .expect("row 2");

        workbook.flush().expect("flush");
        let doc = workbook.document();
        let buffer = &doc.sheets()[0];

        let header = buffer.cell(0, 0).and_then(|c| c.style).expect("header");
        let record = doc.style(header).expect("record");
        assert!(record.font.as_ref().is_some_and(|f| f.bold));
        assert_eq!(doc.style_data_format(header), Some(C_FORMAT_TEXT));

        let odd = buffer.cell(1, 0).and_then(|c| c.style).expect("odd");
        let even = buffer.cell(2, 0).and_then(|c| c.style).expect("even");
        assert_eq!(doc.style(odd).and_then(|r| r.fill_color), Some(EnumColor::White));
        assert_eq!(
            doc.style(even).and_then(|r| r.fill_color),
            Some(EnumColor::Grey25Percent)
        );
        assert_eq!(doc.style_data_format(odd), Some(C_FORMAT_INTEGER));

        let date_style = buffer.cell(1, 1).and_then(|c| c.style).expect("date");
        assert_eq!(doc.style_data_format(date_style), Some(C_PATTERN_DATE));
        assert_eq!(buffer.dict_col_widths.get(&1), Some(&15));
    }

    #[test]
    fn mapped_rows_follow_column_order_and_blank_missing() {
        let mut workbook = ExportWorkbook::new();
        let sheet = workbook.add_sheet("Mapped", ContentProvider::default());
        sheet
            .set_columns(&[build_header("a", "A"), build_header("b", "B")])
            .expect("columns");

        let mut dict_values = BTreeMap::new();
        dict_values.insert("b".to_string(), EnumCellValue::Integer(7));
        let row = sheet.add_row_mapped(&dict_values).expect("row");

        assert_eq!(row.index(), 1);
        assert_eq!(row.cells()[0].value(), &EnumCellValue::Blank);
        assert_eq!(row.cells()[1].value(), &EnumCellValue::Integer(7));
        assert_eq!(row.cells()[1].property(), Some("b"));
    }

    #[test]
    fn manual_format_customization_survives_flush() {
        let mut workbook = ExportWorkbook::new();
        let sheet = workbook.add_sheet("Custom", ContentProvider::default());
        sheet.add_row_values(["title"]).expect("header");
        let row = sheet.add_row_values([1.5]).expect("row");
        if let Some(cell) = row.cell_mut(0) {
            cell.format_mut().data_format = Some("0.0%".to_string());
        }

        workbook.flush().expect("flush");
        let doc = workbook.document();
        let style = doc.sheets()[0].cell(1, 0).and_then(|c| c.style).expect("style");
        assert_eq!(doc.style_data_format(style), Some("0.0%"));
    }

    #[test]
    fn sheet_names_are_sanitized_and_unique() {
        let mut workbook = ExportWorkbook::new();
        let c_first = workbook
            .add_sheet("Q1/Q2", ContentProvider::default())
            .name()
            .to_string();
        let c_second = workbook
            .add_sheet("Q1/Q2", ContentProvider::default())
            .name()
            .to_string();

        assert_eq!(c_first, "Q1_Q2");
        assert_eq!(c_second, "Q1_Q2__2");
        assert_eq!(workbook.document().sheets()[1].name, "Q1_Q2__2");
    }

    #[test]
    fn autofilter_requires_header_and_clips_to_26_columns() {
        let mut workbook = ExportWorkbook::new();
        let sheet = workbook.add_sheet("Wide", ContentProvider::default());
        assert!(matches!(
            sheet.set_autofilter(),
            Err(ExportError::UnknownRow(0))
        ));

        sheet
            .add_row_values((0..30).map(|idx| format!("c{idx}")))
            .expect("header");
        sheet.set_autofilter().expect("filter");
        workbook.flush().expect("flush");

        let range = workbook.document().sheets()[0].autofilter.expect("range");
        assert_eq!((range.first_col, range.last_col), (0, 25));
        assert_eq!((range.first_row, range.last_row), (0, 0));
    }

    #[test]
    fn merged_region_freeze_and_zoom_reach_document() {
        let mut workbook = ExportWorkbook::new();
        let sheet = workbook.add_sheet("Layout", ContentProvider::default());
        sheet
            .set_merged_region(0, 0, 0, 3, "Quarterly report")
            .expect("merge");
        sheet.create_freeze_pane(1, 0);
        sheet.set_zoom(80);
        assert!(sheet.set_merged_region(2, 1, 0, 0, "bad").is_err());

        workbook.flush().expect("flush");
        let buffer = &workbook.document().sheets()[0];
        assert_eq!(buffer.l_merges.len(), 1);
        assert_eq!(buffer.freeze_panes, Some((1, 0)));
        assert_eq!(buffer.zoom, Some(80));
        assert_eq!(
            buffer.cell(0, 0).and_then(|c| c.value.clone()),
            Some(EnumCellValue::Text("Quarterly report".into()))
        );
    }

    #[test]
    fn flush_twice_does_not_duplicate_styles() {
        let mut workbook = ExportWorkbook::new();
        let sheet = workbook.add_sheet("Twice", ContentProvider::default());
        sheet.add_row_values([1, 2, 3]).expect("row");

        workbook.flush().expect("flush");
        let n_styles = workbook.document().styles().len();
        workbook.flush().expect("flush again");
        assert_eq!(workbook.document().styles().len(), n_styles);
        assert_eq!(workbook.style_cache().len(), n_styles);
    }

    #[test]
    fn oversized_rows_and_merges_are_rejected_before_buffering() {
        let mut workbook = ExportWorkbook::new();
        let sheet = workbook.add_sheet("Wide", ContentProvider::default());
        sheet.add_row_values(["kept"]).expect("header");

        assert!(matches!(
            sheet.add_row_values((0..16_385).map(|_| 1)),
            Err(ExportError::IndexOverflow { axis: "column", .. })
        ));
        assert!(matches!(
            sheet.set_merged_region(0, 0, 0, 1, EnumCellValue::Opaque("Widget".into())),
            Err(ExportError::UnsupportedValueType { .. })
        ));
        assert!(matches!(
            sheet.set_merged_region(0, 0, 0, 16_384, "too wide"),
            Err(ExportError::IndexOverflow { axis: "column", .. })
        ));
        assert_eq!(sheet.row_count(), 1);

        sheet.add_row_values([7]).expect("row");
        workbook.flush().expect("flush");
        let buffer = &workbook.document().sheets()[0];
        assert_eq!(
            buffer.cell(0, 0).and_then(|c| c.value.clone()),
            Some(EnumCellValue::Text("kept".into()))
        );
        assert_eq!(
            buffer.cell(1, 0).and_then(|c| c.value.clone()),
            Some(EnumCellValue::Integer(7))
        );
        assert!(buffer.l_merges.is_empty());
    }

    #[test]
    fn pending_row_can_be_customized_by_index() {
        let mut workbook = ExportWorkbook::new();
        let sheet = workbook.add_sheet("Pending", ContentProvider::default());
        sheet.add_row_values(["title"]).expect("header");
        sheet.add_row_values([0.25]).expect("row");
        assert!(sheet.row_mut(5).is_none());

        let row = sheet.row_mut(1).expect("pending row");
        assert_eq!(row.index(), 1);
        if let Some(cell) = row.cell_mut(0) {
            cell.format_mut().data_format = Some("0%".to_string());
        }

        workbook.flush().expect("flush");
        assert!(workbook.sheets()[0].pending_rows().is_empty());
        let doc = workbook.document();
        let style = doc.sheets()[0].cell(1, 0).and_then(|c| c.style).expect("style");
        assert_eq!(doc.style_data_format(style), Some("0%"));
    }

    #[test]
    fn quoted_sheet_name_saves() {
        let mut workbook = ExportWorkbook::new();
        let sheet = workbook.add_sheet("'Q1'", ContentProvider::default());
        assert_eq!(sheet.name(), "Q1");
        sheet.add_row_values(["a"]).expect("row");
        let v_bytes = workbook.save_to_buffer().expect("bytes");
        assert_eq!(&v_bytes[0..2], b"PK");
    }

    #[test]
    fn save_to_buffer_renders_xlsx() {
        let mut workbook = ExportWorkbook::new();
        let sheet = workbook.add_sheet("Bytes", ContentProvider::default());
        sheet.add_row_values(["a", "b"]).expect("row");
        let v_bytes = workbook.save_to_buffer().expect("bytes");
        assert_eq!(&v_bytes[0..2], b"PK");
    }
}
