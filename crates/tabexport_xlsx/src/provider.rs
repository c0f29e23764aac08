//! Content provider: resolves cell formats, applies row styling and writes
//! styled cells through the style cache.

use std::collections::BTreeMap;
use std::fmt;

use crate::cache::StyleCache;
use crate::conf::{derive_default_type_formats, derive_fallback_cell_format};
use crate::document::{DocumentModel, SheetId, SpecCellRef, StyleHandle};
use crate::error::ExportError;
use crate::registry::FormatRegistry;
use crate::spec::{
    EnumCellValue, EnumColor, EnumValueClass, SpecCellFormat, SpecExportOptions,
    SpecSessionFonts,
};

/// Replaces the format found by a registry pass when it returns `Some`.
///
/// Receives the registry result (`None` when nothing matched) and the value.
pub type FormatHook =
    Box<dyn Fn(Option<&SpecCellFormat>, &EnumCellValue) -> Option<SpecCellFormat>>;

/// Converts a value before it is written when it returns `Some`.
pub type ValueHook = Box<dyn Fn(&EnumCellValue) -> Option<EnumCellValue>>;

/// Per-sheet format resolution and styling policy.
pub struct ContentProvider {
    options: SpecExportOptions,
    fonts: SpecSessionFonts,
    registry_overrides: FormatRegistry,
    registry_defaults: FormatRegistry,
    dict_col_widths: BTreeMap<usize, usize>,
    if_auto_format_cells: bool,
    format_hook: Option<FormatHook>,
    value_hook: Option<ValueHook>,
}

impl ContentProvider {
    /// Provider with default value-class formats from `options.date_formats`.
    pub fn new(options: SpecExportOptions) -> Self {
        let registry_defaults =
            FormatRegistry::from_type_formats(derive_default_type_formats(&options.date_formats));
        Self {
            if_auto_format_cells: options.auto_format_cells,
            options,
            fonts: SpecSessionFonts::default(),
            registry_overrides: FormatRegistry::new(),
            registry_defaults,
            dict_col_widths: BTreeMap::new(),
            format_hook: None,
            value_hook: None,
        }
    }

    /// Fresh provider with the same options; overrides, widths and hooks are not copied.
    pub fn new_instance(&self) -> Self {
        Self::new(self.options.clone())
    }

    /// Install a format customization hook.
    pub fn with_format_hook(
        mut self,
        hook: impl Fn(Option<&SpecCellFormat>, &EnumCellValue) -> Option<SpecCellFormat> + 'static,
    ) -> Self {
        self.format_hook = Some(Box::new(hook));
        self
    }

    /// Install a value conversion hook.
    pub fn with_value_hook(
        mut self,
        hook: impl Fn(&EnumCellValue) -> Option<EnumCellValue> + 'static,
    ) -> Self {
        self.value_hook = Some(Box::new(hook));
        self
    }

    /// Export options this provider was built with.
    pub fn options(&self) -> &SpecExportOptions {
        &self.options
    }

    /// Session fonts used by row styling.
    pub fn fonts(&self) -> &SpecSessionFonts {
        &self.fonts
    }

    ////////////////////////////////////////////////////////////////////////////
    // #region Registration

    /// Register a format for a column/property name.
    pub fn register_override(
        &mut self,
        name: &str,
        format: SpecCellFormat,
    ) -> Result<(), ExportError> {
        self.registry_overrides.put_name_format(name, format)
    }

    /// Register a bare data pattern for a column/property name.
    pub fn register_override_pattern(
        &mut self,
        name: &str,
        pattern: &str,
    ) -> Result<(), ExportError> {
        self.register_override(name, SpecCellFormat::from_data_format(pattern))
    }

    /// Register one data pattern for several names.
    pub fn register_override_patterns(
        &mut self,
        pattern: &str,
        names: &[&str],
    ) -> Result<(), ExportError> {
        for name in names {
            self.register_override_pattern(name, pattern)?;
        }
        Ok(())
    }

    /// Register an override for every value of `value_class`.
    pub fn register_type_override(&mut self, value_class: EnumValueClass, format: SpecCellFormat) {
        self.registry_overrides.put_type_format(value_class, format);
    }

    /// Replace or append a default value-class format.
    pub fn register_type_default(&mut self, value_class: EnumValueClass, format: SpecCellFormat) {
        self.registry_defaults.put_type_format(value_class, format);
    }

    /// Set width of column `col_idx` in characters.
    pub fn set_column_width(&mut self, col_idx: usize, char_length: usize) {
        self.dict_col_widths.insert(col_idx, char_length);
    }

    /// Set widths of columns `0..n` in characters.
    pub fn set_col_widths(&mut self, char_lengths: &[usize]) {
        for (col_idx, char_length) in char_lengths.iter().enumerate() {
            self.set_column_width(col_idx, *char_length);
        }
    }

    /// Registered column widths.
    pub fn column_widths(&self) -> &BTreeMap<usize, usize> {
        &self.dict_col_widths
    }

    /// Enable or disable header emphasis and row banding.
    pub fn set_auto_format_cells(&mut self, if_auto_format_cells: bool) {
        self.if_auto_format_cells = if_auto_format_cells;
    }

    /// Whether row auto-styling is enabled.
    pub fn is_auto_format_cells(&self) -> bool {
        self.if_auto_format_cells
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Resolution

    /// Resolve the format for `value` without fallback.
    ///
    /// The override registry is consulted before the default registry. Each
    /// pass may be superseded by the format hook. Returns a clone.
    pub fn resolve(&self, name: Option<&str>, value: &EnumCellValue) -> Option<SpecCellFormat> {
        [&self.registry_overrides, &self.registry_defaults]
            .into_iter()
            .find_map(|registry| self.resolve_in(registry, name, value))
    }

    fn resolve_in(
        &self,
        registry: &FormatRegistry,
        name: Option<&str>,
        value: &EnumCellValue,
    ) -> Option<SpecCellFormat> {
        let fmt_found = registry.lookup(name, value);
        if let Some(hook) = &self.format_hook
            && let Some(fmt_custom) = hook(fmt_found, value)
        {
            return Some(fmt_custom);
        }
        fmt_found.cloned()
    }

    /// Resolve the format for `value`, falling back to wrapped left-aligned text.
    pub fn resolve_or_fallback(&self, name: Option<&str>, value: &EnumCellValue) -> SpecCellFormat {
        self.resolve(name, value)
            .unwrap_or_else(derive_fallback_cell_format)
    }

    /// Convert `value` through the value hook and resolve its format.
    ///
    /// The format is resolved against the original value.
    pub fn prepare_cell(
        &self,
        value: EnumCellValue,
        name: Option<&str>,
    ) -> Result<(EnumCellValue, SpecCellFormat), ExportError> {
        let format = self.resolve_or_fallback(name, &value);
        let value_written = match self.value_hook.as_ref().and_then(|hook| hook(&value)) {
            Some(value_custom) => value_custom,
            None => value,
        };
        value_written.validate_writable()?;
        Ok((value_written, format))
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Styling

    /// Apply header emphasis and banding to the formats of row `row_idx`.
    ///
    /// No-op when auto formatting is disabled.
    pub fn apply_row_style<'a>(
        &self,
        row_idx: usize,
        formats: impl IntoIterator<Item = &'a mut SpecCellFormat>,
    ) {
        if !self.if_auto_format_cells {
            return;
        }
        for format in formats {
            format.set_fill_color(EnumColor::White);
            if row_idx == 0 {
                format.set_font(self.fonts.normal_bold.clone());
                continue;
            }
            format.set_font(self.fonts.normal.clone());
            if row_idx % 2 == 0 {
                format.set_fill_color(EnumColor::Grey25Percent);
            }
        }
    }

    /// Write a value with an already final format.
    pub fn write_cell<D: DocumentModel + ?Sized>(
        &self,
        document: &mut D,
        cache: &mut StyleCache,
        cell: SpecCellRef,
        value: &EnumCellValue,
        format: &SpecCellFormat,
    ) -> Result<StyleHandle, ExportError> {
        let style = cache.get_or_create(document, format);
        document.set_cell_value(cell, value)?;
        document.set_cell_style(cell, style)?;
        Ok(style)
    }

    /// Resolve, auto-style, cache and write one cell.
    pub fn resolve_and_apply<D: DocumentModel + ?Sized>(
        &self,
        document: &mut D,
        cache: &mut StyleCache,
        cell: SpecCellRef,
        value: EnumCellValue,
        name: Option<&str>,
    ) -> Result<StyleHandle, ExportError> {
        let (value_written, mut format) = self.prepare_cell(value, name)?;
        self.apply_row_style(cell.row, [&mut format]);
        self.write_cell(document, cache, cell, &value_written, &format)
    }

    /// Push registered column widths to `sheet`.
    pub fn update_sheet_style<D: DocumentModel + ?Sized>(
        &self,
        document: &mut D,
        sheet: SheetId,
    ) -> Result<(), ExportError> {
        for (col_idx, width) in &self.dict_col_widths {
            document.set_column_width(sheet, *col_idx, *width)?;
        }
        Ok(())
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
}

impl Default for ContentProvider {
    fn default() -> Self {
        Self::new(SpecExportOptions::default())
    }
}

impl fmt::Debug for ContentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentProvider")
            .field("registry_overrides", &self.registry_overrides)
            .field("registry_defaults", &self.registry_defaults)
            .field("dict_col_widths", &self.dict_col_widths)
            .field("if_auto_format_cells", &self.if_auto_format_cells)
            .field("format_hook", &self.format_hook.is_some())
            .field("value_hook", &self.value_hook.is_some())
            .finish_non_exhaustive()
    }
}
