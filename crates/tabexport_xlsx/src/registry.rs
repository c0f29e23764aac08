//! Two-key format registry: explicit names first, value-class rules second.

use std::collections::HashMap;

use crate::error::ExportError;
use crate::spec::{EnumCellValue, EnumValueClass, SpecCellFormat};

/// Format lookup by explicit name or by value class.
///
/// Name entries always win over class rules. Class rules are evaluated in
/// registration order; re-registering a class replaces its format in place.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    dict_fmt_by_name: HashMap<String, SpecCellFormat>,
    l_fmt_by_class: Vec<(EnumValueClass, SpecCellFormat)>,
}

impl FormatRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with class rules in the given order.
    pub fn from_type_formats(l_rules: Vec<(EnumValueClass, SpecCellFormat)>) -> Self {
        let mut registry = Self::new();
        for (value_class, format) in l_rules {
            registry.put_type_format(value_class, format);
        }
        registry
    }

    /// Register a format for an explicit column/property name.
    ///
    /// Blank names and empty data patterns are rejected.
    pub fn put_name_format(
        &mut self,
        name: &str,
        format: SpecCellFormat,
    ) -> Result<(), ExportError> {
        if name.trim().is_empty() {
            return Err(ExportError::MalformedOverride(
                "format name must not be empty.".to_string(),
            ));
        }
        if format.data_format.as_deref().is_some_and(str::is_empty) {
            return Err(ExportError::MalformedOverride(format!(
                "data format for {name:?} must not be empty."
            )));
        }
        self.dict_fmt_by_name.insert(name.to_string(), format);
        Ok(())
    }

    /// Register a format for every value matching `value_class`.
    pub fn put_type_format(&mut self, value_class: EnumValueClass, format: SpecCellFormat) {
        match self
            .l_fmt_by_class
            .iter_mut()
            .find(|(cls, _)| *cls == value_class)
        {
            Some((_, fmt_existing)) => *fmt_existing = format,
            None => self.l_fmt_by_class.push((value_class, format)),
        }
    }

    /// Look up a format by `name`, then by the class of `value`.
    ///
    /// Returns a clone; callers may mutate it freely.
    pub fn resolve(
        &self,
        name: Option<&str>,
        value: &EnumCellValue,
    ) -> Option<SpecCellFormat> {
        self.lookup(name, value).cloned()
    }

    pub(crate) fn lookup(
        &self,
        name: Option<&str>,
        value: &EnumCellValue,
    ) -> Option<&SpecCellFormat> {
        if let Some(c_name) = name
            && let Some(fmt) = self.dict_fmt_by_name.get(c_name)
        {
            return Some(fmt);
        }
        self.l_fmt_by_class
            .iter()
            .find(|(cls, _)| cls.matches(value))
            .map(|(_, fmt)| fmt)
    }

    /// Number of name entries plus class rules.
    pub fn len(&self) -> usize {
        self.dict_fmt_by_name.len() + self.l_fmt_by_class.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
