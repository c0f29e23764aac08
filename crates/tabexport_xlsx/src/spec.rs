//! Shared export specification models.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::conf::{
    C_PATTERN_DATE, C_PATTERN_TIMESTAMP_MILLIS, C_PATTERN_TIMESTAMP_MINUTES,
    C_PATTERN_TIMESTAMP_SECONDS, N_WIDTH_COL_DEFAULT,
};
use crate::error::ExportError;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Horizontal cell alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumAlignment {
    /// Left aligned (text default).
    #[default]
    Left,
    /// Right aligned (numbers).
    Right,
    /// Centered.
    Center,
}

/// Color token used for fills and fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumColor {
    /// Plain white.
    White,
    /// Light grey used for row banding.
    Grey25Percent,
    /// Red, e.g. for negative amounts.
    Red,
    /// Arbitrary `0xRRGGBB` color.
    Rgb(u32),
}

/// Font token. Fonts are plain values so equal fonts share one cached style.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecFont {
    /// Bold weight.
    pub bold: bool,
    /// Font color; `None` keeps the document default.
    pub color: Option<EnumColor>,
    /// Font size in points; `None` keeps the document default.
    pub size_points: Option<u16>,
}

impl SpecFont {
    /// Bold font in the default color.
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Default::default()
        }
    }

    /// Regular font in the given color.
    pub fn colored(color: EnumColor) -> Self {
        Self {
            color: Some(color),
            ..Default::default()
        }
    }
}

/// Presentation of one cell: number pattern and visual style.
///
/// Equality is structural over all fields. [`crate::StyleCache`] uses it as the
/// key deciding whether two cells can share one document style.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Number/date pattern, e.g. `#,##0.00`.
    pub data_format: Option<String>,
    /// Horizontal alignment.
    pub alignment: EnumAlignment,
    /// Solid background fill.
    pub fill_color: Option<EnumColor>,
    /// Font override.
    pub font: Option<SpecFont>,
    /// Wrap long text.
    pub wrap_text: bool,
}

impl SpecCellFormat {
    /// Left-aligned format with the given data pattern.
    pub fn from_data_format(data_format: impl Into<String>) -> Self {
        Self {
            data_format: Some(data_format.into()),
            ..Default::default()
        }
    }

    /// Format with data pattern and alignment.
    pub fn from_data_format_aligned(
        data_format: impl Into<String>,
        alignment: EnumAlignment,
    ) -> Self {
        Self {
            data_format: Some(data_format.into()),
            alignment,
            ..Default::default()
        }
    }

    /// Return a copy with `fill_color` replaced.
    pub fn with_fill_color(&self, color: EnumColor) -> Self {
        Self {
            fill_color: Some(color),
            ..self.clone()
        }
    }

    /// Return a copy with `font` replaced.
    pub fn with_font(&self, font: SpecFont) -> Self {
        Self {
            font: Some(font),
            ..self.clone()
        }
    }

    /// Set background fill in place.
    pub fn set_fill_color(&mut self, color: EnumColor) {
        self.fill_color = Some(color);
    }

    /// Set font in place.
    pub fn set_font(&mut self, font: SpecFont) {
        self.font = Some(font);
    }
}

/// Fonts owned by one export session.
///
/// Created once per [`crate::ContentProvider`] and threaded into row styling and
/// hooks, so no font state is process-wide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSessionFonts {
    /// Body rows.
    pub normal: SpecFont,
    /// Header row.
    pub normal_bold: SpecFont,
    /// Highlighted values.
    pub red: SpecFont,
    /// Highlighted header-like values.
    pub red_bold: SpecFont,
}

impl Default for SpecSessionFonts {
    fn default() -> Self {
        Self {
            normal: SpecFont::default(),
            normal_bold: SpecFont::bold(),
            red: SpecFont::colored(EnumColor::Red),
            red_bold: SpecFont {
                bold: true,
                color: Some(EnumColor::Red),
                size_points: None,
            },
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValues

/// Value written into one cell. The variant is the value's runtime type.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Empty cell (still styled).
    Blank,
    /// Boolean.
    Boolean(bool),
    /// Integral number.
    Integer(i64),
    /// Any other number.
    Number(f64),
    /// Calendar date without time of day.
    Date(NaiveDate),
    /// Point in time with minute/second precision.
    DateTime(NaiveDateTime),
    /// Point in time with sub-second precision.
    Timestamp(NaiveDateTime),
    /// Text.
    Text(String),
    /// Formula expression without leading `=`.
    Formula(String),
    /// Value the projection could not convert; carries its type name.
    Opaque(String),
}

impl EnumCellValue {
    /// Human-readable runtime type name.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Blank => "blank",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Number(_) => "number",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Timestamp(_) => "timestamp",
            Self::Text(_) => "text",
            Self::Formula(_) => "formula",
            Self::Opaque(type_name) => type_name,
        }
    }

    /// Fail with [`ExportError::UnsupportedValueType`] for opaque values.
    pub fn validate_writable(&self) -> Result<(), ExportError> {
        match self {
            Self::Opaque(type_name) => Err(ExportError::unsupported(type_name.clone())),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for EnumCellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => Ok(()),
            Self::Boolean(val) => write!(f, "{val}"),
            Self::Integer(val) => write!(f, "{val}"),
            Self::Number(val) => write!(f, "{val}"),
            Self::Date(val) => write!(f, "{val}"),
            Self::DateTime(val) | Self::Timestamp(val) => write!(f, "{val}"),
            Self::Text(val) => write!(f, "{val}"),
            Self::Formula(val) => write!(f, "={val}"),
            Self::Opaque(type_name) => write!(f, "<{type_name}>"),
        }
    }
}

impl From<bool> for EnumCellValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for EnumCellValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<i64> for EnumCellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for EnumCellValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for EnumCellValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl<T: Into<EnumCellValue>> From<Option<T>> for EnumCellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Blank, Into::into)
    }
}

/// Value class used as a type key in format rules.
///
/// Classes nest: `Number` covers integers, `DateTime` covers every
/// point-in-time value (dates and timestamps included). Registries evaluate
/// rules in registration order, so specific classes are registered first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumValueClass {
    /// [`EnumCellValue::Boolean`].
    Boolean,
    /// [`EnumCellValue::Integer`].
    Integer,
    /// Integers and other numbers.
    Number,
    /// [`EnumCellValue::Date`] only.
    Date,
    /// [`EnumCellValue::Timestamp`] only.
    Timestamp,
    /// Dates, date-times and timestamps.
    DateTime,
    /// [`EnumCellValue::Text`].
    Text,
    /// [`EnumCellValue::Formula`].
    Formula,
}

impl EnumValueClass {
    /// Whether `value` is an instance of this class.
    pub fn matches(&self, value: &EnumCellValue) -> bool {
        use EnumCellValue as V;
        match self {
            Self::Boolean => matches!(value, V::Boolean(_)),
            Self::Integer => matches!(value, V::Integer(_)),
            Self::Number => matches!(value, V::Integer(_) | V::Number(_)),
            Self::Date => matches!(value, V::Date(_)),
            Self::Timestamp => matches!(value, V::Timestamp(_)),
            Self::DateTime => matches!(value, V::Date(_) | V::DateTime(_) | V::Timestamp(_)),
            Self::Text => matches!(value, V::Text(_)),
            Self::Formula => matches!(value, V::Formula(_)),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnSpecification

/// Declared semantic type of an exported field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumPropertyType {
    /// Monetary amount.
    Currency,
    /// Calendar date.
    Date,
    /// Date with hours and minutes.
    DateTime,
    /// Date with seconds.
    DateTimeSeconds,
    /// Date with milliseconds.
    DateTimeMillis,
    /// No declaration; falls back to the value-class defaults.
    #[default]
    Unspecified,
}

/// Locale-dependent date pattern kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumDateFormatType {
    /// Date only.
    Date,
    /// Date, hours, minutes.
    TimestampMinutes,
    /// Date, hours, minutes, seconds.
    TimestampSeconds,
    /// Date, hours, minutes, seconds, milliseconds.
    TimestampMillis,
}

/// Header-row column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecColumnHeader {
    /// Property name used for format lookup and row mapping.
    pub name: String,
    /// Title written into the header row.
    pub title: String,
    /// Width in characters.
    pub width: usize,
}

/// Exported column bound to an accessor on `T`.
pub struct SpecExportColumn<T> {
    /// Property name.
    pub name: String,
    /// Header title.
    pub title: String,
    /// Width in characters; `None` uses the exporter default.
    pub width: Option<usize>,
    /// Declared semantic type.
    pub property_type: EnumPropertyType,
    /// Declared field class, consulted for [`EnumPropertyType::Unspecified`].
    pub value_class: Option<EnumValueClass>,
    accessor: Box<dyn Fn(&T) -> EnumCellValue>,
}

impl<T> SpecExportColumn<T> {
    /// Create a column with unspecified type.
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        accessor: impl Fn(&T) -> EnumCellValue + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            width: None,
            property_type: EnumPropertyType::Unspecified,
            value_class: None,
            accessor: Box::new(accessor),
        }
    }

    /// Set the declared semantic type.
    pub fn with_property_type(mut self, property_type: EnumPropertyType) -> Self {
        self.property_type = property_type;
        self
    }

    /// Set the declared field class.
    pub fn with_value_class(mut self, value_class: EnumValueClass) -> Self {
        self.value_class = Some(value_class);
        self
    }

    /// Set an explicit width in characters.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Read this column's value from `item`.
    pub fn extract(&self, item: &T) -> EnumCellValue {
        (self.accessor)(item)
    }
}

impl<T> fmt::Debug for SpecExportColumn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecExportColumn")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("width", &self.width)
            .field("property_type", &self.property_type)
            .field("value_class", &self.value_class)
            .finish_non_exhaustive()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportOptions

/// Date patterns supplied by the formatting context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecDateFormats {
    /// [`EnumDateFormatType::Date`].
    pub date: String,
    /// [`EnumDateFormatType::TimestampMinutes`].
    pub timestamp_minutes: String,
    /// [`EnumDateFormatType::TimestampSeconds`].
    pub timestamp_seconds: String,
    /// [`EnumDateFormatType::TimestampMillis`].
    pub timestamp_millis: String,
}

impl Default for SpecDateFormats {
    fn default() -> Self {
        Self {
            date: C_PATTERN_DATE.to_string(),
            timestamp_minutes: C_PATTERN_TIMESTAMP_MINUTES.to_string(),
            timestamp_seconds: C_PATTERN_TIMESTAMP_SECONDS.to_string(),
            timestamp_millis: C_PATTERN_TIMESTAMP_MILLIS.to_string(),
        }
    }
}

impl SpecDateFormats {
    /// Pattern for one date kind.
    pub fn pattern(&self, rule: EnumDateFormatType) -> &str {
        match rule {
            EnumDateFormatType::Date => &self.date,
            EnumDateFormatType::TimestampMinutes => &self.timestamp_minutes,
            EnumDateFormatType::TimestampSeconds => &self.timestamp_seconds,
            EnumDateFormatType::TimestampMillis => &self.timestamp_millis,
        }
    }
}

/// Export-wide options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecExportOptions {
    /// Bold header row, banded body rows, bordered cells.
    pub auto_format_cells: bool,
    /// Column width (characters) when a column declares none.
    pub default_col_width: usize,
    /// Freeze the header row of exported sheets.
    pub if_freeze_header: bool,
    /// Date patterns of the formatting context.
    pub date_formats: SpecDateFormats,
}

impl Default for SpecExportOptions {
    fn default() -> Self {
        Self {
            auto_format_cells: true,
            default_col_width: N_WIDTH_COL_DEFAULT,
            if_freeze_header: true,
            date_formats: SpecDateFormats::default(),
        }
    }
}

impl SpecExportOptions {
    /// Parse options from JSON; missing keys keep their defaults.
    pub fn from_json_str(txt: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(txt)?)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_class_nesting_follows_numeric_and_temporal_hierarchy() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).expect("date");
        let ts = date.and_hms_milli_opt(8, 30, 0, 125).expect("ts");

        assert!(EnumValueClass::Number.matches(&EnumCellValue::Integer(1)));
        assert!(!EnumValueClass::Integer.matches(&EnumCellValue::Number(1.0)));
        assert!(EnumValueClass::DateTime.matches(&EnumCellValue::Date(date)));
        assert!(EnumValueClass::DateTime.matches(&EnumCellValue::Timestamp(ts)));
        assert!(!EnumValueClass::Date.matches(&EnumCellValue::DateTime(ts)));
        assert!(!EnumValueClass::Text.matches(&EnumCellValue::Blank));
    }

    #[test]
    fn cell_format_equality_is_structural() {
        let fmt_a = SpecCellFormat::from_data_format_aligned("#,##0", EnumAlignment::Right);
        let fmt_b = SpecCellFormat {
            data_format: Some("#,##0".to_string()),
            alignment: EnumAlignment::Right,
            ..Default::default()
        };
        assert_eq!(fmt_a, fmt_b);
        assert_ne!(fmt_a, fmt_b.with_fill_color(EnumColor::White));
    }

    #[test]
    fn options_from_json_keeps_defaults_for_missing_keys() {
        let options = SpecExportOptions::from_json_str(
            r#"{"auto_format_cells": false, "date_formats": {"date": "dd.MM.yyyy"}}"#,
        )
        .expect("options");

        assert!(!options.auto_format_cells);
        assert_eq!(options.default_col_width, N_WIDTH_COL_DEFAULT);
        assert_eq!(options.date_formats.date, "dd.MM.yyyy");
        assert_eq!(
            options.date_formats.pattern(EnumDateFormatType::TimestampMinutes),
            C_PATTERN_TIMESTAMP_MINUTES
        );
    }

    #[test]
    fn options_from_json_rejects_wrong_types() {
        let err = SpecExportOptions::from_json_str(r#"{"default_col_width": "wide"}"#)
            .expect_err("invalid");
        assert!(matches!(err, ExportError::Config(_)));
    }

    #[test]
    fn opaque_values_are_not_writable() {
        let err = EnumCellValue::Opaque("Money".to_string())
            .validate_writable()
            .expect_err("opaque");
        assert_eq!(err.to_string(), "Type Money not supported for cell values.");
        assert!(EnumCellValue::Text("x".into()).validate_writable().is_ok());
    }
}
