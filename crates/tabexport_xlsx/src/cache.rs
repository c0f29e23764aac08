//! Per-document style cache keyed by structural cell-format equality.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::conf::N_BORDER_WIDTH;
use crate::document::{DocumentModel, StyleHandle};
use crate::spec::SpecCellFormat;

/// Deduplicating store from [`SpecCellFormat`] values to document styles.
///
/// One cache belongs to exactly one document: handles are only meaningful in
/// the document that created them.
#[derive(Debug, Default)]
pub struct StyleCache {
    dict_style_by_fmt: HashMap<SpecCellFormat, StyleHandle>,
}

impl StyleCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the style for `format`, creating it in `document` on first use.
    ///
    /// Text wrap is taken from `format.wrap_text`, like every other field, so
    /// formats differing only in wrap get distinct styles.
    pub fn get_or_create<D: DocumentModel + ?Sized>(
        &mut self,
        document: &mut D,
        format: &SpecCellFormat,
    ) -> StyleHandle {
        if let Some(style) = self.dict_style_by_fmt.get(format) {
            trace!(style = style.index(), "style cache hit");
            return *style;
        }

        let style = create_document_style(document, format);
        debug!(
            style = style.index(),
            data_format = format.data_format.as_deref().unwrap_or(""),
            "allocated cell style"
        );
        self.dict_style_by_fmt.insert(format.clone(), style);
        style
    }

    /// Cached style for `format` without creating one.
    pub fn get(&self, format: &SpecCellFormat) -> Option<StyleHandle> {
        self.dict_style_by_fmt.get(format).copied()
    }

    /// Number of distinct styles created.
    pub fn len(&self) -> usize {
        self.dict_style_by_fmt.len()
    }

    /// Whether no style was created yet.
    pub fn is_empty(&self) -> bool {
        self.dict_style_by_fmt.is_empty()
    }
}

fn create_document_style<D: DocumentModel + ?Sized>(
    document: &mut D,
    format: &SpecCellFormat,
) -> StyleHandle {
    let style = document.create_style();
    document.set_style_alignment(style, format.alignment);
    if let Some(color) = format.fill_color {
        document.set_style_fill(style, color);
    }
    if let Some(font) = &format.font {
        document.set_style_font(style, font);
    }
    document.set_style_border(style, N_BORDER_WIDTH);
    document.set_style_wrap_text(style, format.wrap_text);
    if let Some(pattern) = &format.data_format {
        let code = document.register_data_format(pattern);
        document.set_style_data_format(style, code);
    }
    style
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::document::{MemoryDocument, SpecCellBorder};
    use crate::spec::{EnumAlignment, EnumColor, SpecFont};

    #[test]
    fn equal_formats_share_one_style() {
        let mut doc = MemoryDocument::new();
        let mut cache = StyleCache::new();

        let fmt_a = SpecCellFormat::from_data_format_aligned("#,##0", EnumAlignment::Right);
        let fmt_b = SpecCellFormat {
            data_format: Some("#,##0".to_string()),
            alignment: EnumAlignment::Right,
            ..Default::default()
        };

        let style_a = cache.get_or_create(&mut doc, &fmt_a);
        let style_b = cache.get_or_create(&mut doc, &fmt_b);

        assert_eq!(style_a, style_b);
        assert_eq!(cache.len(), 1);
        assert_eq!(doc.styles().len(), 1);
    }

    #[test]
    fn different_formats_get_distinct_styles() {
        let mut doc = MemoryDocument::new();
        let mut cache = StyleCache::new();

        let fmt_a = SpecCellFormat::from_data_format("#,##0");
        let fmt_b = fmt_a.with_fill_color(EnumColor::Grey25Percent);

        let style_a = cache.get_or_create(&mut doc, &fmt_a);
        let style_b = cache.get_or_create(&mut doc, &fmt_b);

        assert_ne!(style_a, style_b);
        assert_eq!(cache.len(), 2);
        // Pattern registered once and shared.
        assert_eq!(doc.data_format_count(), 1);
    }

    #[test]
    fn created_style_carries_format_fields_and_borders() {
        let mut doc = MemoryDocument::new();
        let mut cache = StyleCache::new();
        let format = SpecCellFormat {
            data_format: Some("0.00".to_string()),
            alignment: EnumAlignment::Center,
            fill_color: Some(EnumColor::White),
            font: Some(SpecFont::bold()),
            wrap_text: true,
        };

        let style = cache.get_or_create(&mut doc, &format);
        let record = doc.style(style).expect("style");

        assert_eq!(record.alignment, EnumAlignment::Center);
        assert_eq!(record.fill_color, Some(EnumColor::White));
        assert_eq!(record.font, Some(SpecFont::bold()));
        assert!(record.wrap_text);
        assert_eq!(
            record.border,
            SpecCellBorder {
                top: 1,
                bottom: 1,
                left: 1,
                right: 1
            }
        );
        assert_eq!(doc.style_data_format(style), Some("0.00"));
    }

    #[test]
    fn format_without_pattern_or_fill_leaves_them_unset() {
        let mut doc = MemoryDocument::new();
        let mut cache = StyleCache::new();

        let style = cache.get_or_create(&mut doc, &SpecCellFormat::default());
        let record = doc.style(style).expect("style");

        assert_eq!(record.fill_color, None);
        assert_eq!(record.data_format, None);
        assert_eq!(doc.data_format_count(), 0);
        assert_eq!(cache.get(&SpecCellFormat::default()), Some(style));
    }

    fn arb_cell_format() -> impl Strategy<Value = SpecCellFormat> {
        (
            prop::option::of(prop::sample::select(vec!["@", "0", "#,##0", "MM/dd/yyyy"])),
            prop::sample::select(vec![
                EnumAlignment::Left,
                EnumAlignment::Right,
                EnumAlignment::Center,
            ]),
            prop::option::of(prop::sample::select(vec![
                EnumColor::White,
                EnumColor::Grey25Percent,
                EnumColor::Rgb(0x00FF00),
            ])),
            prop::option::of(any::<bool>().prop_map(|bold| SpecFont {
                bold,
                ..Default::default()
            })),
            any::<bool>(),
        )
            .prop_map(|(pattern, alignment, fill_color, font, wrap_text)| SpecCellFormat {
                data_format: pattern.map(str::to_string),
                alignment,
                fill_color,
                font,
                wrap_text,
            })
    }

    proptest! {
        #[test]
        fn one_style_per_distinct_format(
            l_formats in prop::collection::vec(arb_cell_format(), 1..40)
        ) {
            let mut doc = MemoryDocument::new();
            let mut cache = StyleCache::new();

            let l_styles: Vec<StyleHandle> = l_formats
                .iter()
                .map(|fmt| cache.get_or_create(&mut doc, fmt))
                .collect();

            let n_distinct = l_formats.iter().collect::<std::collections::HashSet<_>>().len();
            prop_assert_eq!(cache.len(), n_distinct);
            prop_assert_eq!(doc.styles().len(), n_distinct);

            for (idx_a, fmt_a) in l_formats.iter().enumerate() {
                for (idx_b, fmt_b) in l_formats.iter().enumerate() {
                    prop_assert_eq!(fmt_a == fmt_b, l_styles[idx_a] == l_styles[idx_b]);
                }
            }
        }
    }
}
