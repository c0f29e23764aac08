use chrono::NaiveDate;
use tabexport_xlsx::{
    C_FORMAT_CURRENCY, ContentProvider, DocumentModel, EnumCellValue, EnumColor,
    EnumPropertyType, EnumValueClass, ExcelExporter, ExportError, ExportWorkbook, MemoryDocument,
    SheetId, SpecCellFormat, SpecCellRef, SpecExportColumn, SpecExportOptions,
    StyleCache,
};

struct Booking {
    id: i64,
    day: NaiveDate,
    fee: f64,
    note: String,
}

fn build_bookings(n_rows: usize) -> Vec<Booking> {
    let day = NaiveDate::from_ymd_opt(2024, 4, 15).expect("date");
    (0..n_rows)
        .map(|idx| Booking {
            id: idx as i64 + 1,
            day,
            fee: 9.5 * (idx as f64 + 1.0),
            note: format!("row {idx}"),
        })
        .collect()
}

fn build_columns() -> Vec<SpecExportColumn<Booking>> {
    vec![
        SpecExportColumn::new("id", "Id", |b: &Booking| b.id.into())
            .with_value_class(EnumValueClass::Integer),
        SpecExportColumn::new("day", "Day", |b: &Booking| b.day.into())
            .with_property_type(EnumPropertyType::Date),
        SpecExportColumn::new("fee", "Fee", |b: &Booking| b.fee.into())
            .with_property_type(EnumPropertyType::Currency),
        SpecExportColumn::new("note", "Note", |b: &Booking| b.note.clone().into()),
    ]
}

fn cell_ref(sheet: SheetId, row: usize, col: usize) -> SpecCellRef {
    SpecCellRef { sheet, row, col }
}

#[test]
fn integer_and_date_cells_get_distinct_styles_with_exact_patterns() {
    let provider = ContentProvider::default();
    let mut doc = MemoryDocument::new();
    let mut cache = StyleCache::new();
    let sheet = doc.add_sheet("Data");
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");

    let style_int = provider
        .resolve_and_apply(
            &mut doc,
            &mut cache,
            cell_ref(sheet, 1, 0),
            EnumCellValue::Integer(42),
            None,
        )
        .expect("int");
    let style_date = provider
        .resolve_and_apply(
            &mut doc,
            &mut cache,
            cell_ref(sheet, 1, 1),
            EnumCellValue::Date(date),
            None,
        )
        .expect("date");

    assert_ne!(style_int, style_date);
    assert_eq!(doc.style_data_format(style_int), Some("#,##0"));
    assert_eq!(doc.style_data_format(style_date), Some("MM/dd/yyyy"));
}

#[test]
fn currency_column_gets_pattern_and_narrow_width() {
    let mut exporter = ExcelExporter::new();
    let provider = exporter.create_provider();
    exporter
        .add_sheet(provider, "Bookings", &build_bookings(3), &build_columns())
        .expect("sheet");

    let doc = exporter.into_workbook().into_document().expect("flush");
    let sheet = &doc.sheets()[0];
    for n_row in 1..=3 {
        let style = sheet.cell(n_row, 2).and_then(|c| c.style).expect("style");
        assert_eq!(doc.style_data_format(style), Some(C_FORMAT_CURRENCY));
    }
    assert_eq!(sheet.dict_col_widths.get(&2), Some(&10));
    assert_eq!(sheet.dict_col_widths.get(&3), Some(&20));
}

#[test]
fn exported_rows_are_banded_below_a_bold_header() {
    let mut exporter = ExcelExporter::new();
    let provider = exporter.create_provider();
    exporter
        .add_sheet(provider, "Bands", &build_bookings(4), &build_columns())
        .expect("sheet");

    let doc = exporter.into_workbook().into_document().expect("flush");
    let sheet = &doc.sheets()[0];
    let record_at = |row: usize| {
        sheet
            .cell(row, 3)
            .and_then(|c| c.style)
            .and_then(|s| doc.style(s))
            .cloned()
            .expect("record")
    };

    let header = record_at(0);
    assert!(header.font.as_ref().is_some_and(|f| f.bold));
    assert_eq!(header.fill_color, Some(EnumColor::White));
    for n_row in 1..=4 {
        let record = record_at(n_row);
        let fill_expected = if n_row % 2 == 0 {
            EnumColor::Grey25Percent
        } else {
            EnumColor::White
        };
        assert_eq!(record.fill_color, Some(fill_expected), "row {n_row}");
        assert!(record.font.as_ref().is_some_and(|f| !f.bold));
    }
}

#[test]
fn styles_are_shared_across_sheets_of_one_workbook() {
    let mut workbook = ExportWorkbook::new();
    for name in ["One", "Two"] {
        let sheet = workbook.add_sheet(name, ContentProvider::default());
        sheet.add_row_values(["h"]).expect("header");
        sheet.add_row_values([1]).expect("row");
    }
    workbook.flush().expect("flush");

    let doc = workbook.document();
    let style_one = doc.sheets()[0].cell(1, 0).and_then(|c| c.style);
    let style_two = doc.sheets()[1].cell(1, 0).and_then(|c| c.style);
    assert!(style_one.is_some());
    assert_eq!(style_one, style_two);
    assert_eq!(workbook.style_cache().len(), doc.styles().len());
}

#[test]
fn hooks_customize_format_and_value() {
    let provider = ContentProvider::default()
        .with_format_hook(|fmt, value| match value {
            EnumCellValue::Number(n) if *n < 0.0 => Some(SpecCellFormat {
                data_format: Some("0.0;[Red]-0.0".to_string()),
                ..fmt.cloned().unwrap_or_default()
            }),
            _ => None,
        })
        .with_value_hook(|value| match value {
            EnumCellValue::Opaque(name) if name == "Percent" => Some(EnumCellValue::Number(0.25)),
            _ => None,
        });

    let mut workbook = ExportWorkbook::new();
    let sheet = workbook.add_sheet("Hooks", provider);
    sheet.add_row_values(["a", "b"]).expect("header");
    let row = sheet
        .add_row_values([
            EnumCellValue::Number(-3.0),
            EnumCellValue::Opaque("Percent".into()),
        ])
        .expect("row");
    assert_eq!(row.cells()[1].value(), &EnumCellValue::Number(0.25));

    let err = sheet
        .add_row_values([EnumCellValue::Opaque("Money".into())])
        .expect_err("unsupported");
    assert_eq!(err.to_string(), "Type Money not supported for cell values.");

    workbook.flush().expect("flush");
    let doc = workbook.document();
    let style = doc.sheets()[0].cell(1, 0).and_then(|c| c.style).expect("style");
    assert_eq!(doc.style_data_format(style), Some("0.0;[Red]-0.0"));
}

#[test]
fn malformed_override_is_rejected() {
    let mut provider = ContentProvider::default();
    let err = provider
        .register_override("", SpecCellFormat::from_data_format("0.00"))
        .expect_err("blank name");
    assert!(matches!(err, ExportError::MalformedOverride(_)));
}

#[test]
fn options_from_json_drive_date_patterns_and_styling() {
    let options = SpecExportOptions::from_json_str(
        r#"{"auto_format_cells": false, "date_formats": {"date": "yyyy-MM-dd"}}"#,
    )
    .expect("options");
    assert!(options.if_freeze_header);

    let mut exporter = ExcelExporter::with_options(options);
    let provider = exporter.create_provider();
    exporter
        .add_sheet(provider, "Iso", &build_bookings(1), &build_columns())
        .expect("sheet");

    let doc = exporter.into_workbook().into_document().expect("flush");
    let sheet = &doc.sheets()[0];
    let style = sheet.cell(1, 1).and_then(|c| c.style).expect("style");
    assert_eq!(doc.style_data_format(style), Some("yyyy-MM-dd"));
    assert_eq!(doc.style(style).and_then(|r| r.fill_color), None);
}

#[test]
fn saved_workbook_is_an_xlsx_archive() {
    let dir_tmp = tempfile::tempdir().expect("tempdir");
    let path_file_out = dir_tmp.path().join("bookings.xlsx");

    let mut exporter = ExcelExporter::new();
    let provider = exporter.create_provider();
    let sheet = exporter
        .add_sheet(provider, "Bookings", &build_bookings(5), &build_columns())
        .expect("sheet");
    sheet.set_autofilter().expect("filter");
    sheet.set_zoom(90);
    exporter.save(&path_file_out).expect("save");

    let v_bytes = std::fs::read(&path_file_out).expect("read");
    assert!(v_bytes.len() > 100);
    assert_eq!(&v_bytes[0..2], b"PK");
}
