//! Tests for workbook layout: directory, sheet offsets, substreams, settings.

use crate::{bof, bof_version, eof, number, record, sst_body, worksheet, StreamBuilder};
use biffsheets_core::{CellValue, SheetVisibility};
use biffsheets_xls::biff::records;
use biffsheets_xls::{ReadOptions, XlsError, XlsReader};
use pretty_assertions::assert_eq;

#[test]
fn test_xls_multiple_sheets_in_directory_order() {
    let stream = StreamBuilder::new()
        .sheet("First", vec![number(0, 0, 1.0)])
        .sheet("Second", vec![number(0, 0, 2.0), number(1, 0, 3.0)])
        .sheet("Third", vec![])
        .build();

    let workbook = XlsReader::decode_stream(&stream).unwrap();
    let names: Vec<&str> = workbook.worksheets().map(|ws| ws.name()).collect();
    assert_eq!(names, vec!["First", "Second", "Third"]);

    let second = workbook.worksheet_by_name("Second").unwrap();
    assert_eq!(second.cell_count(), 2);
    assert_eq!(second.value_at(1, 0), &CellValue::Number(3.0));
    assert_eq!(workbook.worksheet(2).unwrap().cell_count(), 0);
}

#[test]
fn test_xls_sheet_offsets_match_directory() {
    let stream = StreamBuilder::new()
        .sheet("A", vec![number(0, 0, 1.0)])
        .sheet("B", vec![number(0, 0, 2.0)])
        .build();

    let directory = XlsReader::read_directory(&stream).unwrap();
    assert_eq!(directory.sheets.len(), 2);

    let workbook = XlsReader::decode_stream(&stream).unwrap();
    for (info, ws) in directory.sheets.iter().zip(workbook.worksheets()) {
        assert_eq!(info.name, ws.name());
        assert_eq!(info.offset, ws.offset());
        let at = info.offset as usize;
        assert_eq!(&stream[at..at + 2], &records::BOF.to_le_bytes());
    }
}

#[test]
fn test_xls_hidden_sheets() {
    let stream = StreamBuilder::new()
        .sheet("Shown", vec![number(0, 0, 1.0)])
        .sheet_with("Hidden", 1, 0, worksheet(vec![number(0, 0, 2.0)]))
        .sheet_with("Secret", 2, 0, worksheet(vec![]))
        .build();

    let workbook = XlsReader::decode_stream(&stream).unwrap();
    assert_eq!(workbook.sheet_count(), 3);
    let hidden = workbook.worksheet_by_name("Hidden").unwrap();
    assert!(!hidden.is_visible());
    assert_eq!(
        workbook.worksheet_by_name("Secret").unwrap().visibility(),
        SheetVisibility::VeryHidden
    );

    let options = ReadOptions {
        skip_hidden_sheets: true,
        ..ReadOptions::default()
    };
    let workbook = XlsReader::decode_stream_with_options(&stream, &options).unwrap();
    let names: Vec<&str> = workbook.worksheets().map(|ws| ws.name()).collect();
    assert_eq!(names, vec!["Shown"]);
}

#[test]
fn test_xls_chart_sheets_are_skipped() {
    let mut chart = bof(records::BOF_CHART);
    chart.extend(record(0x1002, &[0; 16]));
    chart.extend(eof());

    let stream = StreamBuilder::new()
        .sheet("Data", vec![number(0, 0, 1.0)])
        .sheet_with("Chart1", 0, 2, chart.clone())
        // Directory says worksheet, substream says chart
        .sheet_with("Mislabelled", 0, 0, chart)
        .sheet("More", vec![number(0, 0, 2.0)])
        .build();

    let workbook = XlsReader::decode_stream(&stream).unwrap();
    let names: Vec<&str> = workbook.worksheets().map(|ws| ws.name()).collect();
    assert_eq!(names, vec!["Data", "More"]);
}

#[test]
fn test_xls_embedded_substream_is_skipped() {
    let mut body = vec![number(0, 0, 1.0), bof(records::BOF_CHART)];
    body.push(number(5, 5, 99.0));
    body.push(eof());
    body.push(number(0, 1, 2.0));

    let stream = StreamBuilder::new().sheet("WithChart", body).build();
    let workbook = XlsReader::decode_stream(&stream).unwrap();
    let sheet = workbook.worksheet(0).unwrap();

    assert_eq!(sheet.cell_count(), 2);
    assert!(sheet.cell_at(5, 5).is_none());
    assert_eq!(sheet.value_at(0, 1), &CellValue::Number(2.0));
}

#[test]
fn test_xls_workbook_settings() {
    let stream = StreamBuilder::new()
        .global(record(records::CODEPAGE, &1200u16.to_le_bytes()))
        .global(record(records::DATEMODE, &1u16.to_le_bytes()))
        .sheet("Sheet1", vec![])
        .build();

    let workbook = XlsReader::decode_stream(&stream).unwrap();
    assert!(workbook.settings().date_1904);
    assert_eq!(workbook.settings().codepage, Some(1200));

    let plain = StreamBuilder::new().sheet("Sheet1", vec![]).build();
    let workbook = XlsReader::decode_stream(&plain).unwrap();
    assert!(!workbook.settings().date_1904);
    assert_eq!(workbook.settings().codepage, None);
}

#[test]
fn test_xls_sst_split_across_continue() {
    let body = sst_body(&["Normal", "FormulaString"]);
    // Break inside "FormulaString" after four characters
    let split = 8 + 3 + 6 + 3 + 4;
    let mut raw = record(records::SST, &body[..split]);
    let mut rest = vec![0x00];
    rest.extend_from_slice(&body[split..]);
    raw.extend(record(records::CONTINUE, &rest));

    let stream = StreamBuilder::new()
        .sst_raw(raw)
        .sheet("Sheet1", vec![crate::label_sst(0, 0, 1)])
        .build();

    let directory = XlsReader::read_directory(&stream).unwrap();
    assert_eq!(
        directory.sst.iter().collect::<Vec<_>>(),
        vec!["Normal", "FormulaString"]
    );

    let workbook = XlsReader::decode_stream(&stream).unwrap();
    assert_eq!(
        workbook.worksheet(0).unwrap().value_at(0, 0).as_text(),
        Some("FormulaString")
    );
}

#[test]
fn test_xls_wide_sst_string_is_rejected() {
    let mut body = Vec::new();
    body.extend_from_slice(&1u32.to_le_bytes());
    body.extend_from_slice(&1u32.to_le_bytes());
    body.extend_from_slice(&[0x01, 0x00, 0x01, b'W', 0x00]);
    let stream = StreamBuilder::new()
        .sst_raw(record(records::SST, &body))
        .build();

    let err = XlsReader::decode_stream(&stream).unwrap_err();
    assert!(matches!(
        err.root(),
        XlsError::UnsupportedEncoding { flags: 0x01 }
    ));
}

#[test]
fn test_xls_malformed_sst() {
    let mut body = sst_body(&["a"]);
    body[4..8].copy_from_slice(&50u32.to_le_bytes());
    let stream = StreamBuilder::new()
        .sst_raw(record(records::SST, &body))
        .build();

    let err = XlsReader::decode_stream(&stream).unwrap_err();
    assert!(matches!(
        err,
        XlsError::Record {
            record_type: records::SST,
            ..
        }
    ));
    assert!(matches!(err.root(), XlsError::MalformedSst(_)));
}

#[test]
fn test_xls_truncated_stream() {
    let mut stream = crate::seed_stream();
    stream.truncate(stream.len() - 2);

    let err = XlsReader::decode_stream(&stream).unwrap_err();
    assert!(matches!(err, XlsError::TruncatedStream { .. }), "got {err:?}");
}

#[test]
fn test_xls_truncated_record_body() {
    let mut stream = StreamBuilder::new()
        .sheet("Sheet1", vec![number(0, 0, 1.0)])
        .build();
    // Drop the sheet EOF and half of the NUMBER body
    stream.truncate(stream.len() - 4 - 7);

    let err = XlsReader::decode_stream(&stream).unwrap_err();
    assert!(matches!(
        err,
        XlsError::TruncatedStream {
            needed: 14,
            available: 7,
            ..
        }
    ));
}

#[test]
fn test_xls_sheet_without_eof() {
    let mut substream = bof(records::BOF_WORKSHEET);
    substream.extend(number(0, 0, 1.0));
    let stream = StreamBuilder::new()
        .sheet_with("Open", 0, 0, substream)
        .build();

    let err = XlsReader::decode_stream(&stream).unwrap_err();
    assert!(matches!(err, XlsError::TruncatedStream { .. }));
}

#[test]
fn test_xls_sheet_offset_past_end() {
    // An empty substream leaves the offset pointing at the end of the stream
    let stream = StreamBuilder::new()
        .sheet_with("Ghost", 0, 0, Vec::new())
        .build();

    let err = XlsReader::decode_stream(&stream).unwrap_err();
    assert!(matches!(
        err,
        XlsError::TruncatedStream { available: 0, .. }
    ));
}

#[test]
fn test_xls_sheet_offset_not_at_bof() {
    let mut substream = number(0, 0, 1.0);
    substream.extend(worksheet(vec![]));
    let stream = StreamBuilder::new()
        .sheet_with("Shifted", 0, 0, substream)
        .build();

    let directory = XlsReader::read_directory(&stream).unwrap();
    let offset = directory.sheets[0].offset as u64;

    let err = XlsReader::decode_stream(&stream).unwrap_err();
    assert!(
        matches!(err, XlsError::Record { record_type: records::NUMBER, offset: o, .. } if o == offset),
        "got {err:?}"
    );
    assert!(matches!(err.root(), XlsError::InvalidFormat(_)));
}

#[test]
fn test_xls_sheet_offset_at_globals_bof() {
    // BOUNDSHEET offset left at 0 instead of the sheet's BOF
    let mut boundsheet = 0u32.to_le_bytes().to_vec();
    boundsheet.extend_from_slice(&[0x00, 0x00, 0x06, 0x00]);
    boundsheet.extend_from_slice(b"Sheet1");

    let mut stream = bof(records::BOF_WORKBOOK_GLOBALS);
    stream.extend(record(records::BOUNDSHEET, &boundsheet));
    stream.extend(eof());
    stream.extend(worksheet(vec![number(0, 0, 1.0)]));

    let err = XlsReader::decode_stream(&stream).unwrap_err();
    assert!(
        matches!(
            err,
            XlsError::Record {
                record_type: records::BOF,
                offset: 0,
                ..
            }
        ),
        "got {err:?}"
    );
    match err.root() {
        XlsError::InvalidFormat(msg) => assert!(msg.contains("Sheet1"), "message: {msg}"),
        other => panic!("expected InvalidFormat, got {other:?}"),
    }
}

#[test]
fn test_xls_sheet_offset_at_unknown_substream() {
    let mut substream = bof(0x0100);
    substream.extend(eof());
    let stream = StreamBuilder::new()
        .sheet_with("Odd", 0, 0, substream)
        .build();

    let err = XlsReader::decode_stream(&stream).unwrap_err();
    assert!(matches!(err.root(), XlsError::InvalidFormat(_)), "got {err:?}");
}

#[test]
fn test_xls_macro_substream_is_skipped() {
    let mut substream = bof(records::BOF_MACRO);
    substream.extend(eof());
    let stream = StreamBuilder::new()
        .sheet_with("Macro1", 0, 0, substream)
        .sheet("Data", vec![number(0, 0, 1.0)])
        .build();

    let workbook = XlsReader::decode_stream(&stream).unwrap();
    let names: Vec<&str> = workbook.worksheets().map(|ws| ws.name()).collect();
    assert_eq!(names, vec!["Data"]);
}

#[test]
fn test_xls_short_sheet_bof_carries_position() {
    let mut substream = record(records::BOF, &[0x00]);
    substream.extend(eof());
    let stream = StreamBuilder::new()
        .sheet_with("Short", 0, 0, substream)
        .build();
    let offset = XlsReader::read_directory(&stream).unwrap().sheets[0].offset as u64;

    let err = XlsReader::decode_stream(&stream).unwrap_err();
    assert!(
        matches!(err, XlsError::Record { record_type: records::BOF, offset: o, .. } if o == offset),
        "got {err:?}"
    );
    assert!(matches!(err.root(), XlsError::InvalidFormat(_)));
}

#[test]
fn test_xls_requires_biff8_globals() {
    let mut stream = bof_version(0x0500, records::BOF_WORKBOOK_GLOBALS);
    stream.extend(eof());
    assert!(matches!(
        XlsReader::decode_stream(&stream),
        Err(XlsError::UnsupportedVersion(_))
    ));

    let stream = worksheet(vec![]);
    assert!(matches!(
        XlsReader::decode_stream(&stream),
        Err(XlsError::InvalidFormat(_))
    ));
}

#[test]
fn test_xls_duplicate_sheet_names() {
    let stream = StreamBuilder::new()
        .sheet("Data", vec![])
        .sheet("DATA", vec![])
        .build();

    let err = XlsReader::decode_stream(&stream).unwrap_err();
    assert!(matches!(
        err,
        XlsError::Core(biffsheets_core::Error::DuplicateSheetName(_))
    ));
}

#[test]
fn test_xls_workbook_without_sheets() {
    let stream = StreamBuilder::new().sst(&["unused"]).build();
    let workbook = XlsReader::decode_stream(&stream).unwrap();
    assert!(workbook.is_empty());
}
