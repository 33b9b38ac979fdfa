//! Maintenance history workbook.
//!
//! One sheet per transformer history: a header row, then one row per record,
//! newest first. Readings are flattened into a single cell.

use crate::error::{Error, Result};
use crate::types::{MaintenanceRecord, RecordStatus, Transformer};
use rust_xlsxwriter::*;

const HEADERS: [(&str, f64); 8] = [
    ("Inspection Time", 20.0),
    ("Inspector", 18.0),
    ("Status", 22.0),
    ("Inspection", 12.0),
    ("Image", 10.0),
    ("Readings", 36.0),
    ("Recommended Action", 36.0),
    ("Remarks", 36.0),
];

fn status_color(record: &MaintenanceRecord) -> Color {
    match record.status {
        Some(RecordStatus::Ok) => Color::RGB(0xE8F5E9),
        Some(RecordStatus::NeedsMaintenance) => Color::RGB(0xFFF3E0),
        Some(RecordStatus::UrgentAttention) => Color::RGB(0xFFEBEE),
        None => Color::RGB(0xF5F5F5),
    }
}

fn readings_text(record: &MaintenanceRecord) -> String {
    record
        .electrical_readings
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the history workbook in memory.
pub fn generate_history_buffer(
    transformer: &Transformer,
    records: &[MaintenanceRecord],
) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let title_format = Format::new().set_bold().set_font_size(14.0);
    let header_format = Format::new()
        .set_bold()
        .set_font_size(10.0)
        .set_font_color(Color::RGB(0x555555))
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xAAAAAA));
    let value_format = Format::new()
        .set_font_size(10.0)
        .set_align(FormatAlign::Top)
        .set_text_wrap()
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let worksheet = workbook.add_worksheet();
    let sheet_name = sanitize_sheet_name(&transformer.transformer_no);
    worksheet
        .set_name(&sheet_name)
        .map_err(|e| Error::Excel(format!("Sheet name error: {}", e)))?;

    worksheet
        .write_string_with_format(
            0,
            0,
            format!("Maintenance history - {}", transformer.transformer_no),
            &title_format,
        )
        .map_err(|e| Error::Excel(format!("Write error: {}", e)))?;

    for (col, (name, width)) in HEADERS.iter().enumerate() {
        let col = col as u16;
        worksheet
            .set_column_width(col, *width)
            .map_err(|e| Error::Excel(format!("Column width error: {}", e)))?;
        worksheet
            .write_string_with_format(2, col, *name, &header_format)
            .map_err(|e| Error::Excel(format!("Write error: {}", e)))?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = 3 + i as u32;
        let status_format = value_format.clone().set_background_color(status_color(record));
        let cells = [
            record.inspection_timestamp.clone().unwrap_or_default(),
            record.inspector_name.clone(),
            record.status_label().to_string(),
            record.inspection_id.clone().unwrap_or_default(),
            record.maintenance_image_id.clone().unwrap_or_default(),
            readings_text(record),
            record.recommended_action.clone().unwrap_or_default(),
            record.additional_remarks.clone().unwrap_or_default(),
        ];
        for (col, text) in cells.iter().enumerate() {
            let format = if col == 2 { &status_format } else { &value_format };
            worksheet
                .write_string_with_format(row, col as u16, text, format)
                .map_err(|e| Error::Excel(format!("Write error: {}", e)))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| Error::Excel(format!("Workbook save error: {}", e)))
}

/// Excel sheet names: at most 31 chars, none of `[]:*?/\`.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(31)
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').to_string();
    if cleaned.is_empty() {
        "History".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("T-100"), "T-100");
        assert_eq!(sanitize_sheet_name("a/b:c"), "abc");
        assert_eq!(sanitize_sheet_name(""), "History");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), 31);
    }

    #[test]
    fn test_generate_history_buffer() {
        let transformer = Transformer {
            transformer_no: "T-100".into(),
            ..Default::default()
        };
        let records = vec![MaintenanceRecord {
            inspector_name: "Nimal".into(),
            status: Some(RecordStatus::Ok),
            electrical_readings: [("Voltage".to_string(), "230".to_string())].into_iter().collect(),
            ..Default::default()
        }];
        let buffer = generate_history_buffer(&transformer, &records).unwrap();
        // xlsx is a zip archive
        assert_eq!(&buffer[..2], b"PK");
    }

    #[test]
    fn test_readings_text() {
        let record = MaintenanceRecord {
            electrical_readings: [
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "2".to_string()),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        };
        assert_eq!(readings_text(&record), "A: 1\nB: 2");
    }
}
