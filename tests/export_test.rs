//! PDF/Excel export integration tests

use std::collections::BTreeMap;

use thermal_inspect::export::{excel, output_path_for, pdf, report_stem};
use thermal_inspect_common::export::pdf_core::{anomaly_lines, build_report_fields, ReportData};
use thermal_inspect_common::layout::Size;
use thermal_inspect_common::region::{BoxGeometry, ErrorRegion, RegionStatus};
use thermal_inspect_common::types::{Inspection, MaintenanceRecord, RecordStatus, Transformer};
use tempfile::tempdir;

fn transformer() -> Transformer {
    Transformer {
        id: "1".into(),
        transformer_no: "T-100".into(),
        pole_no: "P-7".into(),
        region: "Colombo".into(),
        transformer_type: "BULK".into(),
    }
}

fn record(id: &str, timestamp: &str, status: RecordStatus) -> MaintenanceRecord {
    let mut readings = BTreeMap::new();
    readings.insert("Voltage".to_string(), "230V".to_string());
    readings.insert("Current".to_string(), "12A".to_string());
    MaintenanceRecord {
        id: Some(id.into()),
        transformer_id: Some("1".into()),
        inspection_id: Some("4".into()),
        inspection_timestamp: Some(timestamp.into()),
        inspector_name: "Nimal".into(),
        status: Some(status),
        electrical_readings: readings,
        recommended_action: Some("Tighten the LV joint and re-inspect within two weeks".into()),
        ..Default::default()
    }
}

fn report(regions: Vec<ErrorRegion>) -> ReportData {
    ReportData {
        transformer: transformer(),
        inspection: Some(Inspection {
            id: "4".into(),
            title: "Q1 round".into(),
            inspector: "Nimal".into(),
            ..Default::default()
        }),
        image: None,
        image_size: Some(Size::new(640.0, 480.0)),
        record: record("12", "2026-02-01T09:30:00.000Z", RecordStatus::NeedsMaintenance),
        regions,
        generated_at: "2026-02-02T08:00:00.000Z".into(),
    }
}

fn region(status: RegionStatus, deleted: bool) -> ErrorRegion {
    let mut r = ErrorRegion::with_geometry(BoxGeometry::new(0.4, 0.5, 0.1, 0.1), status);
    r.id = Some("r".into());
    if deleted {
        r.mark_deleted("2026-02-01T10:00:00.000Z");
    }
    r
}

/// The PDF report is written and starts with a PDF header
#[test]
fn test_generate_pdf_report() {
    let dir = tempdir().unwrap();
    let data = report(vec![
        region(RegionStatus::Faulty, false),
        region(RegionStatus::Potential, true),
    ]);
    let stem = report_stem(&data.transformer.transformer_no, data.record.id.as_deref());
    let path = output_path_for(dir.path(), &stem, "pdf");

    pdf::generate_report(&data, &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert!(path.file_name().unwrap().to_string_lossy().ends_with(".pdf"));
}

/// A report without image size or regions still renders
#[test]
fn test_generate_pdf_minimal() {
    let mut data = report(Vec::new());
    data.image_size = None;
    data.inspection = None;
    let bytes = pdf::generate_report_bytes(&data).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

/// Deleted regions are listed but not counted
#[test]
fn test_report_counts_live_regions() {
    let data = report(vec![
        region(RegionStatus::Faulty, false),
        region(RegionStatus::Potential, false),
        region(RegionStatus::Faulty, true),
    ]);
    let fields = build_report_fields(&data);
    let count = fields.iter().find(|f| f.label == "Anomalies").unwrap();
    assert_eq!(count.value, "2");

    let lines = anomaly_lines(&data.regions);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines.iter().filter(|l| l.deleted).count(), 1);
    assert!(lines.iter().any(|l| l.text.starts_with("DELETED")));
}

/// The history workbook is written as an xlsx (zip) file
#[test]
fn test_generate_history_workbook() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history").join("maintenance-history-T-100.xlsx");
    let records = vec![
        record("1", "2026-01-01T09:00:00.000Z", RecordStatus::Ok),
        record("2", "2026-02-01T09:00:00.000Z", RecordStatus::UrgentAttention),
    ];

    excel::generate_history(&transformer(), &records, &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

/// An empty history still produces a workbook
#[test]
fn test_generate_history_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.xlsx");
    excel::generate_history(&transformer(), &[], &path).unwrap();
    assert!(path.exists());
}
