//! Maintenance report layout and field building, shared by the CLI and the
//! desktop viewer. Rendering itself lives with the callers.

use crate::layout::{Layout, Rect, Size};
use crate::overlay::{self, Tint};
use crate::region::ErrorRegion;
use crate::types::{ImageRecord, Inspection, MaintenanceRecord, Transformer};

pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 15.0;
pub const IMAGE_BOX_HEIGHT_MM: f32 = 90.0;

pub const MM_TO_PT: f32 = 72.0 / 25.4;

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

/// Report page geometry in points.
#[derive(Debug, Clone)]
pub struct ReportLayoutCore {
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub margin_pt: f32,
    pub header_height_pt: f32,
    pub line_height_pt: f32,
    pub label_width_pt: f32,
    pub image_box_height_pt: f32,
}

impl Default for ReportLayoutCore {
    fn default() -> Self {
        Self::a4()
    }
}

impl ReportLayoutCore {
    pub fn a4() -> Self {
        Self {
            page_width_pt: mm_to_pt(A4_WIDTH_MM),
            page_height_pt: mm_to_pt(A4_HEIGHT_MM),
            margin_pt: mm_to_pt(MARGIN_MM),
            header_height_pt: 40.0,
            line_height_pt: 14.0,
            label_width_pt: 130.0,
            image_box_height_pt: mm_to_pt(IMAGE_BOX_HEIGHT_MM),
        }
    }

    pub fn content_width_pt(&self) -> f32 {
        self.page_width_pt - self.margin_pt * 2.0
    }

    /// Baseline of text line `n` below the header (PDF origin is bottom-left).
    pub fn line_y_pt(&self, n: usize) -> f32 {
        self.page_height_pt
            - self.margin_pt
            - self.header_height_pt
            - (n as f32 + 1.0) * self.line_height_pt
    }

    pub fn value_x_pt(&self) -> f32 {
        self.margin_pt + self.label_width_pt
    }

    /// Lines that fit on one page below the header.
    pub fn lines_per_page(&self) -> usize {
        let usable = self.page_height_pt - self.margin_pt * 2.0 - self.header_height_pt;
        (usable / self.line_height_pt).floor().max(1.0) as usize
    }
}

/// One label/value line of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportField {
    pub label: &'static str,
    pub value: String,
}

/// Everything a maintenance report shows.
#[derive(Debug, Clone, Default)]
pub struct ReportData {
    pub transformer: Transformer,
    pub inspection: Option<Inspection>,
    pub image: Option<ImageRecord>,
    /// Natural size of the maintenance image, when known.
    pub image_size: Option<Size>,
    pub record: MaintenanceRecord,
    pub regions: Vec<ErrorRegion>,
    pub generated_at: String,
}

fn or_dash(s: &str) -> String {
    let s = s.trim();
    if s.is_empty() {
        "-".to_string()
    } else {
        s.to_string()
    }
}

fn opt_or_dash(s: Option<&str>) -> String {
    or_dash(s.unwrap_or(""))
}

/// "2025-02-01T09:30:12.000Z" → "2025/02/01 09:30"
pub fn format_timestamp(ts: &str) -> String {
    let ts = ts.trim();
    if ts.is_empty() {
        return "-".to_string();
    }
    let formatted = ts.replace('T', " ").replacen('-', "/", 2);
    formatted.chars().take(16).collect()
}

/// Header fields in display order.
pub fn build_report_fields(data: &ReportData) -> Vec<ReportField> {
    let t = &data.transformer;
    let r = &data.record;
    let mut fields = vec![
        ReportField { label: "Transformer No", value: or_dash(&t.transformer_no) },
        ReportField { label: "Pole No", value: or_dash(&t.pole_no) },
        ReportField { label: "Region", value: or_dash(&t.region) },
        ReportField { label: "Type", value: or_dash(&t.transformer_type) },
        ReportField {
            label: "Inspection",
            value: opt_or_dash(data.inspection.as_ref().map(|i| i.title.as_str())),
        },
        ReportField {
            label: "Maintenance Image",
            value: data
                .image
                .as_ref()
                .map(|i| i.display_name())
                .unwrap_or_else(|| "-".to_string()),
        },
        ReportField {
            label: "Inspection Time",
            value: format_timestamp(r.inspection_timestamp.as_deref().unwrap_or("")),
        },
        ReportField { label: "Inspector", value: or_dash(&r.inspector_name) },
        ReportField { label: "Status", value: r.status_label().to_string() },
        ReportField {
            label: "Recommended Action",
            value: opt_or_dash(r.recommended_action.as_deref()),
        },
        ReportField {
            label: "Remarks",
            value: opt_or_dash(r.additional_remarks.as_deref()),
        },
    ];
    for (key, value) in &r.electrical_readings {
        fields.push(ReportField {
            label: "Reading",
            value: format!("{}: {}", key, value),
        });
    }
    fields.push(ReportField {
        label: "Anomalies",
        value: overlay::live_count(&data.regions).to_string(),
    });
    fields
}

/// One anomaly line of the report table.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyLine {
    pub number: Option<u32>,
    pub text: String,
    pub tint: Tint,
    pub deleted: bool,
}

/// Every region, numbered like the viewer. Deleted ones are listed and
/// flagged but not counted.
pub fn anomaly_lines(regions: &[ErrorRegion]) -> Vec<AnomalyLine> {
    overlay::list_rows(regions)
        .into_iter()
        .map(|row| {
            let mut text = format!("{} {}", row.tag, row.coords);
            if let Some(label) = &row.label {
                text.push_str(&format!(" {}", label));
            }
            if let Some(c) = row.confidence_pct {
                text.push_str(&format!(" ({}%)", c));
            }
            if row.is_manual {
                text.push_str(" [manual]");
            }
            if let Some(comment) = &row.comment {
                text.push_str(&format!(" - {}", comment));
            }
            if row.is_deleted {
                let when = row.deleted_at.as_deref().map(format_timestamp).unwrap_or_default();
                text = format!("DELETED {} {}", when, text).replace("  ", " ");
            }
            AnomalyLine {
                number: row.number,
                text,
                tint: row.tint,
                deleted: row.is_deleted,
            }
        })
        .collect()
}

/// Schematic of the image and its live regions inside the report's image box.
///
/// Returns the image frame and region rectangles in points relative to the
/// box's top-left corner.
pub fn schematic(data: &ReportData, core: &ReportLayoutCore) -> Option<(Rect, Vec<(Rect, Tint)>)> {
    let natural = data.image_size?;
    let max = Size::new(core.content_width_pt() as f64, core.image_box_height_pt as f64);
    let layout = Layout::fit_within(max, natural, true);
    if !layout.ready {
        return None;
    }
    let frame = Rect::new(0.0, 0.0, layout.render_w, layout.render_h);
    let boxes = overlay::render_overlay(&data.regions, &layout)
        .into_iter()
        .map(|s| (s.rect, s.tint))
        .collect();
    Some((frame, boxes))
}
