//! Maintenance record PDF report.

use crate::error::{InspectError, Result};
use printpdf::*;
use std::path::Path;
use thermal_inspect_common::export::pdf_core::{
    anomaly_lines, build_report_fields, format_timestamp, schematic, ReportData, ReportLayoutCore,
    MM_TO_PT,
};
use thermal_inspect_common::overlay::Tint;

const TITLE_SIZE: f32 = 16.0;
const TEXT_SIZE: f32 = 10.0;
/// Average Helvetica glyph width relative to the font size.
const GLYPH_WIDTH: f32 = 0.5;

fn mm(pt: f32) -> Mm {
    Mm(pt / MM_TO_PT)
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, None))
}

fn tint_color(tint: Tint) -> Color {
    match tint {
        Tint::Red => rgb(0xd3, 0x2f, 0x2f),
        Tint::Yellow => rgb(0xf9, 0xa8, 0x25),
    }
}

/// Splits `text` at word boundaries into lines of at most `max_chars`.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(8);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(max_chars).collect();
            word = word.chars().skip(max_chars).collect();
            lines.push(head);
        }
        if current.is_empty() {
            current = word;
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut current, word));
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Writes lines top to bottom, starting a new page when one fills up.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    core: ReportLayoutCore,
    line: usize,
    page: usize,
}

impl PageWriter {
    fn new(title: &str, core: ReportLayoutCore) -> Result<Self> {
        let (doc, page1, layer1) = PdfDocument::new(
            title,
            mm(core.page_width_pt),
            mm(core.page_height_pt),
            "Layer 1",
        );
        let layer = doc.get_page(page1).get_layer(layer1);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| InspectError::PdfGeneration(format!("font error: {:?}", e)))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| InspectError::PdfGeneration(format!("font error: {:?}", e)))?;
        Ok(Self {
            doc,
            layer,
            font,
            bold,
            core,
            line: 0,
            page: 1,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(
            mm(self.core.page_width_pt),
            mm(self.core.page_height_pt),
            format!("Layer {}", self.page + 1),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.page += 1;
        self.line = 0;
    }

    /// Makes sure `lines` more lines fit on the current page.
    fn reserve(&mut self, lines: usize) {
        if self.line + lines > self.core.lines_per_page() {
            self.new_page();
        }
    }

    fn next_y(&mut self) -> f32 {
        self.reserve(1);
        let y = self.core.line_y_pt(self.line);
        self.line += 1;
        y
    }

    fn header(&self, title: &str, subtitle: &str) {
        let top = self.core.page_height_pt - self.core.margin_pt;
        self.layer.set_fill_color(rgb(0, 0, 0));
        self.layer
            .use_text(title, TITLE_SIZE, mm(self.core.margin_pt), mm(top - TITLE_SIZE), &self.bold);
        self.layer.set_fill_color(rgb(0x66, 0x66, 0x66));
        self.layer.use_text(
            subtitle,
            TEXT_SIZE,
            mm(self.core.margin_pt),
            mm(top - TITLE_SIZE - TEXT_SIZE - 4.0),
            &self.font,
        );
    }

    fn value_chars(&self) -> usize {
        let width = self.core.content_width_pt() - self.core.label_width_pt;
        (width / (TEXT_SIZE * GLYPH_WIDTH)) as usize
    }

    fn full_chars(&self) -> usize {
        (self.core.content_width_pt() / (TEXT_SIZE * GLYPH_WIDTH)) as usize
    }

    fn field(&mut self, label: &str, value: &str) {
        for (i, chunk) in wrap(value, self.value_chars()).into_iter().enumerate() {
            let y = self.next_y();
            if i == 0 {
                self.layer.set_fill_color(rgb(0x55, 0x55, 0x55));
                self.layer
                    .use_text(label, TEXT_SIZE, mm(self.core.margin_pt), mm(y), &self.bold);
            }
            self.layer.set_fill_color(rgb(0, 0, 0));
            self.layer
                .use_text(chunk, TEXT_SIZE, mm(self.core.value_x_pt()), mm(y), &self.font);
        }
    }

    fn heading(&mut self, text: &str) {
        self.reserve(3);
        self.line += 1;
        let y = self.next_y();
        self.layer.set_fill_color(rgb(0, 0, 0));
        self.layer
            .use_text(text, TEXT_SIZE + 2.0, mm(self.core.margin_pt), mm(y), &self.bold);
    }

    fn text(&mut self, text: &str, color: Color) {
        for chunk in wrap(text, self.full_chars()) {
            let y = self.next_y();
            self.layer.set_fill_color(color.clone());
            self.layer
                .use_text(chunk, TEXT_SIZE, mm(self.core.margin_pt), mm(y), &self.font);
        }
    }

    fn rect(&self, left: f32, top: f32, w: f32, h: f32, color: Color, thickness: f32) {
        let points = vec![
            (Point::new(mm(left), mm(top)), false),
            (Point::new(mm(left + w), mm(top)), false),
            (Point::new(mm(left + w), mm(top - h)), false),
            (Point::new(mm(left), mm(top - h)), false),
        ];
        self.layer.set_outline_color(color);
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line {
            points,
            is_closed: true,
        });
    }

    /// Image frame with live region boxes, scaled into the image box.
    fn schematic(&mut self, data: &ReportData) {
        let Some((frame, boxes)) = schematic(data, &self.core) else {
            self.text("Image size unknown; region layout not shown.", rgb(0x66, 0x66, 0x66));
            return;
        };
        let box_lines = (self.core.image_box_height_pt / self.core.line_height_pt).ceil() as usize;
        self.reserve(box_lines + 1);
        let top = self.core.line_y_pt(self.line) + self.core.line_height_pt - 4.0;
        let left = self.core.margin_pt;
        self.rect(
            left,
            top,
            frame.w as f32,
            frame.h as f32,
            rgb(0x99, 0x99, 0x99),
            0.75,
        );
        for (r, tint) in boxes {
            self.rect(
                left + r.x as f32,
                top - r.y as f32,
                r.w as f32,
                r.h as f32,
                tint_color(tint),
                1.5,
            );
        }
        let used = (frame.h as f32 / self.core.line_height_pt).ceil() as usize;
        self.line += used + 1;
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| InspectError::PdfGeneration(format!("save error: {:?}", e)))
    }
}

fn report_title(data: &ReportData) -> String {
    let no = data.transformer.transformer_no.trim();
    if no.is_empty() {
        "Maintenance Report".to_string()
    } else {
        format!("Maintenance Report - {}", no)
    }
}

/// Renders the report into PDF bytes.
pub fn generate_report_bytes(data: &ReportData) -> Result<Vec<u8>> {
    let title = report_title(data);
    let mut w = PageWriter::new(&title, ReportLayoutCore::a4())?;
    w.header(&title, &format!("Generated {}", format_timestamp(&data.generated_at)));

    for field in build_report_fields(data) {
        w.field(field.label, &field.value);
    }

    w.heading("Thermal Image");
    w.schematic(data);

    w.heading("Anomalies");
    let lines = anomaly_lines(&data.regions);
    if lines.is_empty() {
        w.text("No anomalies detected (Normal)", rgb(0x2e, 0x7d, 0x32));
    }
    for line in lines {
        let (prefix, color) = match (line.number, line.deleted) {
            (_, true) => ("-".to_string(), rgb(0x9e, 0x9e, 0x9e)),
            (Some(n), false) => (format!("#{}", n), tint_color(line.tint)),
            (None, false) => ("-".to_string(), tint_color(line.tint)),
        };
        w.text(&format!("{} {}", prefix, line.text), color);
    }

    tracing::debug!(pages = w.page, "report rendered");
    w.finish()
}

/// Writes the report to `output_path`.
pub fn generate_report(data: &ReportData, output_path: &Path) -> Result<()> {
    let bytes = generate_report_bytes(data)?;
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, bytes)?;
    Ok(())
}
