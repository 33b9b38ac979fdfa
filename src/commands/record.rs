use std::path::PathBuf;

use super::{kv, now, or_dash, Context};
use crate::error::{InspectError, Result};
use crate::export::{self, excel, pdf};
use crate::imaging;
use crate::notify::Notification;
use crate::progress::with_spinner;
use thermal_inspect_common::export::pdf_core::{format_timestamp, ReportData};
use thermal_inspect_common::types::{MaintenanceRecord, MaintenanceRecordForm, RecordStatus};
use thermal_inspect_common::validation::{build_record, RecordInput};

fn print_record(r: &MaintenanceRecord) {
    kv("Record", or_dash(r.id.as_deref()));
    kv("Inspection", or_dash(r.inspection_id.as_deref()));
    kv("Image", or_dash(r.maintenance_image_id.as_deref()));
    kv("Inspection time", format_timestamp(r.inspection_timestamp.as_deref().unwrap_or("")));
    kv("Inspector", or_dash(Some(&r.inspector_name)));
    kv("Status", r.status_label());
    for (k, v) in &r.electrical_readings {
        kv(k, v);
    }
    kv("Recommended action", or_dash(r.recommended_action.as_deref()));
    kv("Remarks", or_dash(r.additional_remarks.as_deref()));
}

fn print_form(form: &MaintenanceRecordForm) {
    if let Some(t) = &form.transformer {
        kv("Transformer", format!("{} ({})", t.transformer_no, or_dash(Some(&t.region))));
    }
    if let Some(i) = &form.inspection {
        kv("Inspection", format!("{} [{}]", i.title, i.status.as_str()));
    }
    match &form.maintenance_image {
        Some(im) => kv("Maintenance image", format!("{} ({})", im.display_name(), im.id)),
        None => kv("Maintenance image", "none"),
    }
    kv("Anomalies", form.anomalies.len());
    for a in &form.anomalies {
        let bbox = a
            .bounding_box
            .map(|b| format!("x {:.0} y {:.0} w {:.0} h {:.0}", b.x, b.y, b.width, b.height))
            .unwrap_or_default();
        println!(
            "    {} {} {}",
            or_dash(a.kind.as_deref()),
            or_dash(a.tag.as_deref()),
            bbox
        );
    }
    let statuses: Vec<&str> = form.allowed_statuses.iter().map(|s| s.form_label()).collect();
    kv("Allowed statuses", statuses.join(", "));
    if let Some(existing) = &form.existing_record {
        println!("\nExisting record:");
        print_record(existing);
    }
}

async fn load_form(
    ctx: &Context,
    transformer: &str,
    inspection: Option<&str>,
    image: Option<&str>,
) -> Result<MaintenanceRecordForm> {
    let api = ctx.api()?;
    with_spinner("Loading record form...", api.record_form(transformer, inspection, image)).await
}

pub async fn form(ctx: &Context, transformer: &str, inspection: Option<&str>, image: Option<&str>) -> Result<Notification> {
    let form = load_form(ctx, transformer, inspection, image).await?;
    print_form(&form);
    Ok(Notification::success("Form loaded"))
}

/// Engineer input given on the command line; unset fields keep the form values.
#[derive(Debug, Default)]
pub struct RecordArgs {
    pub inspector: Option<String>,
    pub status: Option<RecordStatus>,
    pub timestamp: Option<String>,
    pub readings: Vec<(String, String)>,
    pub action: Option<String>,
    pub remarks: Option<String>,
}

fn merge_input(form: &MaintenanceRecordForm, args: RecordArgs) -> RecordInput {
    let mut input = RecordInput::from_form(form);
    if let Some(name) = args.inspector {
        input.inspector_name = name;
    }
    if args.status.is_some() {
        input.status = args.status;
    }
    if args.timestamp.is_some() {
        input.inspection_timestamp = args.timestamp;
    }
    for (key, value) in args.readings {
        match input.readings.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => input.readings.push((key, value)),
        }
    }
    if args.action.is_some() {
        input.recommended_action = args.action;
    }
    if args.remarks.is_some() {
        input.additional_remarks = args.remarks;
    }
    input
}

pub async fn save(
    ctx: &Context,
    transformer: &str,
    inspection: Option<&str>,
    image: Option<&str>,
    args: RecordArgs,
) -> Result<Notification> {
    ctx.session.require_token()?;
    let form = load_form(ctx, transformer, inspection, image).await?;
    let input = merge_input(&form, args);
    let record = build_record(transformer, &form, &input)?;

    let api = ctx.api()?;
    let saved = match record.id.clone() {
        Some(id) => with_spinner("Updating record...", api.update_record(&id, &record)).await?,
        None => with_spinner("Saving record...", api.create_record(transformer, &record)).await?,
    };
    print_record(&saved);
    let verb = if record.id.is_some() { "updated" } else { "saved" };
    Ok(Notification::success(format!("Maintenance record {}", verb)))
}

pub async fn list(ctx: &Context, transformer: &str) -> Result<Notification> {
    let api = ctx.api()?;
    let records = with_spinner("Loading records...", api.list_records(transformer)).await?;
    println!("  {:<6} {:<17} {:<16} {:<22} INSPECTION", "ID", "TIME", "INSPECTOR", "STATUS");
    for r in &records {
        println!(
            "  {:<6} {:<17} {:<16} {:<22} {}",
            or_dash(r.id.as_deref()),
            format_timestamp(r.inspection_timestamp.as_deref().unwrap_or("")),
            r.inspector_name,
            r.status_label(),
            or_dash(r.inspection_id.as_deref())
        );
    }
    Ok(Notification::success(format!("{} records", records.len())))
}

pub async fn show(ctx: &Context, record: &str) -> Result<Notification> {
    let api = ctx.api()?;
    let r = with_spinner("Loading record...", api.get_record(record)).await?;
    print_record(&r);
    Ok(Notification::success("Loaded"))
}

fn output_dir(ctx: &Context, output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| ctx.config.report_dir())
}

pub async fn export_pdf(ctx: &Context, transformer: &str, record: &str, output: Option<PathBuf>) -> Result<Notification> {
    let api = ctx.api()?;
    let (t, r, images, inspections) = with_spinner("Loading report data...", async {
        futures::try_join!(
            api.get_transformer(transformer),
            api.get_record(record),
            api.list_images(transformer),
            api.list_inspections(transformer)
        )
    })
    .await?;

    let image = r
        .maintenance_image_id
        .as_deref()
        .and_then(|id| images.iter().find(|im| im.id == id))
        .cloned();
    let inspection = r
        .inspection_id
        .as_deref()
        .and_then(|id| inspections.into_iter().find(|i| i.id == id));

    let (regions, image_size) = match &image {
        Some(im) => {
            let regions = api.list_regions(&im.id).await?;
            let size = match api.image_raw(&im.id).await {
                Ok(bytes) => imaging::natural_size(&bytes).ok(),
                Err(e) => {
                    tracing::warn!(image_id = %im.id, error = %e, "image not available for the report");
                    None
                }
            };
            (regions, size)
        }
        None => (Vec::new(), None),
    };

    let data = ReportData {
        transformer: t,
        inspection,
        image,
        image_size,
        record: r,
        regions,
        generated_at: now(),
    };
    let stem = export::report_stem(&data.transformer.transformer_no, data.record.id.as_deref());
    let path = export::output_path_for(&output_dir(ctx, output), &stem, "pdf");
    println!("- Generating PDF...");
    pdf::generate_report(&data, &path)?;
    Ok(Notification::success(format!("PDF saved: {}", path.display())))
}

pub async fn export_excel(ctx: &Context, transformer: &str, output: Option<PathBuf>) -> Result<Notification> {
    let api = ctx.api()?;
    let (t, records) = with_spinner("Loading history...", async {
        futures::try_join!(api.get_transformer(transformer), api.list_records(transformer))
    })
    .await?;
    if records.is_empty() {
        return Err(InspectError::NotFound(format!(
            "maintenance records for transformer {}",
            t.transformer_no
        )));
    }
    let stem = format!("maintenance-history-{}", t.transformer_no);
    let path = export::output_path_for(&output_dir(ctx, output), &stem, "xlsx");
    println!("- Generating Excel...");
    excel::generate_history(&t, &records, &path)?;
    Ok(Notification::success(format!("Excel saved: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermal_inspect_common::types::Inspection;

    #[test]
    fn test_merge_input_overrides_form() {
        let form = MaintenanceRecordForm {
            inspection: Some(Inspection {
                inspector: "Form Inspector".into(),
                ..Default::default()
            }),
            existing_record: Some(MaintenanceRecord {
                electrical_readings: [("Voltage".to_string(), "230".to_string())].into_iter().collect(),
                ..Default::default()
            }),
            allowed_statuses: vec![RecordStatus::Ok, RecordStatus::UrgentAttention],
            ..Default::default()
        };
        let input = merge_input(
            &form,
            RecordArgs {
                status: Some(RecordStatus::UrgentAttention),
                readings: vec![("Voltage".into(), "240".into()), ("Current".into(), "5A".into())],
                ..Default::default()
            },
        );
        assert_eq!(input.inspector_name, "Form Inspector");
        assert_eq!(input.status, Some(RecordStatus::UrgentAttention));
        assert_eq!(
            input.readings,
            vec![("Voltage".to_string(), "240".to_string()), ("Current".to_string(), "5A".to_string())]
        );
    }
}
