use super::{cancelled, confirm, now, report_training, Context};
use crate::annotate::{self, BoxChange, CornerBox, DrawInput, Offset, PropertyChange};
use crate::api::ApiClient;
use crate::compare::latest_baseline;
use crate::error::{InspectError, Result};
use crate::imaging;
use crate::notify::Notification;
use crate::progress::with_spinner;
use crate::sync::RegionSync;
use thermal_inspect_common::edit::Handle;
use thermal_inspect_common::layout::Size;
use thermal_inspect_common::overlay::{list_rows, ListRow};
use thermal_inspect_common::region::{ErrorRegion, RegionStatus};
use thermal_inspect_common::types::TrainRequest;

pub fn print_rows(regions: &[ErrorRegion]) {
    let rows = list_rows(regions);
    if rows.is_empty() {
        println!("  No anomalies detected (Normal)");
        return;
    }
    for row in rows {
        println!("  {}", row_text(&row));
    }
}

fn row_text(row: &ListRow) -> String {
    let number = row
        .number
        .map(|n| format!("#{:<3}", n))
        .unwrap_or_else(|| "    ".to_string());
    let mut text = format!("{} {:<9} {}", number, row.tag, row.coords);
    if let Some(c) = row.confidence_pct {
        text.push_str(&format!("  {}%", c));
    }
    if let Some(label) = &row.label {
        text.push_str(&format!("  {}", label));
    }
    if row.is_manual {
        text.push_str("  [manual]");
    }
    if let Some(comment) = &row.comment {
        text.push_str(&format!("  \"{}\"", comment));
    }
    if row.is_deleted {
        text.push_str(&format!(
            "  DELETED {}",
            row.deleted_at.as_deref().unwrap_or("")
        ));
    }
    text
}

async fn open_sync(ctx: &Context, image: &str) -> Result<RegionSync<ApiClient>> {
    let sync = ctx.region_sync()?;
    with_spinner("Loading regions...", sync.load(image)).await?;
    Ok(sync)
}

/// Position of the live region shown as `number`.
fn position_for(regions: &[ErrorRegion], number: usize) -> Result<usize> {
    list_rows(regions)
        .into_iter()
        .find(|r| r.number.map(|n| n as usize) == Some(number))
        .map(|r| r.source)
        .ok_or_else(|| InspectError::NotFound(format!("region #{}", number)))
}

async fn natural_size(api: &ApiClient, image: &str) -> Result<Size> {
    let bytes = with_spinner("Reading image size...", api.image_raw(image)).await?;
    imaging::natural_size(&bytes)
}

/// Closes the edit session and queues training when enabled.
async fn finish(ctx: &Context, sync: &RegionSync<ApiClient>, image: &str, transformer: Option<&str>) -> Option<Notification> {
    let request = match transformer {
        Some(t) => match sync.backend().list_images(t).await {
            Ok(images) => latest_baseline(&images).map(|b| TrainRequest {
                transformer_id: t.to_string(),
                baseline_image_id: b.id.clone(),
                maintenance_image_id: image.to_string(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "could not look up the baseline for training");
                None
            }
        },
        None => None,
    };
    let task = sync.finish(ctx.config.auto_train, request)?;
    Some(report_training(task).await)
}

pub async fn list(ctx: &Context, image: &str) -> Result<Notification> {
    let sync = open_sync(ctx, image).await?;
    let regions = sync.regions(image);
    print_rows(&regions);
    let anomaly = sync.with_store(|s| s.anomaly(image));
    Ok(Notification::success(format!(
        "{} regions, anomaly {}",
        regions.len(),
        anomaly.as_str()
    )))
}

pub async fn add(
    ctx: &Context,
    image: &str,
    transformer: Option<&str>,
    rect: CornerBox,
    status: RegionStatus,
    label: Option<String>,
    comment: Option<String>,
) -> Result<Notification> {
    let sync = open_sync(ctx, image).await?;
    let natural = natural_size(sync.backend(), image).await?;
    let input = DrawInput {
        rect,
        status,
        label,
        comment,
    };
    let user = ctx.acting_user().unwrap_or_default();
    let region = annotate::draw_region(natural, &input, &user, &now())?;
    with_spinner("Saving region...", sync.add(image, region)).await?;
    print_rows(&sync.regions(image));
    if let Some(n) = finish(ctx, &sync, image, transformer).await {
        n.print();
    }
    Ok(Notification::success("Region added and saved"))
}

#[allow(clippy::too_many_arguments)]
pub async fn update(
    ctx: &Context,
    image: &str,
    number: usize,
    transformer: Option<&str>,
    rect: Option<CornerBox>,
    offset: Option<Offset>,
    resize: Option<(Handle, Offset)>,
    status: Option<RegionStatus>,
    label: Option<String>,
    comment: Option<String>,
) -> Result<Notification> {
    let sync = open_sync(ctx, image).await?;
    let regions = sync.regions(image);
    let pos = position_for(&regions, number)?;
    let current = &regions[pos];
    let user = ctx.acting_user();
    let stamp = now();

    let change = BoxChange {
        set: rect,
        offset,
        resize,
        status,
    };
    let updated = if change.is_empty() {
        if status.is_none() && label.is_none() && comment.is_none() {
            return Err(InspectError::Validation("Nothing to change".to_string()));
        }
        let props = PropertyChange {
            status,
            label,
            comment,
        };
        annotate::edit_properties(current, &props, user.as_deref(), &stamp)?
    } else {
        let natural = natural_size(sync.backend(), image).await?;
        let mut updated = annotate::edit_box(current, natural, &change, user.as_deref(), comment.as_deref(), &stamp)?;
        if let Some(label) = label {
            updated.label = Some(label.trim().to_string()).filter(|l| !l.is_empty());
        }
        updated
    };

    with_spinner("Saving region...", sync.update(image, pos, updated)).await?;
    print_rows(&sync.regions(image));
    if let Some(n) = finish(ctx, &sync, image, transformer).await {
        n.print();
    }
    Ok(Notification::success("Region updated and saved"))
}

pub async fn delete(
    ctx: &Context,
    image: &str,
    number: usize,
    transformer: Option<&str>,
    yes: bool,
) -> Result<Notification> {
    let sync = open_sync(ctx, image).await?;
    let pos = position_for(&sync.regions(image), number)?;
    if !confirm(&format!("Delete region #{}?", number), yes)? {
        return Ok(cancelled());
    }
    with_spinner("Deleting region...", sync.delete(image, pos, &now())).await?;
    print_rows(&sync.regions(image));
    if let Some(n) = finish(ctx, &sync, image, transformer).await {
        n.print();
    }
    Ok(Notification::warning("Region marked as deleted"))
}
