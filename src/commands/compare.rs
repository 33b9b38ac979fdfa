use super::{kv, or_dash, report_training, Context};
use crate::compare::Comparison;
use crate::error::{InspectError, Result};
use crate::notify::Notification;
use crate::progress::{with_spinner, Spinner};
use crate::sync::LoadOutcome;
use thermal_inspect_common::types::TrainRequest;

use super::region::print_rows;

pub async fn show(ctx: &Context, transformer: &str, inspection: &str, index: usize) -> Result<Notification> {
    let sync = ctx.region_sync()?;
    let api = sync.backend();
    let (images, inspections) = with_spinner("Loading comparison data...", async {
        futures::try_join!(api.list_images(transformer), api.list_inspections(transformer))
    })
    .await?;
    let selected = inspections.into_iter().find(|i| i.id == inspection);
    let mut comparison = Comparison::build(&images, inspection).with_inspection(selected);
    if index > 1 && !comparison.select(index - 1) {
        return Err(InspectError::NotFound(format!("maintenance image #{}", index)));
    }

    println!("{}\n", comparison.title());
    match (&comparison.baseline, comparison.baseline_status()) {
        (Some(b), Some(status)) => kv("Baseline", format!("{} [{}]", b.display_name(), status.label())),
        _ => kv("Baseline", "none uploaded"),
    }

    // every maintenance image of the inspection loads concurrently
    let spinner = Spinner::start("Loading regions...");
    let outcomes = sync.load_many(&comparison.maintenance_ids()).await;
    drop(spinner);
    for (id, outcome) in &outcomes {
        match outcome {
            Ok(LoadOutcome::Loaded(n)) => tracing::debug!(image_id = %id, regions = n, "regions loaded"),
            Ok(_) => {}
            Err(e) => Notification::error(format!("Failed to load errors for image {}: {}", id, e)).print(),
        }
    }

    if comparison.maintenance.is_empty() {
        kv("Maintenance", "none for this inspection");
        return Ok(Notification::warning("No maintenance images for this inspection"));
    }
    sync.with_store(|store| {
        for (i, im) in comparison.maintenance.iter().enumerate() {
            let marker = if i == comparison.index() { ">" } else { " " };
            println!(
                "{} {}/{} {} {} [{}]",
                marker,
                i + 1,
                comparison.maintenance.len(),
                im.display_name(),
                or_dash(im.created_at.as_deref()),
                comparison.status_of(store, &im.id).label()
            );
        }
    });

    if let Some(current) = comparison.current() {
        println!("\nRegions of {}:", current.display_name());
        print_rows(&sync.regions(&current.id));
    }
    Ok(Notification::success("Comparison loaded"))
}

pub async fn train(
    ctx: &Context,
    transformer: &str,
    inspection: Option<&str>,
    baseline: Option<String>,
    maintenance: Option<String>,
) -> Result<Notification> {
    ctx.session.require_token()?;
    let sync = ctx.region_sync()?;
    let images = with_spinner("Loading images...", sync.backend().list_images(transformer)).await?;
    let comparison = Comparison::build(&images, inspection.unwrap_or_default());

    let baseline_image_id = baseline
        .or_else(|| comparison.baseline.as_ref().map(|b| b.id.clone()))
        .ok_or_else(|| InspectError::Validation("No baseline image to train against".to_string()))?;
    let maintenance_image_id = maintenance
        .or_else(|| comparison.current_id().map(String::from))
        .ok_or_else(|| InspectError::Validation("No maintenance image to train with".to_string()))?;

    let request = TrainRequest {
        transformer_id: transformer.to_string(),
        baseline_image_id,
        maintenance_image_id,
    };
    Ok(report_training(sync.train(request)).await)
}
