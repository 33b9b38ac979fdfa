use super::{cancelled, confirm, kv, or_dash, Context};
use crate::catalog::{self, InspectionCounts, TransformerFilter};
use crate::cli::{TransformerFields, TransformerPatch};
use crate::error::{InspectError, Result};
use crate::notify::Notification;
use crate::progress::with_spinner;
use thermal_inspect_common::types::Transformer;

fn print_row(t: &Transformer) {
    println!(
        "  {:<6} {:<12} {:<12} {:<14} {}",
        t.id, t.transformer_no, or_dash(Some(&t.pole_no)), or_dash(Some(&t.region)), or_dash(Some(&t.transformer_type))
    );
}

pub async fn list(ctx: &Context, search: &str, region: &str, transformer_type: &str) -> Result<Notification> {
    let api = ctx.api()?;
    let all = with_spinner("Loading transformers...", api.list_transformers()).await?;
    let filter = TransformerFilter::new(search, region, transformer_type);
    let shown = filter.apply(&all);

    println!("  {:<6} {:<12} {:<12} {:<14} TYPE", "ID", "NO", "POLE", "REGION");
    for t in &shown {
        print_row(t);
    }
    let regions = catalog::regions(&all);
    if !regions.is_empty() {
        println!("\n  Regions: {}", regions.join(", "));
    }
    Ok(Notification::success(format!("{} of {} transformers", shown.len(), all.len())))
}

pub async fn show(ctx: &Context, id: &str) -> Result<Notification> {
    let api = ctx.api()?;
    let (t, inspections) = with_spinner("Loading transformer...", async {
        let t = api.get_transformer(id).await?;
        // inspections are optional on this page
        let inspections = api.list_inspections(id).await.unwrap_or_else(|e| {
            tracing::warn!(transformer_id = id, error = %e, "could not load inspections");
            Vec::new()
        });
        Ok::<_, InspectError>((t, inspections))
    })
    .await?;

    println!("Transformer {}", t.transformer_no);
    kv("ID", &t.id);
    kv("Pole No", or_dash(Some(&t.pole_no)));
    kv("Region", or_dash(Some(&t.region)));
    kv("Type", or_dash(Some(&t.transformer_type)));
    let counts = InspectionCounts::of(&inspections);
    kv(
        "Inspections",
        format!(
            "{} (open {}, in progress {}, closed {})",
            counts.total, counts.open, counts.in_progress, counts.closed
        ),
    );
    Ok(Notification::success("Loaded"))
}

pub async fn create(ctx: &Context, fields: TransformerFields) -> Result<Notification> {
    ctx.session.require_token()?;
    if fields.no.trim().is_empty() || fields.region.trim().is_empty() {
        return Err(InspectError::Validation(
            "Transformer number and region are required".to_string(),
        ));
    }
    let body = Transformer {
        transformer_no: fields.no.trim().to_string(),
        pole_no: fields.pole.trim().to_string(),
        region: fields.region.trim().to_string(),
        transformer_type: fields.transformer_type.as_str().to_string(),
        ..Default::default()
    };
    let api = ctx.api()?;
    let created = with_spinner("Creating transformer...", api.create_transformer(&body)).await?;
    print_row(&created);
    Ok(Notification::success(format!("Transformer {} created", created.transformer_no)))
}

pub async fn update(ctx: &Context, id: &str, patch: TransformerPatch) -> Result<Notification> {
    ctx.session.require_token()?;
    let api = ctx.api()?;
    let mut t = with_spinner("Loading transformer...", api.get_transformer(id)).await?;
    if let Some(no) = patch.no {
        t.transformer_no = no.trim().to_string();
    }
    if let Some(pole) = patch.pole {
        t.pole_no = pole.trim().to_string();
    }
    if let Some(region) = patch.region {
        t.region = region.trim().to_string();
    }
    if let Some(kind) = patch.transformer_type {
        t.transformer_type = kind.as_str().to_string();
    }
    let updated = with_spinner("Saving...", api.update_transformer(id, &t)).await?;
    print_row(&updated);
    Ok(Notification::success("Transformer updated"))
}

pub async fn delete(ctx: &Context, id: &str, yes: bool) -> Result<Notification> {
    ctx.session.require_token()?;
    if !confirm(&format!("Delete transformer {}?", id), yes)? {
        return Ok(cancelled());
    }
    let api = ctx.api()?;
    with_spinner("Deleting...", api.delete_transformer(id)).await?;
    Ok(Notification::warning(format!("Transformer {} deleted", id)))
}
