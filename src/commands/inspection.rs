use super::{cancelled, confirm, or_dash, Context};
use crate::catalog::{filter_inspections, InspectionCounts};
use crate::error::Result;
use crate::notify::Notification;
use crate::progress::with_spinner;
use thermal_inspect_common::types::InspectionStatus;
use thermal_inspect_common::validation::new_inspection;

pub async fn list(ctx: &Context, transformer: &str, status: Option<InspectionStatus>) -> Result<Notification> {
    let api = ctx.api()?;
    let inspections = with_spinner("Loading inspections...", api.list_inspections(transformer)).await?;
    let counts = InspectionCounts::of(&inspections);
    println!(
        "Total {}  Open {}  In progress {}  Closed {}\n",
        counts.total, counts.open, counts.in_progress, counts.closed
    );
    println!("  {:<6} {:<12} {:<24} {:<16} CREATED", "ID", "STATUS", "TITLE", "INSPECTOR");
    let shown = filter_inspections(&inspections, status);
    for i in &shown {
        println!(
            "  {:<6} {:<12} {:<24} {:<16} {}",
            i.id,
            i.status.as_str(),
            i.title,
            i.inspector,
            or_dash(i.created_at.as_deref())
        );
    }
    Ok(Notification::success(format!("{} inspections", shown.len())))
}

pub async fn create(
    ctx: &Context,
    transformer: &str,
    title: &str,
    inspector: &str,
    notes: Option<&str>,
    status: InspectionStatus,
) -> Result<Notification> {
    let body = new_inspection(title, inspector, notes, status)?;
    ctx.session.require_token()?;
    let api = ctx.api()?;
    let created = with_spinner("Creating inspection...", api.create_inspection(transformer, &body)).await?;
    Ok(Notification::success(format!(
        "Inspection {} created ({})",
        created.title, created.id
    )))
}

pub async fn delete(ctx: &Context, transformer: &str, id: &str, yes: bool) -> Result<Notification> {
    ctx.session.require_token()?;
    if !confirm(&format!("Delete inspection {}?", id), yes)? {
        return Ok(cancelled());
    }
    let api = ctx.api()?;
    with_spinner("Deleting...", api.delete_inspection(transformer, id)).await?;
    Ok(Notification::warning(format!("Inspection {} deleted", id)))
}
