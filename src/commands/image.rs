use std::path::Path;

use super::{or_dash, Context};
use crate::api::ImageUpload;
use crate::error::{InspectError, Result};
use crate::imaging;
use crate::notify::Notification;
use crate::progress::with_spinner;
use thermal_inspect_common::types::{EnvCondition, ImageType, Weather};
use thermal_inspect_common::validation::upload_meta;

pub async fn list(ctx: &Context, transformer: &str) -> Result<Notification> {
    let api = ctx.api()?;
    let images = with_spinner("Loading images...", api.list_images(transformer)).await?;
    println!("  {:<6} {:<12} {:<10} {:<26} FILE", "ID", "TYPE", "INSPECTION", "CREATED");
    for im in &images {
        println!(
            "  {:<6} {:<12} {:<10} {:<26} {}",
            im.id,
            im.image_type.map(|t| t.as_str()).unwrap_or("-"),
            or_dash(im.inspection_id().as_deref()),
            or_dash(im.created_at.as_deref()),
            im.display_name()
        );
    }
    Ok(Notification::success(format!("{} images", images.len())))
}

#[allow(clippy::too_many_arguments)]
pub async fn upload(
    ctx: &Context,
    transformer: &str,
    file: &Path,
    image_type: ImageType,
    uploader: Option<String>,
    inspection: Option<String>,
    weather: Option<Weather>,
    temperature_c: Option<f64>,
    humidity: Option<f64>,
    location_note: Option<String>,
) -> Result<Notification> {
    let uploader = uploader.or_else(|| ctx.acting_user()).unwrap_or_default();
    let env = EnvCondition {
        weather,
        temperature_c,
        humidity,
        location_note,
    };
    let meta = upload_meta(image_type, &uploader, file.is_file(), Some(env), inspection)?;
    if image_type == ImageType::Maintenance && meta.inspection_id.is_none() {
        tracing::warn!("maintenance image uploaded without an inspection id");
    }
    // reject files the backend could never display
    let size = imaging::natural_size_of_file(file)?;
    let upload = ImageUpload::from_path(meta, file)?;

    let api = ctx.api()?;
    let saved = with_spinner("Uploading...", api.upload_image(transformer, upload)).await?;
    Ok(Notification::success(format!(
        "Uploaded {} as image {} ({}x{})",
        saved.display_name(),
        saved.id,
        size.w,
        size.h
    )))
}

pub async fn raw(ctx: &Context, image: &str, output: &Path) -> Result<Notification> {
    let api = ctx.api()?;
    let bytes = with_spinner("Downloading...", api.image_raw(image)).await?;
    let size = imaging::natural_size(&bytes).ok();
    std::fs::write(output, &bytes)?;
    let dims = size
        .map(|s| format!(" ({}x{})", s.w, s.h))
        .unwrap_or_default();
    Ok(Notification::success(format!("Saved {}{}", output.display(), dims)))
}

pub async fn comparison(ctx: &Context, image: &str, output: &Path) -> Result<Notification> {
    let api = ctx.api()?;
    let bytes = with_spinner("Downloading comparison...", api.anomaly_comparison(image)).await?;
    if bytes.is_empty() {
        return Err(InspectError::NotFound(format!("comparison for image {}", image)));
    }
    std::fs::write(output, &bytes)?;
    Ok(Notification::success(format!("Saved {}", output.display())))
}
