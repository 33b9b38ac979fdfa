//! Client-side checks run before any backend call.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::types::{
    EnvCondition, ImageType, Inspection, InspectionStatus, MaintenanceRecord, MaintenanceRecordForm,
    RecordStatus, UploadMeta,
};

pub const MIN_TITLE_LEN: usize = 3;

/// Inline message for one inspection form field, if invalid.
pub fn inspection_field_error(field: &str, value: &str) -> Option<&'static str> {
    let value = value.trim();
    match field {
        "title" if value.is_empty() => Some("Title is required"),
        "title" if value.chars().count() < MIN_TITLE_LEN => {
            Some("Title must be at least 3 characters")
        }
        "inspector" if value.is_empty() => Some("Inspector name is required"),
        _ => None,
    }
}

/// Builds a trimmed inspection payload.
pub fn new_inspection(
    title: &str,
    inspector: &str,
    notes: Option<&str>,
    status: InspectionStatus,
) -> Result<Inspection> {
    for (field, value) in [("title", title), ("inspector", inspector)] {
        if let Some(message) = inspection_field_error(field, value) {
            return Err(Error::Validation(message.to_string()));
        }
    }
    Ok(Inspection {
        title: title.trim().to_string(),
        inspector: inspector.trim().to_string(),
        notes: notes.map(str::trim).filter(|s| !s.is_empty()).map(String::from),
        status,
        ..Default::default()
    })
}

/// Builds upload metadata. Environment data is only sent for baselines,
/// which must name the weather.
pub fn upload_meta(
    image_type: ImageType,
    uploader: &str,
    has_file: bool,
    env: Option<EnvCondition>,
    inspection_id: Option<String>,
) -> Result<UploadMeta> {
    let uploader = uploader.trim();
    if uploader.is_empty() || !has_file {
        return Err(Error::Validation(
            "Select a file and enter the uploader name".to_string(),
        ));
    }
    let env_condition = match image_type {
        ImageType::Baseline => {
            let env = env.unwrap_or_default();
            if env.weather.is_none() {
                return Err(Error::Validation(
                    "Baseline requires an environment weather".to_string(),
                ));
            }
            Some(EnvCondition {
                location_note: env
                    .location_note
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
                ..env
            })
        }
        _ => None,
    };
    Ok(UploadMeta {
        image_type,
        uploader: uploader.to_string(),
        env_condition,
        inspection_id,
    })
}

/// Keeps readings where both key and value are non-blank.
pub fn readings_map(rows: &[(String, String)]) -> BTreeMap<String, String> {
    rows.iter()
        .filter(|(k, v)| !k.trim().is_empty() && !v.trim().is_empty())
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

/// Engineer input for a maintenance record.
#[derive(Debug, Clone, Default)]
pub struct RecordInput {
    pub inspector_name: String,
    pub status: Option<RecordStatus>,
    pub inspection_timestamp: Option<String>,
    pub readings: Vec<(String, String)>,
    pub recommended_action: Option<String>,
    pub additional_remarks: Option<String>,
}

impl RecordInput {
    /// Prefills from the form: existing record first, then inspection and image.
    pub fn from_form(form: &MaintenanceRecordForm) -> Self {
        let record = form.existing_record.as_ref();
        let inspection = form.inspection.as_ref();
        Self {
            inspector_name: record
                .map(|r| r.inspector_name.clone())
                .filter(|s| !s.is_empty())
                .or_else(|| inspection.map(|i| i.inspector.clone()))
                .unwrap_or_default(),
            status: record
                .and_then(|r| r.status)
                .or_else(|| form.allowed_statuses.first().copied()),
            inspection_timestamp: record
                .and_then(|r| r.inspection_timestamp.clone())
                .or_else(|| inspection.and_then(|i| i.created_at.clone()))
                .or_else(|| form.maintenance_image.as_ref().and_then(|m| m.created_at.clone())),
            readings: record
                .map(|r| {
                    r.electrical_readings
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect()
                })
                .unwrap_or_default(),
            recommended_action: record.and_then(|r| r.recommended_action.clone()),
            additional_remarks: record.and_then(|r| r.additional_remarks.clone()),
        }
    }
}

fn trimmed(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Validates input against the form and builds the record to send.
///
/// With an existing record the result carries its id (update); otherwise
/// transformer and image ids are set (create).
pub fn build_record(
    transformer_id: &str,
    form: &MaintenanceRecordForm,
    input: &RecordInput,
) -> Result<MaintenanceRecord> {
    let image = form.maintenance_image.as_ref().ok_or_else(|| {
        Error::Validation("No maintenance image selected for this record".to_string())
    })?;
    let status = input
        .status
        .ok_or_else(|| Error::Validation("Please select a status".to_string()))?;
    if !form.allowed_statuses.is_empty() && !form.allowed_statuses.contains(&status) {
        return Err(Error::Validation(format!(
            "Status {} is not allowed for this record",
            status.as_str()
        )));
    }
    let inspector_name = input.inspector_name.trim();
    if inspector_name.is_empty() {
        return Err(Error::Validation("Inspector name is required".to_string()));
    }

    let mut record = MaintenanceRecord {
        inspection_id: form.inspection.as_ref().map(|i| i.id.clone()).filter(|s| !s.is_empty()),
        inspection_timestamp: trimmed(&input.inspection_timestamp),
        inspector_name: inspector_name.to_string(),
        status: Some(status),
        electrical_readings: readings_map(&input.readings),
        recommended_action: trimmed(&input.recommended_action),
        additional_remarks: trimmed(&input.additional_remarks),
        ..Default::default()
    };
    match form.existing_record.as_ref().and_then(|r| r.id.clone()) {
        Some(id) => record.id = Some(id),
        None => {
            record.transformer_id = Some(transformer_id.to_string());
            record.maintenance_image_id = Some(image.id.clone());
        }
    }
    Ok(record)
}

/// New user request checks.
pub fn validate_new_user(name: &str, password: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation("User name is required".to_string()));
    }
    if password.is_empty() {
        return Err(Error::Validation("Password is required".to_string()));
    }
    Ok(())
}
