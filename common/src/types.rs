//! Backend record types
//!
//! Shared by the CLI, the desktop viewer and the report exporters:
//! - Transformer / Inspection: plain CRUD records
//! - ImageRecord / UploadMeta: thermal images and their upload metadata
//! - MaintenanceRecord / MaintenanceRecordForm: engineer reports
//! - User: authenticated identity

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::serde_util;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transformer {
    #[serde(deserialize_with = "serde_util::id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub transformer_no: String,
    pub pole_no: String,
    pub region: String,
    /// `BULK` or `DISTRIBUTION`, kept as text for lenient filtering.
    pub transformer_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformerType {
    Bulk,
    Distribution,
}

impl TransformerType {
    pub const ALL: [TransformerType; 2] = [TransformerType::Bulk, TransformerType::Distribution];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformerType::Bulk => "BULK",
            TransformerType::Distribution => "DISTRIBUTION",
        }
    }
}

impl std::str::FromStr for TransformerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BULK" => Ok(TransformerType::Bulk),
            "DISTRIBUTION" => Ok(TransformerType::Distribution),
            _ => Err(format!("Unknown transformer type: {}. Use bulk or distribution", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

impl InspectionStatus {
    pub const ALL: [InspectionStatus; 3] = [
        InspectionStatus::Open,
        InspectionStatus::InProgress,
        InspectionStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionStatus::Open => "OPEN",
            InspectionStatus::InProgress => "IN_PROGRESS",
            InspectionStatus::Closed => "CLOSED",
        }
    }
}

impl std::str::FromStr for InspectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "OPEN" => Ok(InspectionStatus::Open),
            "IN_PROGRESS" => Ok(InspectionStatus::InProgress),
            "CLOSED" => Ok(InspectionStatus::Closed),
            _ => Err(format!("Unknown inspection status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Inspection {
    #[serde(deserialize_with = "serde_util::id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(deserialize_with = "serde_util::opt_id", skip_serializing_if = "Option::is_none")]
    pub transformer_id: Option<String>,
    pub title: String,
    pub inspector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: InspectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageType {
    Baseline,
    Maintenance,
    #[serde(other)]
    Other,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Baseline => "BASELINE",
            ImageType::Maintenance => "MAINTENANCE",
            ImageType::Other => "OTHER",
        }
    }
}

impl std::str::FromStr for ImageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BASELINE" => Ok(ImageType::Baseline),
            "MAINTENANCE" => Ok(ImageType::Maintenance),
            _ => Err(format!("Unknown image type: {}. Use baseline or maintenance", s)),
        }
    }
}

/// Image listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    #[serde(default, deserialize_with = "serde_util::id")]
    pub id: String,
    #[serde(default)]
    pub image_type: Option<ImageType>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Everything else, including the inspection linkage in its various spellings.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Keys that may carry the owning inspection id, in lookup order.
const INSPECTION_ID_KEYS: [&str; 3] = ["inspectionId", "inspection_id", "inspectionID"];

impl ImageRecord {
    pub fn is_baseline(&self) -> bool {
        self.image_type == Some(ImageType::Baseline)
    }

    pub fn is_maintenance(&self) -> bool {
        self.image_type == Some(ImageType::Maintenance)
    }

    /// Owning inspection id, whichever spelling the backend used.
    pub fn inspection_id(&self) -> Option<String> {
        let direct = INSPECTION_ID_KEYS
            .iter()
            .find_map(|k| self.extra.get(*k).and_then(serde_util::value_to_id));
        direct
            .or_else(|| {
                self.extra
                    .get("inspection")
                    .and_then(|v| v.get("id"))
                    .and_then(serde_util::value_to_id)
            })
            .or_else(|| {
                let meta = self.extra.get("meta")?;
                meta.get("inspectionId")
                    .or_else(|| meta.get("inspection_id"))
                    .and_then(serde_util::value_to_id)
            })
    }

    pub fn display_name(&self) -> String {
        self.filename
            .clone()
            .unwrap_or_else(|| format!("image-{}", self.id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Weather {
    Sunny,
    Cloudy,
    Rainy,
}

impl std::str::FromStr for Weather {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SUNNY" => Ok(Weather::Sunny),
            "CLOUDY" => Ok(Weather::Cloudy),
            "RAINY" => Ok(Weather::Rainy),
            _ => Err(format!("Unknown weather: {}. Use sunny, cloudy, or rainy", s)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvCondition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<Weather>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_note: Option<String>,
}

/// JSON `meta` part of an image upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMeta {
    pub image_type: ImageType,
    pub uploader: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_condition: Option<EnvCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspection_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Ok,
    NeedsMaintenance,
    UrgentAttention,
}

impl RecordStatus {
    pub const ALL: [RecordStatus; 3] = [
        RecordStatus::Ok,
        RecordStatus::NeedsMaintenance,
        RecordStatus::UrgentAttention,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Ok => "OK",
            RecordStatus::NeedsMaintenance => "NEEDS_MAINTENANCE",
            RecordStatus::UrgentAttention => "URGENT_ATTENTION",
        }
    }

    /// Label used in history listings and reports.
    pub fn label(&self) -> &'static str {
        match self {
            RecordStatus::Ok => "Operational",
            RecordStatus::NeedsMaintenance => "Maintenance Required",
            RecordStatus::UrgentAttention => "Urgent Attention",
        }
    }

    /// Label used in the record form.
    pub fn form_label(&self) -> &'static str {
        match self {
            RecordStatus::Ok => "OK",
            RecordStatus::NeedsMaintenance => "Needs Maintenance",
            RecordStatus::UrgentAttention => "Urgent Attention",
        }
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "OK" => Ok(RecordStatus::Ok),
            "NEEDS_MAINTENANCE" => Ok(RecordStatus::NeedsMaintenance),
            "URGENT_ATTENTION" => Ok(RecordStatus::UrgentAttention),
            _ => Err(format!("Unknown record status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaintenanceRecord {
    #[serde(deserialize_with = "serde_util::opt_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "serde_util::opt_id", skip_serializing_if = "Option::is_none")]
    pub transformer_id: Option<String>,
    #[serde(deserialize_with = "serde_util::opt_id")]
    pub inspection_id: Option<String>,
    #[serde(deserialize_with = "serde_util::opt_id", skip_serializing_if = "Option::is_none")]
    pub maintenance_image_id: Option<String>,
    pub inspection_timestamp: Option<String>,
    pub inspector_name: String,
    pub status: Option<RecordStatus>,
    #[serde(deserialize_with = "serde_util::string_map")]
    pub electrical_readings: BTreeMap<String, String>,
    pub recommended_action: Option<String>,
    pub additional_remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl MaintenanceRecord {
    pub fn status_label(&self) -> &'static str {
        self.status.map(|s| s.label()).unwrap_or("-")
    }
}

/// Anomaly summary row of a record form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormAnomaly {
    #[serde(deserialize_with = "serde_util::opt_id")]
    pub db_id: Option<String>,
    #[serde(deserialize_with = "serde_util::opt_id")]
    pub region_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub tag: Option<String>,
    pub bounding_box: Option<FormBoundingBox>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormBoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Prefilled record form returned by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaintenanceRecordForm {
    pub transformer: Option<Transformer>,
    pub inspection: Option<Inspection>,
    pub maintenance_image: Option<ImageRecord>,
    pub anomalies: Vec<FormAnomaly>,
    pub existing_record: Option<MaintenanceRecord>,
    pub allowed_statuses: Vec<RecordStatus>,
}

/// Authenticated identity returned by login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub token: String,
    #[serde(deserialize_with = "serde_util::id")]
    pub id: String,
    pub name: String,
    pub occupation: Option<String>,
    pub admin: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainRequest {
    pub transformer_id: String,
    pub baseline_image_id: String,
    pub maintenance_image_id: String,
}
