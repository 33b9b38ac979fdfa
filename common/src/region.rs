//! Anomaly regions (error boxes) and their geometry.
//!
//! A region is stored as centre + size. The backend mixes two conventions:
//! fractions of the natural image size (AI output) and absolute natural
//! pixels (manual edits). [`Units::detect`] decides per region.

use crate::layout::Size;
use crate::serde_util;
use serde::{Deserialize, Serialize};

/// Classification of an anomaly region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "Option<String>")]
pub enum RegionStatus {
    Faulty,
    #[default]
    Potential,
    Normal,
}

impl From<Option<String>> for RegionStatus {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(|s| s.trim().to_uppercase()).as_deref() {
            Some("FAULTY") | Some("RED") => RegionStatus::Faulty,
            Some("NORMAL") => RegionStatus::Normal,
            _ => RegionStatus::Potential,
        }
    }
}

impl RegionStatus {
    pub const ALL: [RegionStatus; 3] = [
        RegionStatus::Faulty,
        RegionStatus::Potential,
        RegionStatus::Normal,
    ];

    /// Wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionStatus::Faulty => "FAULTY",
            RegionStatus::Potential => "POTENTIAL",
            RegionStatus::Normal => "NORMAL",
        }
    }

    /// Short tag shown in region lists
    pub fn tag(&self) -> &'static str {
        match self {
            RegionStatus::Faulty => "Faulty",
            RegionStatus::Potential => "Potential",
            RegionStatus::Normal => "Normal",
        }
    }

    /// Label used in status pickers
    pub fn label(&self) -> &'static str {
        match self {
            RegionStatus::Faulty => "Faulty",
            RegionStatus::Potential => "Potential Faulty",
            RegionStatus::Normal => "Normal",
        }
    }

    /// Overlay colour: red for faulty, yellow otherwise.
    pub fn color_rgb(&self) -> [u8; 3] {
        match self {
            RegionStatus::Faulty => [255, 0, 0],
            _ => [255, 255, 0],
        }
    }
}

impl std::str::FromStr for RegionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FAULTY" | "F" => Ok(RegionStatus::Faulty),
            "POTENTIAL" | "P" => Ok(RegionStatus::Potential),
            "NORMAL" | "N" => Ok(RegionStatus::Normal),
            _ => Err(format!("Unknown status: {}. Use faulty, potential, or normal", s)),
        }
    }
}

impl std::fmt::Display for RegionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinate convention of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    /// All four values are fractions of the natural width/height.
    Normalized,
    /// Values are natural-image pixels.
    Absolute,
}

impl Units {
    /// Sniffs the convention: normalized when all four values lie in `[0, 1]`.
    ///
    /// Returns `None` for geometry that cannot be drawn (non-finite values or
    /// a negative size).
    pub fn detect(geometry: &BoxGeometry) -> Option<Units> {
        if !geometry.is_finite() || geometry.w < 0.0 || geometry.h < 0.0 {
            return None;
        }
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        if unit(geometry.cx) && unit(geometry.cy) && unit(geometry.w) && unit(geometry.h) {
            Some(Units::Normalized)
        } else {
            Some(Units::Absolute)
        }
    }
}

/// Centre/size geometry of a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl BoxGeometry {
    pub fn new(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self { cx, cy, w, h }
    }

    /// Builds centre/size geometry from a top-left corner and size.
    pub fn from_corner(left: f64, top: f64, w: f64, h: f64) -> Self {
        Self {
            cx: left + w / 2.0,
            cy: top + h / 2.0,
            w,
            h,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.cx.is_finite() && self.cy.is_finite() && self.w.is_finite() && self.h.is_finite()
    }

    pub fn left(&self) -> f64 {
        self.cx - self.w / 2.0
    }

    pub fn top(&self) -> f64 {
        self.cy - self.h / 2.0
    }

    /// Converts to natural-image pixels.
    pub fn to_pixels(&self, units: Units, natural: Size) -> BoxGeometry {
        match units {
            Units::Absolute => *self,
            Units::Normalized => BoxGeometry {
                cx: self.cx * natural.w,
                cy: self.cy * natural.h,
                w: self.w * natural.w,
                h: self.h * natural.h,
            },
        }
    }

    /// Detects the convention and converts to natural pixels in one step.
    pub fn resolve(&self, natural: Size) -> Option<BoxGeometry> {
        Units::detect(self).map(|units| self.to_pixels(units, natural))
    }

    pub fn scaled(&self, factor: f64) -> BoxGeometry {
        BoxGeometry {
            cx: self.cx * factor,
            cy: self.cy * factor,
            w: self.w * factor,
            h: self.h * factor,
        }
    }
}

/// Anomaly annotation attached to an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRegion {
    /// Server id; `None` for a local draft.
    #[serde(default, deserialize_with = "serde_util::opt_id")]
    pub id: Option<String>,

    /// Detector-side region id, used as a fallback id by older payloads.
    #[serde(default, deserialize_with = "serde_util::opt_id", skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,

    #[serde(default, deserialize_with = "serde_util::opt_id")]
    pub image_id: Option<String>,

    #[serde(default = "serde_util::nan", deserialize_with = "serde_util::lenient_f64")]
    pub cx: f64,
    #[serde(default = "serde_util::nan", deserialize_with = "serde_util::lenient_f64")]
    pub cy: f64,
    #[serde(default = "serde_util::nan", deserialize_with = "serde_util::lenient_f64")]
    pub w: f64,
    #[serde(default = "serde_util::nan", deserialize_with = "serde_util::lenient_f64")]
    pub h: f64,

    #[serde(default)]
    pub is_point: bool,

    #[serde(default)]
    pub status: RegionStatus,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub comment: Option<String>,

    /// Detector score in `[0, 1]`; cleared on manual edits.
    #[serde(default, deserialize_with = "serde_util::opt_f64")]
    pub confidence: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_rgb: Option<[u8; 3]>,

    #[serde(default, deserialize_with = "serde_util::provenance")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "serde_util::provenance")]
    pub last_modified_by: Option<String>,
    #[serde(default)]
    pub last_modified_at: Option<String>,

    #[serde(default)]
    pub is_manual: bool,

    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<String>,

    /// Display number; a view artifact, never sent back.
    #[serde(default, skip_serializing)]
    pub idx: Option<u32>,
}

impl Default for ErrorRegion {
    fn default() -> Self {
        Self {
            id: None,
            region_id: None,
            image_id: None,
            cx: f64::NAN,
            cy: f64::NAN,
            w: f64::NAN,
            h: f64::NAN,
            is_point: false,
            status: RegionStatus::default(),
            label: None,
            comment: None,
            confidence: None,
            color_rgb: None,
            created_by: None,
            created_at: None,
            last_modified_by: None,
            last_modified_at: None,
            is_manual: false,
            is_deleted: false,
            deleted_at: None,
            idx: None,
        }
    }
}

impl ErrorRegion {
    pub fn with_geometry(geometry: BoxGeometry, status: RegionStatus) -> Self {
        let mut region = Self {
            status,
            ..Default::default()
        };
        region.set_geometry(geometry);
        region
    }

    pub fn geometry(&self) -> BoxGeometry {
        BoxGeometry::new(self.cx, self.cy, self.w, self.h)
    }

    pub fn set_geometry(&mut self, geometry: BoxGeometry) {
        self.cx = geometry.cx;
        self.cy = geometry.cy;
        self.w = geometry.w;
        self.h = geometry.h;
    }

    /// Id used for update/delete calls (`id`, falling back to `regionId`).
    pub fn server_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.region_id.as_deref())
    }

    pub fn is_draft(&self) -> bool {
        self.server_id().is_none()
    }

    pub fn units(&self) -> Option<Units> {
        Units::detect(&self.geometry())
    }

    /// Overlay colour, honouring an explicit `colorRgb`.
    pub fn display_rgb(&self) -> [u8; 3] {
        self.color_rgb.unwrap_or_else(|| self.status.color_rgb())
    }

    /// Stamps manual-edit provenance: modifier, time, manual flag, no score.
    pub fn stamp_manual_edit(&mut self, user: &str, now: &str) {
        self.last_modified_by = Some(user.to_string());
        self.last_modified_at = Some(now.to_string());
        self.confidence = None;
        self.is_manual = true;
        self.color_rgb = Some(self.status.color_rgb());
    }

    /// Soft delete. The region stays in the working set.
    pub fn mark_deleted(&mut self, now: &str) {
        self.is_deleted = true;
        self.deleted_at = Some(now.to_string());
    }

    /// Merges the authoritative server copy over a local one.
    ///
    /// Server fields win; local geometry/status is kept only where the server
    /// omitted it.
    pub fn merge_server(&mut self, server: ErrorRegion) {
        let local = std::mem::replace(self, server);
        if !self.geometry().is_finite() {
            self.set_geometry(local.geometry());
        }
        self.id = self.id.take().or(local.id);
        self.region_id = self.region_id.take().or(local.region_id);
        self.image_id = self.image_id.take().or(local.image_id);
        self.label = self.label.take().or(local.label);
        self.comment = self.comment.take().or(local.comment);
        self.created_by = self.created_by.take().or(local.created_by);
        self.created_at = self.created_at.take().or(local.created_at);
        self.last_modified_by = self.last_modified_by.take().or(local.last_modified_by);
        self.last_modified_at = self.last_modified_at.take().or(local.last_modified_at);
        self.color_rgb = self.color_rgb.take().or(local.color_rgb);
        self.is_manual |= local.is_manual;
        self.is_point |= local.is_point;
        self.idx = local.idx;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_units_detection() {
        let normalized = BoxGeometry::new(0.5, 0.5, 0.2, 0.2);
        let absolute = BoxGeometry::new(500.0, 300.0, 80.0, 60.0);
        assert_eq!(Units::detect(&normalized), Some(Units::Normalized));
        assert_eq!(Units::detect(&absolute), Some(Units::Absolute));
    }

    #[test]
    fn test_units_detection_rejects_garbage() {
        assert_eq!(Units::detect(&BoxGeometry::new(f64::NAN, 0.5, 0.1, 0.1)), None);
        assert_eq!(Units::detect(&BoxGeometry::new(10.0, 10.0, -5.0, 4.0)), None);
        assert_eq!(Units::detect(&BoxGeometry::new(10.0, 10.0, f64::INFINITY, 4.0)), None);
    }

    #[test]
    fn test_single_value_out_of_range_means_absolute() {
        // cx is a pixel coordinate even though the size fits in [0, 1]
        let g = BoxGeometry::new(2.0, 0.5, 0.5, 0.5);
        assert_eq!(Units::detect(&g), Some(Units::Absolute));
    }

    #[test]
    fn test_to_pixels() {
        let natural = Size::new(1920.0, 1080.0);
        let g = BoxGeometry::new(0.5, 0.5, 0.2, 0.2).resolve(natural).unwrap();
        assert_eq!(g, BoxGeometry::new(960.0, 540.0, 384.0, 216.0));
        let a = BoxGeometry::new(500.0, 300.0, 80.0, 60.0).resolve(natural).unwrap();
        assert_eq!(a, BoxGeometry::new(500.0, 300.0, 80.0, 60.0));
    }

    #[test]
    fn test_status_lenient_parse() {
        let r: ErrorRegion = serde_json::from_value(json!({"status": "red"})).unwrap();
        assert_eq!(r.status, RegionStatus::Faulty);
        let r: ErrorRegion = serde_json::from_value(json!({"status": "WARM"})).unwrap();
        assert_eq!(r.status, RegionStatus::Potential);
        let r: ErrorRegion = serde_json::from_value(json!({"status": null})).unwrap();
        assert_eq!(r.status, RegionStatus::Potential);
        let r: ErrorRegion = serde_json::from_value(json!({"status": "normal"})).unwrap();
        assert_eq!(r.status, RegionStatus::Normal);
    }

    #[test]
    fn test_region_deserialize_backend_shape() {
        let json = json!({
            "id": 17,
            "imageId": 5,
            "cx": 0.4, "cy": 0.6, "w": 0.1, "h": 0.05,
            "status": "FAULTY",
            "label": "Loose joint",
            "confidence": 0.87,
            "createdBy": {"name": "AI", "id": 0},
            "lastModifiedBy": "eng-01",
            "isDeleted": false
        });
        let r: ErrorRegion = serde_json::from_value(json).expect("deserialize failed");
        assert_eq!(r.id.as_deref(), Some("17"));
        assert_eq!(r.image_id.as_deref(), Some("5"));
        assert_eq!(r.created_by.as_deref(), Some("AI"));
        assert_eq!(r.last_modified_by.as_deref(), Some("eng-01"));
        assert_eq!(r.confidence, Some(0.87));
        assert_eq!(r.units(), Some(Units::Normalized));
    }

    #[test]
    fn test_region_serialize_clears_confidence_and_skips_idx() {
        let mut r = ErrorRegion::with_geometry(BoxGeometry::new(10.0, 10.0, 30.0, 30.0), RegionStatus::Faulty);
        r.confidence = Some(0.9);
        r.idx = Some(4);
        r.stamp_manual_edit("eng-01", "2025-01-01T00:00:00Z");
        let json = serde_json::to_value(&r).unwrap();
        assert!(json["confidence"].is_null());
        assert!(json.get("idx").is_none());
        assert_eq!(json["status"], "FAULTY");
        assert_eq!(json["isManual"], true);
        assert_eq!(json["lastModifiedBy"], "eng-01");
    }

    #[test]
    fn test_server_id_falls_back_to_region_id() {
        let r: ErrorRegion = serde_json::from_value(json!({"regionId": "r-9"})).unwrap();
        assert_eq!(r.server_id(), Some("r-9"));
        assert!(!r.is_draft());
        assert!(ErrorRegion::default().is_draft());
    }

    #[test]
    fn test_merge_server_keeps_local_geometry_when_missing() {
        let mut local = ErrorRegion::with_geometry(BoxGeometry::new(100.0, 80.0, 40.0, 20.0), RegionStatus::Faulty);
        local.comment = Some("hot lug".into());
        local.is_manual = true;
        let server: ErrorRegion = serde_json::from_value(json!({
            "id": 99, "status": "FAULTY", "createdBy": "eng-02", "createdAt": "2025-03-01T10:00:00"
        }))
        .unwrap();
        local.merge_server(server);
        assert_eq!(local.id.as_deref(), Some("99"));
        assert_eq!(local.geometry(), BoxGeometry::new(100.0, 80.0, 40.0, 20.0));
        assert_eq!(local.comment.as_deref(), Some("hot lug"));
        assert_eq!(local.created_by.as_deref(), Some("eng-02"));
        assert!(local.is_manual);
    }

    #[test]
    fn test_mark_deleted() {
        let mut r = ErrorRegion::default();
        r.mark_deleted("2025-01-02T03:04:05Z");
        assert!(r.is_deleted);
        assert_eq!(r.deleted_at.as_deref(), Some("2025-01-02T03:04:05Z"));
    }
}
