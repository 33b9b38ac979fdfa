//! Baseline vs maintenance comparison view model.

use chrono::{DateTime, NaiveDateTime};
use thermal_inspect_common::annotations::{AnnotationStore, Anomaly, LoadState};
use thermal_inspect_common::types::{ImageRecord, Inspection, TrainRequest};

/// Parses `createdAt`; unparseable or missing stamps sort as oldest.
fn created_millis(image: &ImageRecord) -> i64 {
    let Some(ts) = image.created_at.as_deref().map(str::trim) else {
        return 0;
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return dt.timestamp_millis();
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(ts, fmt).ok())
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0)
}

/// Sorts newest first, keeping input order among equal stamps.
pub fn sort_newest_first(images: &mut [ImageRecord]) {
    images.sort_by_key(|im| std::cmp::Reverse(created_millis(im)));
}

/// Most recent baseline image.
pub fn latest_baseline(images: &[ImageRecord]) -> Option<&ImageRecord> {
    let mut baselines: Vec<&ImageRecord> = images.iter().filter(|im| im.is_baseline()).collect();
    baselines.sort_by_key(|im| std::cmp::Reverse(created_millis(im)));
    baselines.into_iter().next()
}

/// Maintenance images of one inspection, newest first.
pub fn maintenance_for(images: &[ImageRecord], inspection_id: &str) -> Vec<ImageRecord> {
    let mut out: Vec<ImageRecord> = images
        .iter()
        .filter(|im| im.is_maintenance() && im.inspection_id().as_deref() == Some(inspection_id))
        .cloned()
        .collect();
    sort_newest_first(&mut out);
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisStatus {
    /// Baselines are never analysed.
    Disabled,
    Running,
    Done(Anomaly),
    Failed(String),
}

impl AnalysisStatus {
    pub fn label(&self) -> String {
        match self {
            AnalysisStatus::Disabled => "Analysis disabled".to_string(),
            AnalysisStatus::Running => "Analysing...".to_string(),
            AnalysisStatus::Done(anomaly) => format!("Anomaly: {}", anomaly.as_str()),
            AnalysisStatus::Failed(message) => format!("Analysis failed: {}", message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Comparison {
    pub inspection: Option<Inspection>,
    pub baseline: Option<ImageRecord>,
    pub maintenance: Vec<ImageRecord>,
    index: usize,
}

impl Comparison {
    pub fn build(images: &[ImageRecord], inspection_id: &str) -> Self {
        Self {
            inspection: None,
            baseline: latest_baseline(images).cloned(),
            maintenance: maintenance_for(images, inspection_id),
            index: 0,
        }
    }

    pub fn with_inspection(mut self, inspection: Option<Inspection>) -> Self {
        self.inspection = inspection;
        self
    }

    pub fn title(&self) -> String {
        match self.inspection.as_ref().map(|i| i.title.trim()).filter(|t| !t.is_empty()) {
            Some(title) => format!("Compare: {}", title),
            None => "Compare: Baseline vs Maintenance".to_string(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&ImageRecord> {
        self.maintenance.get(self.index)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current().map(|im| im.id.as_str())
    }

    /// Next maintenance image, wrapping to the first.
    pub fn next(&mut self) {
        let len = self.maintenance.len().max(1);
        self.index = (self.index + 1) % len;
    }

    /// Previous maintenance image, wrapping to the last.
    pub fn prev(&mut self) {
        let len = self.maintenance.len().max(1);
        self.index = (self.index + len - 1) % len;
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index < self.maintenance.len() {
            self.index = index;
            true
        } else {
            false
        }
    }

    pub fn maintenance_ids(&self) -> Vec<String> {
        self.maintenance.iter().map(|im| im.id.clone()).collect()
    }

    pub fn baseline_status(&self) -> Option<AnalysisStatus> {
        self.baseline.as_ref().map(|_| AnalysisStatus::Disabled)
    }

    /// Badge state of a maintenance image from its region load state.
    pub fn status_of(&self, store: &AnnotationStore, image_id: &str) -> AnalysisStatus {
        match store.load_state(image_id) {
            LoadState::Loaded => AnalysisStatus::Done(store.anomaly(image_id)),
            LoadState::Failed(message) => AnalysisStatus::Failed(message),
            LoadState::NotLoaded | LoadState::Loading => AnalysisStatus::Running,
        }
    }

    /// Training pairs the latest baseline with the current maintenance image.
    pub fn train_request(&self, transformer_id: &str) -> Option<TrainRequest> {
        Some(TrainRequest {
            transformer_id: transformer_id.to_string(),
            baseline_image_id: self.baseline.as_ref()?.id.clone(),
            maintenance_image_id: self.current()?.id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use thermal_inspect_common::region::{BoxGeometry, ErrorRegion, RegionStatus};

    fn image(id: u32, kind: &str, created: &str, inspection: Option<u32>) -> ImageRecord {
        let mut value = json!({"id": id, "imageType": kind, "createdAt": created});
        if let Some(i) = inspection {
            value["inspectionId"] = json!(i);
        }
        serde_json::from_value(value).unwrap()
    }

    fn fixture() -> Vec<ImageRecord> {
        vec![
            image(1, "BASELINE", "2025-01-01T00:00:00Z", None),
            image(2, "BASELINE", "2025-02-01T00:00:00Z", None),
            image(3, "MAINTENANCE", "2025-03-01T00:00:00Z", Some(9)),
            image(4, "MAINTENANCE", "2025-03-05T00:00:00Z", Some(9)),
            image(5, "MAINTENANCE", "2025-03-06T00:00:00Z", Some(8)),
        ]
    }

    #[test]
    fn test_build_picks_latest_baseline_and_inspection_images() {
        let c = Comparison::build(&fixture(), "9");
        assert_eq!(c.baseline.as_ref().map(|b| b.id.as_str()), Some("2"));
        assert_eq!(c.maintenance_ids(), vec!["4", "3"]);
        assert_eq!(c.title(), "Compare: Baseline vs Maintenance");
    }

    #[test]
    fn test_navigation_wraps() {
        let mut c = Comparison::build(&fixture(), "9");
        c.prev();
        assert_eq!(c.current_id(), Some("3"));
        c.next();
        assert_eq!(c.current_id(), Some("4"));
        assert!(!c.select(5));

        let mut empty = Comparison::build(&fixture(), "nope");
        empty.next();
        empty.prev();
        assert_eq!(empty.index(), 0);
        assert!(empty.current().is_none());
    }

    #[test]
    fn test_status_follows_load_state() {
        let c = Comparison::build(&fixture(), "9");
        let mut store = AnnotationStore::new();
        assert_eq!(c.status_of(&store, "4"), AnalysisStatus::Running);
        store.begin_load("4");
        store.finish_load(
            "4",
            vec![ErrorRegion::with_geometry(BoxGeometry::new(0.5, 0.5, 0.1, 0.1), RegionStatus::Faulty)],
        );
        assert_eq!(c.status_of(&store, "4"), AnalysisStatus::Done(Anomaly::Faulty));
        assert_eq!(c.baseline_status(), Some(AnalysisStatus::Disabled));
    }

    #[test]
    fn test_train_request_needs_both_images() {
        let c = Comparison::build(&fixture(), "9");
        let req = c.train_request("7").unwrap();
        assert_eq!(req.baseline_image_id, "2");
        assert_eq!(req.maintenance_image_id, "4");
        assert!(Comparison::build(&fixture(), "nope").train_request("7").is_none());
    }

    #[test]
    fn test_missing_timestamp_sorts_last() {
        let mut list = vec![
            image(1, "MAINTENANCE", "", Some(1)),
            image(2, "MAINTENANCE", "2025-01-01T10:00:00", Some(1)),
        ];
        sort_newest_first(&mut list);
        assert_eq!(list[0].id, "2");
    }
}
