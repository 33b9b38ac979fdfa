//! Local working set of regions, keyed by image id.
//!
//! Deletion is a flag, so loaded regions are never removed. The one
//! exception is a draft whose first save failed. Every entry also carries a
//! [`SlotId`] that survives position shifts, for callers that hold on to a
//! region across an await.

use std::collections::HashMap;

use crate::region::{ErrorRegion, RegionStatus};

/// Fetch state of one image's regions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Failed(String),
}

/// Overall anomaly verdict for an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    Normal,
    Potential,
    Faulty,
}

impl Anomaly {
    /// No live regions means normal; any faulty region makes the image faulty.
    pub fn from_regions(regions: &[ErrorRegion]) -> Self {
        let mut live = regions.iter().filter(|r| !r.is_deleted).peekable();
        if live.peek().is_none() {
            return Anomaly::Normal;
        }
        if live.any(|r| r.status == RegionStatus::Faulty) {
            Anomaly::Faulty
        } else {
            Anomaly::Potential
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Anomaly::Normal => "NORMAL",
            Anomaly::Potential => "POTENTIAL",
            Anomaly::Faulty => "FAULTY",
        }
    }
}

/// Stable handle to one entry of an image's region list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(u64);

#[derive(Debug, Clone, Default)]
struct ImageEntry {
    state: LoadState,
    regions: Vec<ErrorRegion>,
    slots: Vec<SlotId>,
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    images: HashMap<String, ImageEntry>,
    unsaved_edits: bool,
    next_slot: u64,
    generation: u64,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_state(&self, image_id: &str) -> LoadState {
        self.images
            .get(image_id)
            .map(|e| e.state.clone())
            .unwrap_or_default()
    }

    /// Marks an image as loading.
    ///
    /// Returns `false` when it is already loading or loaded; the caller must
    /// not issue a request in that case. Failed loads may be retried.
    pub fn begin_load(&mut self, image_id: &str) -> bool {
        let entry = self.images.entry(image_id.to_string()).or_default();
        match entry.state {
            LoadState::Loading | LoadState::Loaded => false,
            LoadState::NotLoaded | LoadState::Failed(_) => {
                entry.state = LoadState::Loading;
                true
            }
        }
    }

    /// Stores a fetched list, stamping the owning image id where missing.
    pub fn finish_load(&mut self, image_id: &str, mut regions: Vec<ErrorRegion>) {
        for r in &mut regions {
            if r.image_id.is_none() {
                r.image_id = Some(image_id.to_string());
            }
        }
        let slots = self.fresh_slots(regions.len());
        let entry = self.images.entry(image_id.to_string()).or_default();
        entry.regions = regions;
        entry.slots = slots;
        entry.state = LoadState::Loaded;
    }

    pub fn fail_load(&mut self, image_id: &str, message: impl Into<String>) {
        let entry = self.images.entry(image_id.to_string()).or_default();
        entry.state = LoadState::Failed(message.into());
    }

    /// Forgets an image so the next trigger refetches it.
    pub fn invalidate(&mut self, image_id: &str) {
        self.images.remove(image_id);
    }

    pub fn regions(&self, image_id: &str) -> &[ErrorRegion] {
        self.images
            .get(image_id)
            .map(|e| e.regions.as_slice())
            .unwrap_or(&[])
    }

    pub fn region(&self, image_id: &str, pos: usize) -> Option<&ErrorRegion> {
        self.regions(image_id).get(pos)
    }

    /// Position of the region carrying `server_id`.
    pub fn position_of(&self, image_id: &str, server_id: &str) -> Option<usize> {
        self.regions(image_id)
            .iter()
            .position(|r| r.server_id() == Some(server_id))
    }

    /// Appends a locally drafted region and returns its position.
    pub fn add_draft(&mut self, image_id: &str, region: ErrorRegion) -> usize {
        self.insert_draft(image_id, region).0
    }

    /// Like [`add_draft`](Self::add_draft), also returning the draft's slot.
    pub fn insert_draft(&mut self, image_id: &str, mut region: ErrorRegion) -> (usize, SlotId) {
        region.image_id = Some(image_id.to_string());
        let slot = self.fresh_slot();
        let entry = self.images.entry(image_id.to_string()).or_default();
        entry.regions.push(region);
        entry.slots.push(slot);
        let pos = entry.regions.len() - 1;
        self.mark_edited();
        (pos, slot)
    }

    /// Replaces the region at `pos`. Returns `false` when out of range.
    pub fn replace(&mut self, image_id: &str, pos: usize, region: ErrorRegion) -> bool {
        let Some(slot) = self.slot_mut(image_id, pos) else {
            return false;
        };
        *slot = region;
        self.mark_edited();
        true
    }

    pub fn soft_delete(&mut self, image_id: &str, pos: usize, now: &str) -> bool {
        let Some(slot) = self.slot_mut(image_id, pos) else {
            return false;
        };
        slot.mark_deleted(now);
        self.mark_edited();
        true
    }

    pub fn slot_id(&self, image_id: &str, pos: usize) -> Option<SlotId> {
        self.images.get(image_id)?.slots.get(pos).copied()
    }

    /// Current position of a slot, if it is still present.
    pub fn position_of_slot(&self, image_id: &str, slot: SlotId) -> Option<usize> {
        self.images.get(image_id)?.slots.iter().position(|s| *s == slot)
    }

    /// Puts `region` back into `slot`. Not counted as an edit.
    pub fn restore_slot(&mut self, image_id: &str, slot: SlotId, region: ErrorRegion) -> bool {
        let Some(pos) = self.position_of_slot(image_id, slot) else {
            return false;
        };
        match self.slot_mut(image_id, pos) {
            Some(current) => {
                *current = region;
                true
            }
            None => false,
        }
    }

    /// Drops a slot; later entries move up by one. Not counted as an edit.
    pub fn remove_slot(&mut self, image_id: &str, slot: SlotId) -> bool {
        let Some(pos) = self.position_of_slot(image_id, slot) else {
            return false;
        };
        let Some(entry) = self.images.get_mut(image_id) else {
            return false;
        };
        entry.regions.remove(pos);
        entry.slots.remove(pos);
        true
    }

    /// Bumped by every local edit; rollbacks leave it alone.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Merges the server's copy of a region into `slot`.
    pub fn merge_server_slot(&mut self, image_id: &str, slot: SlotId, server: ErrorRegion) -> bool {
        match self.position_of_slot(image_id, slot) {
            Some(pos) => self.merge_server(image_id, pos, server),
            None => false,
        }
    }

    /// Merges the server's copy of a region into position `pos`.
    pub fn merge_server(&mut self, image_id: &str, pos: usize, server: ErrorRegion) -> bool {
        let Some(slot) = self.slot_mut(image_id, pos) else {
            return false;
        };
        slot.merge_server(server);
        true
    }

    /// Owned copy of an image's regions.
    pub fn snapshot(&self, image_id: &str) -> Vec<ErrorRegion> {
        self.regions(image_id).to_vec()
    }

    pub fn has_unsaved_edits(&self) -> bool {
        self.unsaved_edits
    }

    pub fn set_unsaved_edits(&mut self, value: bool) {
        self.unsaved_edits = value;
    }

    pub fn anomaly(&self, image_id: &str) -> Anomaly {
        Anomaly::from_regions(self.regions(image_id))
    }

    /// Regions that count towards reports: live ones only.
    pub fn reportable(&self, image_id: &str) -> Vec<&ErrorRegion> {
        self.regions(image_id).iter().filter(|r| !r.is_deleted).collect()
    }

    fn slot_mut(&mut self, image_id: &str, pos: usize) -> Option<&mut ErrorRegion> {
        self.images.get_mut(image_id)?.regions.get_mut(pos)
    }

    fn mark_edited(&mut self) {
        self.unsaved_edits = true;
        self.generation += 1;
    }

    fn fresh_slot(&mut self) -> SlotId {
        self.next_slot += 1;
        SlotId(self.next_slot)
    }

    fn fresh_slots(&mut self, n: usize) -> Vec<SlotId> {
        (0..n).map(|_| self.fresh_slot()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::BoxGeometry;

    fn faulty() -> ErrorRegion {
        ErrorRegion::with_geometry(BoxGeometry::new(0.5, 0.5, 0.1, 0.1), RegionStatus::Faulty)
    }

    fn potential() -> ErrorRegion {
        ErrorRegion::with_geometry(BoxGeometry::new(0.2, 0.2, 0.1, 0.1), RegionStatus::Potential)
    }

    #[test]
    fn test_begin_load_only_once() {
        let mut store = AnnotationStore::new();
        assert!(store.begin_load("7"));
        assert!(!store.begin_load("7"));
        store.finish_load("7", vec![faulty()]);
        assert!(!store.begin_load("7"));
        assert_eq!(store.load_state("7"), LoadState::Loaded);
        assert_eq!(store.regions("7")[0].image_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_failed_load_can_retry() {
        let mut store = AnnotationStore::new();
        assert!(store.begin_load("7"));
        store.fail_load("7", "boom");
        assert_eq!(store.load_state("7"), LoadState::Failed("boom".into()));
        assert!(store.begin_load("7"));
    }

    #[test]
    fn test_add_draft_marks_unsaved() {
        let mut store = AnnotationStore::new();
        store.finish_load("1", vec![]);
        assert!(!store.has_unsaved_edits());
        let pos = store.add_draft("1", faulty());
        assert_eq!(pos, 0);
        assert!(store.has_unsaved_edits());
        assert_eq!(store.regions("1")[0].image_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_soft_delete_keeps_entry() {
        let mut store = AnnotationStore::new();
        store.finish_load("1", vec![faulty(), potential()]);
        assert!(store.soft_delete("1", 0, "2025-01-01T00:00:00Z"));
        assert_eq!(store.regions("1").len(), 2);
        assert!(store.regions("1")[0].is_deleted);
        assert_eq!(store.reportable("1").len(), 1);
        assert_eq!(store.anomaly("1"), Anomaly::Potential);
        assert!(!store.soft_delete("1", 9, "x"));
    }

    #[test]
    fn test_remove_slot_shifts_later_drafts() {
        let mut store = AnnotationStore::new();
        store.finish_load("1", vec![faulty()]);
        let (first_pos, first) = store.insert_draft("1", potential());
        let (_, second) = store.insert_draft("1", faulty());
        assert_eq!(first_pos, 1);

        assert!(store.remove_slot("1", first));
        assert_eq!(store.regions("1").len(), 2);
        assert_eq!(store.position_of_slot("1", second), Some(1));
        assert_eq!(store.position_of_slot("1", first), None);
        assert!(!store.remove_slot("1", first));
    }

    #[test]
    fn test_restore_slot_is_not_an_edit() {
        let mut store = AnnotationStore::new();
        store.finish_load("1", vec![faulty(), potential()]);
        let slot = store.slot_id("1", 1).unwrap();
        let before = store.region("1", 1).cloned().unwrap();
        assert!(store.soft_delete("1", 1, "2025-01-01T00:00:00Z"));
        let generation = store.generation();

        assert!(store.restore_slot("1", slot, before));
        assert!(!store.regions("1")[1].is_deleted);
        assert_eq!(store.generation(), generation);
    }

    #[test]
    fn test_reload_issues_new_slots() {
        let mut store = AnnotationStore::new();
        store.finish_load("1", vec![faulty()]);
        let old = store.slot_id("1", 0).unwrap();
        store.finish_load("1", vec![faulty()]);
        assert_ne!(store.slot_id("1", 0), Some(old));
        assert_eq!(store.slot_id("1", 1), None);
    }

    #[test]
    fn test_anomaly_from_regions() {
        assert_eq!(Anomaly::from_regions(&[]), Anomaly::Normal);
        assert_eq!(Anomaly::from_regions(&[potential()]), Anomaly::Potential);
        assert_eq!(Anomaly::from_regions(&[potential(), faulty()]), Anomaly::Faulty);
        let mut gone = faulty();
        gone.is_deleted = true;
        assert_eq!(Anomaly::from_regions(&[gone]), Anomaly::Normal);
    }

    #[test]
    fn test_position_of_server_id() {
        let mut store = AnnotationStore::new();
        let mut r = faulty();
        r.id = Some("55".into());
        store.finish_load("1", vec![potential(), r]);
        assert_eq!(store.position_of("1", "55"), Some(1));
        assert_eq!(store.position_of("1", "56"), None);
    }

    #[test]
    fn test_unknown_image_is_empty() {
        let store = AnnotationStore::new();
        assert!(store.regions("nope").is_empty());
        assert_eq!(store.load_state("nope"), LoadState::NotLoaded);
    }
}
