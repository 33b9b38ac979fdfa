//! Region sync tests against an in-memory backend
//!
//! Covers load dedupe, optimistic edits with rollback and the training
//! hand-off when a session ends.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use thermal_inspect::error::{InspectError, Result};
use thermal_inspect::{LoadOutcome, RegionBackend, RegionSync, TrainingStatus};
use thermal_inspect_common::layout::{Layout, Size};
use thermal_inspect_common::overlay::{list_rows, render_overlay, Tint};
use thermal_inspect_common::region::{BoxGeometry, ErrorRegion, RegionStatus};
use thermal_inspect_common::edit::BoxEditSession;
use thermal_inspect_common::types::TrainRequest;
use tokio::sync::Notify;

const NOW: &str = "2026-03-01T10:00:00.000Z";

#[derive(Default)]
struct MemoryBackend {
    regions: Mutex<HashMap<String, Vec<ErrorRegion>>>,
    fetches: AtomicUsize,
    next_id: AtomicUsize,
    fail_writes: AtomicBool,
    /// The next write parks until `release`, then fails.
    hold_next: AtomicBool,
    entered: Notify,
    release: Notify,
    trained: Mutex<Vec<TrainRequest>>,
}

impl MemoryBackend {
    fn with_regions(image_id: &str, regions: Vec<ErrorRegion>) -> Self {
        let backend = Self::default();
        backend
            .regions
            .lock()
            .unwrap()
            .insert(image_id.to_string(), regions);
        backend
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(server_error())
        } else {
            Ok(())
        }
    }

    async fn write_gate(&self) -> Result<()> {
        if self.hold_next.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
            return Err(server_error());
        }
        self.check_writes()
    }
}

fn server_error() -> InspectError {
    InspectError::Api {
        status: 500,
        message: "backend unavailable".to_string(),
    }
}

impl RegionBackend for MemoryBackend {
    fn fetch(&self, image_id: &str) -> impl Future<Output = Result<Vec<ErrorRegion>>> + Send {
        async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(self
                .regions
                .lock()
                .unwrap()
                .get(image_id)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn create(
        &self,
        image_id: &str,
        region: &ErrorRegion,
    ) -> impl Future<Output = Result<Option<ErrorRegion>>> + Send {
        async move {
            self.write_gate().await?;
            let mut saved = region.clone();
            saved.id = Some(format!("r-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1));
            self.regions
                .lock()
                .unwrap()
                .entry(image_id.to_string())
                .or_default()
                .push(saved.clone());
            Ok(Some(saved))
        }
    }

    fn update(
        &self,
        _image_id: &str,
        _region_id: &str,
        _region: &ErrorRegion,
    ) -> impl Future<Output = Result<Option<ErrorRegion>>> + Send {
        async move {
            self.write_gate().await?;
            Ok(None)
        }
    }

    fn remove(&self, _image_id: &str, _region_id: &str) -> impl Future<Output = Result<()>> + Send {
        async move { self.write_gate().await }
    }

    fn train_model(&self, request: &TrainRequest) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.trained.lock().unwrap().push(request.clone());
            Ok(())
        }
    }
}

fn saved_region(id: &str, status: RegionStatus) -> ErrorRegion {
    let mut region = ErrorRegion::with_geometry(BoxGeometry::new(0.5, 0.5, 0.2, 0.2), status);
    region.id = Some(id.to_string());
    region
}

fn pixel_box(status: RegionStatus) -> ErrorRegion {
    ErrorRegion::with_geometry(BoxGeometry::from_corner(100.0, 100.0, 50.0, 40.0), status)
}

fn train_request() -> TrainRequest {
    TrainRequest {
        transformer_id: "t-1".to_string(),
        baseline_image_id: "img-base".to_string(),
        maintenance_image_id: "img-1".to_string(),
    }
}

/// Two concurrent loads of one image issue a single fetch
#[tokio::test]
async fn test_concurrent_loads_fetch_once() {
    let backend = Arc::new(MemoryBackend::with_regions(
        "img-1",
        vec![saved_region("a", RegionStatus::Potential)],
    ));
    let sync = RegionSync::new(Arc::clone(&backend));

    let (first, second) = tokio::join!(sync.load("img-1"), sync.load("img-1"));
    let mut outcomes = vec![first.unwrap(), second.unwrap()];
    outcomes.sort_by_key(|o| matches!(o, LoadOutcome::Loaded(_)));

    assert_eq!(backend.fetch_count(), 1);
    assert_eq!(outcomes[1], LoadOutcome::Loaded(1));
    assert_eq!(outcomes[0], LoadOutcome::AlreadyLoading);

    assert_eq!(sync.load("img-1").await.unwrap(), LoadOutcome::AlreadyLoaded);
    assert_eq!(backend.fetch_count(), 1);
    assert_eq!(sync.regions("img-1")[0].image_id.as_deref(), Some("img-1"));
}

/// load_many reports each image separately and dedupes repeats
#[tokio::test]
async fn test_load_many() {
    let backend = Arc::new(MemoryBackend::with_regions(
        "img-1",
        vec![saved_region("a", RegionStatus::Faulty)],
    ));
    let sync = RegionSync::new(Arc::clone(&backend));
    let ids = vec!["img-1".to_string(), "img-2".to_string(), "img-1".to_string()];

    let results = sync.load_many(&ids).await;
    assert_eq!(results.len(), 3);
    assert_eq!(backend.fetch_count(), 2);
    assert!(results.iter().all(|(_, r)| r.is_ok()));
    assert_eq!(sync.with_store(|s| s.anomaly("img-1")).as_str(), "FAULTY");
    assert_eq!(sync.with_store(|s| s.anomaly("img-2")).as_str(), "NORMAL");
}

/// A new faulty region is saved, tinted red and marks the session edited
#[tokio::test]
async fn test_add_faulty_region() {
    let backend = Arc::new(MemoryBackend::default());
    let sync = RegionSync::new(Arc::clone(&backend));
    sync.load("img-1").await.unwrap();
    assert!(!sync.has_unsaved_edits());

    let pos = sync.add("img-1", pixel_box(RegionStatus::Faulty)).await.unwrap();
    assert_eq!(pos, 0);
    assert!(sync.has_unsaved_edits());

    let regions = sync.regions("img-1");
    assert_eq!(regions[0].id.as_deref(), Some("r-1"));

    let rows = list_rows(&regions);
    assert_eq!(rows[0].tag, "Faulty");
    assert_eq!(rows[0].tint, Tint::Red);

    let layout = Layout::compute(Size::new(800.0, 600.0), Size::new(640.0, 480.0));
    let shapes = render_overlay(&regions, &layout);
    assert_eq!(shapes.len(), 1);
    assert_eq!(shapes[0].tint, Tint::Red);
    assert_eq!(shapes[0].number, 1);
}

/// Deleting hides the region from the overlay but keeps it listed
#[tokio::test]
async fn test_delete_is_soft() {
    let backend = Arc::new(MemoryBackend::with_regions(
        "img-1",
        vec![
            saved_region("a", RegionStatus::Faulty),
            saved_region("b", RegionStatus::Potential),
        ],
    ));
    let sync = RegionSync::new(Arc::clone(&backend));
    sync.load("img-1").await.unwrap();
    assert_eq!(sync.with_store(|s| s.reportable("img-1").len()), 2);

    sync.delete("img-1", 0, NOW).await.unwrap();

    let regions = sync.regions("img-1");
    let layout = Layout::compute(Size::new(800.0, 600.0), Size::new(640.0, 480.0));
    let shapes = render_overlay(&regions, &layout);
    assert_eq!(shapes.len(), 1);
    assert_eq!(shapes[0].source, 1);
    assert_eq!(shapes[0].number, 1);

    let rows = list_rows(&regions);
    assert_eq!(rows.len(), 2);
    let deleted = rows.iter().find(|r| r.is_deleted).unwrap();
    assert_eq!(deleted.number, None);
    assert_eq!(deleted.deleted_at.as_deref(), Some(NOW));

    assert_eq!(sync.with_store(|s| s.reportable("img-1").len()), 1);
    assert_eq!(sync.with_store(|s| s.anomaly("img-1")).as_str(), "POTENTIAL");
}

/// A rejected edit restores the previous regions and edit flag
#[tokio::test]
async fn test_failed_edits_roll_back() {
    let backend = Arc::new(MemoryBackend::with_regions(
        "img-1",
        vec![saved_region("a", RegionStatus::Potential)],
    ));
    let sync = RegionSync::new(Arc::clone(&backend));
    sync.load("img-1").await.unwrap();
    backend.fail_writes.store(true, Ordering::SeqCst);

    let err = sync.add("img-1", pixel_box(RegionStatus::Faulty)).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(sync.regions("img-1").len(), 1);
    assert!(!sync.has_unsaved_edits());

    let mut changed = sync.regions("img-1")[0].clone();
    changed.status = RegionStatus::Faulty;
    assert!(sync.update("img-1", 0, changed).await.is_err());
    assert_eq!(sync.regions("img-1")[0].status, RegionStatus::Potential);

    assert!(sync.delete("img-1", 0, NOW).await.is_err());
    assert!(!sync.regions("img-1")[0].is_deleted);
    assert!(!sync.has_unsaved_edits());
}

/// A failed update leaves a delete that finished meanwhile in place
#[tokio::test]
async fn test_failed_update_keeps_concurrent_delete() {
    let backend = Arc::new(MemoryBackend::with_regions(
        "img-1",
        vec![
            saved_region("a", RegionStatus::Potential),
            saved_region("b", RegionStatus::Potential),
        ],
    ));
    let sync = RegionSync::new(Arc::clone(&backend));
    sync.load("img-1").await.unwrap();
    backend.hold_next.store(true, Ordering::SeqCst);

    let mut changed = sync.regions("img-1")[0].clone();
    changed.status = RegionStatus::Faulty;
    let (update, ()) = tokio::join!(sync.update("img-1", 0, changed), async {
        backend.entered.notified().await;
        sync.delete("img-1", 1, NOW).await.unwrap();
        backend.release.notify_one();
    });

    assert_eq!(update.unwrap_err().status(), Some(500));
    let regions = sync.regions("img-1");
    assert_eq!(regions[0].status, RegionStatus::Potential);
    assert!(regions[1].is_deleted);
    assert!(sync.has_unsaved_edits());
}

/// A failed add drops only its own draft, not one saved alongside it
#[tokio::test]
async fn test_failed_add_keeps_concurrent_add() {
    let backend = Arc::new(MemoryBackend::default());
    let sync = RegionSync::new(Arc::clone(&backend));
    sync.load("img-1").await.unwrap();
    backend.hold_next.store(true, Ordering::SeqCst);

    let (first, second) = tokio::join!(sync.add("img-1", pixel_box(RegionStatus::Faulty)), async {
        backend.entered.notified().await;
        let saved = sync.add("img-1", pixel_box(RegionStatus::Potential)).await;
        backend.release.notify_one();
        saved
    });

    assert!(first.is_err());
    assert!(second.is_ok());
    let regions = sync.regions("img-1");
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].status, RegionStatus::Potential);
    assert_eq!(regions[0].id.as_deref(), Some("r-1"));
    assert!(sync.has_unsaved_edits());
}

/// A box edit whose save is rejected can be saved again unchanged
#[tokio::test]
async fn test_rejected_box_edit_can_retry() {
    let mut region = pixel_box(RegionStatus::Potential);
    region.id = Some("a".to_string());
    let backend = Arc::new(MemoryBackend::with_regions("img-1", vec![region]));
    let sync = RegionSync::new(Arc::clone(&backend));
    sync.load("img-1").await.unwrap();

    let natural = Size::new(640.0, 480.0);
    let mut session = BoxEditSession::open(&sync.regions("img-1")[0], natural, Some("eng-01")).unwrap();
    session.nudge(30.0, 10.0);
    session.status = RegionStatus::Faulty;
    let moved = session.geometry();

    backend.fail_writes.store(true, Ordering::SeqCst);
    let edited = session.save(NOW).unwrap();
    assert!(sync.update("img-1", 0, edited).await.is_err());
    assert_eq!(sync.regions("img-1")[0].status, RegionStatus::Potential);
    assert_eq!(session.geometry(), moved);
    assert_eq!(session.status, RegionStatus::Faulty);

    backend.fail_writes.store(false, Ordering::SeqCst);
    sync.update("img-1", 0, session.save(NOW).unwrap()).await.unwrap();
    let regions = sync.regions("img-1");
    let saved = &regions[0];
    assert_eq!(saved.geometry(), moved);
    assert_eq!(saved.status, RegionStatus::Faulty);
    assert_eq!(saved.last_modified_by.as_deref(), Some("eng-01"));
}

/// Edits at an unknown position are reported without a backend call
#[tokio::test]
async fn test_update_unknown_position() {
    let backend = Arc::new(MemoryBackend::default());
    let sync = RegionSync::new(Arc::clone(&backend));
    sync.load("img-1").await.unwrap();

    let missing = sync.update("img-1", 3, pixel_box(RegionStatus::Normal)).await;
    assert!(matches!(missing, Err(InspectError::NotFound(_))));
    let missing = sync.delete("img-1", 0, NOW).await;
    assert!(matches!(missing, Err(InspectError::NotFound(_))));
    assert!(!sync.has_unsaved_edits());
}

/// Finishing an edited session queues training and reports its result
#[tokio::test]
async fn test_finish_trains_after_edits() {
    let backend = Arc::new(MemoryBackend::default());
    let sync = RegionSync::new(Arc::clone(&backend));
    sync.load("img-1").await.unwrap();
    sync.add("img-1", pixel_box(RegionStatus::Faulty)).await.unwrap();

    let task = sync.finish(true, Some(train_request())).expect("training queued");
    assert!(sync.is_closed());
    assert_eq!(task.request().maintenance_image_id, "img-1");
    assert_eq!(task.wait().await, TrainingStatus::Succeeded);
    assert_eq!(backend.trained.lock().unwrap().len(), 1);
    assert!(!sync.has_unsaved_edits());
}

/// No training without edits or with auto-train off
#[tokio::test]
async fn test_finish_without_training() {
    let backend = Arc::new(MemoryBackend::default());

    let untouched = RegionSync::new(Arc::clone(&backend));
    untouched.load("img-1").await.unwrap();
    assert!(untouched.finish(true, Some(train_request())).is_none());

    let edited = RegionSync::new(Arc::clone(&backend));
    edited.add("img-1", pixel_box(RegionStatus::Faulty)).await.unwrap();
    assert!(edited.finish(false, Some(train_request())).is_none());
    assert!(edited.has_unsaved_edits());

    assert!(backend.trained.lock().unwrap().is_empty());
}

/// Responses that arrive after close are dropped
#[tokio::test]
async fn test_closed_sync_ignores_loads() {
    let backend = Arc::new(MemoryBackend::with_regions(
        "img-1",
        vec![saved_region("a", RegionStatus::Faulty)],
    ));
    let sync = RegionSync::new(Arc::clone(&backend));
    sync.close();
    assert_eq!(sync.load("img-1").await.unwrap(), LoadOutcome::Closed);
    assert!(sync.regions("img-1").is_empty());
}
