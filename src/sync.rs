//! Region sync between the local working set and the backend.
//!
//! Edits are applied to the [`AnnotationStore`] first and then sent. A failed
//! call puts back only the region it changed, so overlapping edits on the
//! same image keep their results. Each image is fetched at most once while a
//! load is pending or done.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use thermal_inspect_common::annotations::{AnnotationStore, LoadState, SlotId};
use thermal_inspect_common::region::ErrorRegion;
use thermal_inspect_common::types::TrainRequest;

use crate::api::ApiClient;
use crate::error::{InspectError, Result};
use crate::training::TrainingTask;

/// Backend operations the sync layer needs.
pub trait RegionBackend: Send + Sync {
    fn fetch(&self, image_id: &str) -> impl Future<Output = Result<Vec<ErrorRegion>>> + Send;

    /// Returns the server's copy when the backend sends one.
    fn create(
        &self,
        image_id: &str,
        region: &ErrorRegion,
    ) -> impl Future<Output = Result<Option<ErrorRegion>>> + Send;

    fn update(
        &self,
        image_id: &str,
        region_id: &str,
        region: &ErrorRegion,
    ) -> impl Future<Output = Result<Option<ErrorRegion>>> + Send;

    fn remove(&self, image_id: &str, region_id: &str) -> impl Future<Output = Result<()>> + Send;

    fn train_model(&self, request: &TrainRequest) -> impl Future<Output = Result<()>> + Send;
}

impl RegionBackend for ApiClient {
    fn fetch(&self, image_id: &str) -> impl Future<Output = Result<Vec<ErrorRegion>>> + Send {
        self.list_regions(image_id)
    }

    fn create(
        &self,
        image_id: &str,
        region: &ErrorRegion,
    ) -> impl Future<Output = Result<Option<ErrorRegion>>> + Send {
        self.create_region(image_id, region)
    }

    fn update(
        &self,
        image_id: &str,
        region_id: &str,
        region: &ErrorRegion,
    ) -> impl Future<Output = Result<Option<ErrorRegion>>> + Send {
        self.update_region(image_id, region_id, region)
    }

    fn remove(&self, image_id: &str, region_id: &str) -> impl Future<Output = Result<()>> + Send {
        self.delete_region(image_id, region_id)
    }

    fn train_model(&self, request: &TrainRequest) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.train(request).await?;
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Fetched; carries the number of regions received.
    Loaded(usize),
    AlreadyLoading,
    AlreadyLoaded,
    /// The sync was closed before the response arrived; nothing was merged.
    Closed,
}

pub struct RegionSync<B> {
    backend: Arc<B>,
    store: Arc<Mutex<AnnotationStore>>,
    closed: Arc<AtomicBool>,
}

impl<B> Clone for RegionSync<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            store: Arc::clone(&self.store),
            closed: Arc::clone(&self.closed),
        }
    }
}

impl<B: RegionBackend> RegionSync<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            store: Arc::new(Mutex::new(AnnotationStore::new())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn lock(&self) -> MutexGuard<'_, AnnotationStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against the working set.
    pub fn with_store<R>(&self, f: impl FnOnce(&AnnotationStore) -> R) -> R {
        f(&self.lock())
    }

    pub fn regions(&self, image_id: &str) -> Vec<ErrorRegion> {
        self.lock().snapshot(image_id)
    }

    pub fn load_state(&self, image_id: &str) -> LoadState {
        self.lock().load_state(image_id)
    }

    pub fn has_unsaved_edits(&self) -> bool {
        self.lock().has_unsaved_edits()
    }

    /// Stops merging responses that arrive from now on.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Fetches an image's regions unless a fetch is pending or done.
    pub async fn load(&self, image_id: &str) -> Result<LoadOutcome> {
        {
            let mut store = self.lock();
            if !store.begin_load(image_id) {
                return Ok(match store.load_state(image_id) {
                    LoadState::Loading => LoadOutcome::AlreadyLoading,
                    _ => LoadOutcome::AlreadyLoaded,
                });
            }
        }
        tracing::debug!(image_id, "fetching regions");
        let result = self.backend.fetch(image_id).await;
        if self.is_closed() {
            return Ok(LoadOutcome::Closed);
        }
        let mut store = self.lock();
        match result {
            Ok(regions) => {
                let count = regions.len();
                store.finish_load(image_id, regions);
                Ok(LoadOutcome::Loaded(count))
            }
            Err(e) => {
                tracing::warn!(image_id, error = %e, "failed to load regions");
                store.fail_load(image_id, e.to_string());
                Err(e)
            }
        }
    }

    /// Loads several images concurrently; each result stands alone.
    pub async fn load_many(&self, image_ids: &[String]) -> Vec<(String, Result<LoadOutcome>)> {
        join_all(image_ids.iter().map(|id| async move {
            let outcome = self.load(id).await;
            (id.clone(), outcome)
        }))
        .await
    }

    /// Refetches an image, discarding local state.
    pub async fn reload(&self, image_id: &str) -> Result<LoadOutcome> {
        self.lock().invalidate(image_id);
        self.load(image_id).await
    }

    /// Adds a drafted region and saves it. Returns its position.
    pub async fn add(&self, image_id: &str, mut region: ErrorRegion) -> Result<usize> {
        region.image_id = Some(image_id.to_string());
        let (pos, undo) = {
            let mut store = self.lock();
            let unsaved = store.has_unsaved_edits();
            let (pos, slot) = store.insert_draft(image_id, region.clone());
            (pos, Undo::new(&store, slot, None, unsaved))
        };
        match self.backend.create(image_id, &region).await {
            Ok(server) => {
                let mut store = self.lock();
                if let (Some(server), false) = (server, self.is_closed()) {
                    store.merge_server_slot(image_id, undo.slot, server);
                }
                let pos = store.position_of_slot(image_id, undo.slot).unwrap_or(pos);
                tracing::info!(image_id, pos, "region saved");
                Ok(pos)
            }
            Err(e) => {
                self.rollback(image_id, undo);
                Err(e)
            }
        }
    }

    /// Replaces the region at `pos`. Regions never saved stay local.
    pub async fn update(&self, image_id: &str, pos: usize, region: ErrorRegion) -> Result<()> {
        let undo = {
            let mut store = self.lock();
            let unsaved = store.has_unsaved_edits();
            let (Some(previous), Some(slot)) =
                (store.region(image_id, pos).cloned(), store.slot_id(image_id, pos))
            else {
                return Err(not_found(image_id, pos));
            };
            store.replace(image_id, pos, region.clone());
            Undo::new(&store, slot, Some(previous), unsaved)
        };
        let Some(region_id) = region.server_id().map(String::from) else {
            return Ok(());
        };
        match self.backend.update(image_id, &region_id, &region).await {
            Ok(server) => {
                if let (Some(server), false) = (server, self.is_closed()) {
                    self.lock().merge_server_slot(image_id, undo.slot, server);
                }
                tracing::info!(image_id, region_id = %region_id, "region updated");
                Ok(())
            }
            Err(e) => {
                self.rollback(image_id, undo);
                Err(e)
            }
        }
    }

    /// Soft-deletes the region at `pos`.
    pub async fn delete(&self, image_id: &str, pos: usize, now: &str) -> Result<()> {
        let (undo, region_id) = {
            let mut store = self.lock();
            let unsaved = store.has_unsaved_edits();
            let (Some(previous), Some(slot)) =
                (store.region(image_id, pos).cloned(), store.slot_id(image_id, pos))
            else {
                return Err(not_found(image_id, pos));
            };
            let region_id = previous.server_id().map(String::from);
            store.soft_delete(image_id, pos, now);
            (Undo::new(&store, slot, Some(previous), unsaved), region_id)
        };
        let Some(region_id) = region_id else {
            return Ok(());
        };
        match self.backend.remove(image_id, &region_id).await {
            Ok(()) => {
                tracing::info!(image_id, region_id = %region_id, "region deleted");
                Ok(())
            }
            Err(e) => {
                self.rollback(image_id, undo);
                Err(e)
            }
        }
    }

    /// Reverts the one slot a failed call touched.
    ///
    /// The unsaved flag is restored only when no other edit landed since.
    fn rollback(&self, image_id: &str, undo: Undo) {
        if self.is_closed() {
            return;
        }
        tracing::warn!(image_id, "backend rejected edit, restoring region");
        let mut store = self.lock();
        let untouched = store.generation() == undo.generation;
        match undo.previous {
            Some(previous) => store.restore_slot(image_id, undo.slot, previous),
            None => store.remove_slot(image_id, undo.slot),
        };
        if untouched {
            store.set_unsaved_edits(undo.unsaved);
        }
    }
}

/// What a failed edit has to put back.
struct Undo {
    slot: SlotId,
    /// `None` for a new draft, which is removed instead.
    previous: Option<ErrorRegion>,
    unsaved: bool,
    generation: u64,
}

impl Undo {
    fn new(store: &AnnotationStore, slot: SlotId, previous: Option<ErrorRegion>, unsaved: bool) -> Self {
        Self {
            slot,
            previous,
            unsaved,
            generation: store.generation(),
        }
    }
}

fn not_found(image_id: &str, pos: usize) -> InspectError {
    InspectError::NotFound(format!("region #{} of image {}", pos + 1, image_id))
}

impl<B: RegionBackend + 'static> RegionSync<B> {
    /// Ends the session. Queues training when enabled and regions were edited.
    pub fn finish(&self, auto_train: bool, request: Option<TrainRequest>) -> Option<TrainingTask> {
        self.close();
        if !auto_train || !self.has_unsaved_edits() {
            return None;
        }
        let Some(request) = request else {
            tracing::warn!("regions were edited but no baseline/maintenance pair is known; skipping training");
            return None;
        };
        self.lock().set_unsaved_edits(false);
        Some(TrainingTask::spawn(Arc::clone(&self.backend), request))
    }

    /// Starts training now, whatever the edit state.
    pub fn train(&self, request: TrainRequest) -> TrainingTask {
        self.lock().set_unsaved_edits(false);
        TrainingTask::spawn(Arc::clone(&self.backend), request)
    }
}
