use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use image::ImageReader;
use thermal_inspect::config::Config;
use thermal_inspect::error::{InspectError, Result as InspectResult};
use thermal_inspect::{ApiClient, RegionBackend, Session};
use thermal_inspect_common::layout::Size;
use thermal_inspect_common::region::ErrorRegion;
use thermal_inspect_common::serde_util::coerce_list;
use thermal_inspect_common::types::TrainRequest;

/// Decoded RGBA pixels plus the natural size of the source image.
pub struct DecodedImage {
    pub natural: Size,
    pub size: [usize; 2],
    pub pixels: Vec<u8>,
}

pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage> {
    let image = ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()?
        .decode()
        .context("decode image")?;
    let natural = Size::new(image.width() as f64, image.height() as f64);
    let size = [image.width() as usize, image.height() as usize];
    Ok(DecodedImage {
        natural,
        size,
        pixels: image.to_rgba8().into_raw(),
    })
}

pub fn read_image(path: &Path) -> Result<DecodedImage> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    decode_image(&bytes).with_context(|| format!("decode {}", path.display()))
}

/// Backend client from the CLI's stored config and session.
pub fn connect() -> Result<ApiClient> {
    let config = Config::load().context("load config")?;
    let session = Session::restore().context("restore session")?;
    ApiClient::from_config(&config, &session).context("create client")
}

/// Name stamped on edits: the logged-in user, then the configured name.
pub fn acting_user(config: &Config) -> String {
    Session::restore()
        .ok()
        .and_then(|s| s.user_name().map(String::from))
        .or_else(|| config.user_name.clone())
        .unwrap_or_default()
}

/// Regions kept in a JSON file next to a local image.
///
/// Saved regions get `local-N` ids; deletes are flags, like the backend.
pub struct LocalStore {
    path: Option<PathBuf>,
    regions: Mutex<Vec<ErrorRegion>>,
    next_id: AtomicUsize,
}

impl LocalStore {
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            regions: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Opens a regions file. A missing file starts empty and is created on
    /// the first save.
    pub fn open(path: &Path) -> Result<Self> {
        let regions: Vec<ErrorRegion> = if path.exists() {
            let content =
                std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            let value = serde_json::from_str(&content).with_context(|| format!("parse {}", path.display()))?;
            coerce_list(value)
        } else {
            Vec::new()
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            next_id: AtomicUsize::new(next_local_id(&regions)),
            regions: Mutex::new(regions),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn write(&self, regions: &[ErrorRegion]) -> InspectResult<()> {
        if let Some(path) = &self.path {
            std::fs::write(path, serde_json::to_string_pretty(regions)?)?;
        }
        Ok(())
    }

    /// Applies `f` to a copy and keeps it only once the file is written.
    fn edit<R>(&self, f: impl FnOnce(&mut Vec<ErrorRegion>) -> InspectResult<R>) -> InspectResult<R> {
        let mut regions = self.regions.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = regions.clone();
        let out = f(&mut next)?;
        self.write(&next)?;
        *regions = next;
        Ok(out)
    }

    fn find<'a>(regions: &'a mut [ErrorRegion], region_id: &str) -> InspectResult<&'a mut ErrorRegion> {
        regions
            .iter_mut()
            .find(|r| r.server_id() == Some(region_id))
            .ok_or_else(|| InspectError::NotFound(format!("region {}", region_id)))
    }
}

/// One past the highest `local-N` id in the file.
fn next_local_id(regions: &[ErrorRegion]) -> usize {
    regions
        .iter()
        .filter_map(|r| r.server_id()?.strip_prefix("local-")?.parse::<usize>().ok())
        .max()
        .map_or(1, |n| n + 1)
}

impl RegionBackend for LocalStore {
    fn fetch(&self, _image_id: &str) -> impl Future<Output = InspectResult<Vec<ErrorRegion>>> + Send {
        let regions = self
            .regions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        async move { Ok(regions) }
    }

    fn create(
        &self,
        _image_id: &str,
        region: &ErrorRegion,
    ) -> impl Future<Output = InspectResult<Option<ErrorRegion>>> + Send {
        let mut saved = region.clone();
        saved.id = Some(format!("local-{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        let result: InspectResult<Option<ErrorRegion>> = self.edit(|regions| {
            regions.push(saved.clone());
            Ok(Some(saved))
        });
        async move { result }
    }

    fn update(
        &self,
        _image_id: &str,
        region_id: &str,
        region: &ErrorRegion,
    ) -> impl Future<Output = InspectResult<Option<ErrorRegion>>> + Send {
        let result: InspectResult<Option<ErrorRegion>> = self.edit(|regions| {
            *Self::find(regions, region_id)? = region.clone();
            Ok(None)
        });
        async move { result }
    }

    fn remove(&self, _image_id: &str, region_id: &str) -> impl Future<Output = InspectResult<()>> + Send {
        let now = thermal_inspect::commands::now();
        let result: InspectResult<()> = self.edit(|regions| {
            Self::find(regions, region_id)?.mark_deleted(&now);
            Ok(())
        });
        async move { result }
    }

    fn train_model(&self, _request: &TrainRequest) -> impl Future<Output = InspectResult<()>> + Send {
        async move {
            Err(InspectError::Validation(
                "Model training needs an image loaded from the backend".to_string(),
            ))
        }
    }
}

/// Where the viewer's regions live.
pub enum DesktopBackend {
    Local(LocalStore),
    Remote(ApiClient),
}

impl RegionBackend for DesktopBackend {
    fn fetch(&self, image_id: &str) -> impl Future<Output = InspectResult<Vec<ErrorRegion>>> + Send {
        async move {
            match self {
                DesktopBackend::Local(store) => store.fetch(image_id).await,
                DesktopBackend::Remote(api) => api.fetch(image_id).await,
            }
        }
    }

    fn create(
        &self,
        image_id: &str,
        region: &ErrorRegion,
    ) -> impl Future<Output = InspectResult<Option<ErrorRegion>>> + Send {
        async move {
            match self {
                DesktopBackend::Local(store) => store.create(image_id, region).await,
                DesktopBackend::Remote(api) => api.create(image_id, region).await,
            }
        }
    }

    fn update(
        &self,
        image_id: &str,
        region_id: &str,
        region: &ErrorRegion,
    ) -> impl Future<Output = InspectResult<Option<ErrorRegion>>> + Send {
        async move {
            match self {
                DesktopBackend::Local(store) => store.update(image_id, region_id, region).await,
                DesktopBackend::Remote(api) => api.update(image_id, region_id, region).await,
            }
        }
    }

    fn remove(&self, image_id: &str, region_id: &str) -> impl Future<Output = InspectResult<()>> + Send {
        async move {
            match self {
                DesktopBackend::Local(store) => store.remove(image_id, region_id).await,
                DesktopBackend::Remote(api) => api.remove(image_id, region_id).await,
            }
        }
    }

    fn train_model(&self, request: &TrainRequest) -> impl Future<Output = InspectResult<()>> + Send {
        async move {
            match self {
                DesktopBackend::Local(store) => store.train_model(request).await,
                DesktopBackend::Remote(api) => api.train_model(request).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use thermal_inspect::RegionSync;
    use thermal_inspect_common::region::{BoxGeometry, RegionStatus};

    #[test]
    fn test_local_store_persists_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.json");
        let runtime = tokio::runtime::Runtime::new().unwrap();

        let store = LocalStore::open(&path).unwrap();
        let sync = RegionSync::new(Arc::new(DesktopBackend::Local(store)));
        runtime.block_on(async {
            sync.load("local").await.unwrap();
            let region = ErrorRegion::with_geometry(
                BoxGeometry::from_corner(10.0, 10.0, 40.0, 30.0),
                RegionStatus::Faulty,
            );
            let pos = sync.add("local", region).await.unwrap();
            sync.delete("local", pos, "2026-03-01T10:00:00.000Z").await.unwrap();
        });

        let reopened = LocalStore::open(&path).unwrap();
        let regions = reopened.regions.lock().unwrap().clone();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].id.as_deref(), Some("local-1"));
        assert!(regions[0].is_deleted);
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("regions.json");
        let runtime = tokio::runtime::Runtime::new().unwrap();

        let store = LocalStore::open(&path).unwrap();
        let region = ErrorRegion::with_geometry(BoxGeometry::from_corner(0.0, 0.0, 20.0, 20.0), RegionStatus::Potential);
        assert!(runtime.block_on(store.create("local", &region)).is_err());
        assert!(runtime.block_on(store.fetch("local")).unwrap().is_empty());
    }

    #[test]
    fn test_ids_continue_after_highest_local_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.json");
        std::fs::write(
            &path,
            r#"[{"id": "local-5", "cx": 10, "cy": 10, "w": 4, "h": 4},
                {"id": "local-2", "cx": 20, "cy": 20, "w": 4, "h": 4},
                {"id": "77", "cx": 30, "cy": 30, "w": 4, "h": 4}]"#,
        )
        .unwrap();
        let runtime = tokio::runtime::Runtime::new().unwrap();

        let store = LocalStore::open(&path).unwrap();
        let region = ErrorRegion::with_geometry(BoxGeometry::from_corner(0.0, 0.0, 20.0, 20.0), RegionStatus::Faulty);
        let saved = runtime.block_on(store.create("local", &region)).unwrap().unwrap();
        assert_eq!(saved.id.as_deref(), Some("local-6"));
        assert_eq!(LocalStore::open(&path).unwrap().regions.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_local_store_cannot_train() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let store = LocalStore::in_memory();
        let request = TrainRequest {
            transformer_id: "1".into(),
            baseline_image_id: "2".into(),
            maintenance_image_id: "3".into(),
        };
        let result = runtime.block_on(store.train_model(&request));
        assert!(matches!(result, Err(InspectError::Validation(_))));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_image(b"not an image").is_err());
    }
}
