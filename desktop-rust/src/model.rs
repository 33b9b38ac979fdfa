use std::path::PathBuf;

use thermal_inspect_common::layout::Size;
use thermal_inspect_common::types::TrainRequest;

/// What is open in the viewer.
#[derive(Debug, Clone)]
pub enum Source {
    Local { image: PathBuf, regions: Option<PathBuf> },
    Remote { image_id: String, transformer_id: Option<String> },
}

impl Source {
    /// Key of the image in the annotation working set.
    pub fn image_key(&self) -> String {
        match self {
            Source::Local { image, .. } => image.display().to_string(),
            Source::Remote { image_id, .. } => image_id.clone(),
        }
    }

    pub fn title(&self) -> String {
        match self {
            Source::Local { image, .. } => image
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| image.display().to_string()),
            Source::Remote { image_id, .. } => format!("Image {}", image_id),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub source: Option<Source>,
    pub natural: Option<Size>,
    pub selected: Option<usize>,
    /// Baseline/maintenance pair used by "Train Model" and on exit.
    pub train_request: Option<TrainRequest>,
    pub acting_user: String,
    pub auto_train: bool,
}

impl AppState {
    pub fn image_key(&self) -> Option<String> {
        self.source.as_ref().map(Source::image_key)
    }
}
