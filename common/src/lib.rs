//! Thermal Inspect Common Library
//!
//! I/O-free pieces shared by the CLI and the desktop viewer: the data model,
//! the fit/zoom/overlay viewer engine, region edit sessions, the local
//! annotation working set, form validation and report building.

pub mod annotations;
pub mod edit;
pub mod error;
pub mod export;
pub mod layout;
pub mod overlay;
pub mod region;
pub mod serde_util;
pub mod types;
pub mod validation;
pub mod viewer;
pub mod zoom;

pub use annotations::{AnnotationStore, Anomaly, LoadState, SlotId};
pub use edit::{BoxEditSession, CursorIcon, DrawSession, Handle, PropertyEdit};
pub use error::{Error, Result};
pub use layout::{Layout, Point, Rect, Size, ViewTransform};
pub use overlay::{list_rows, render_overlay, ListRow, OverlayShape};
pub use region::{BoxGeometry, ErrorRegion, RegionStatus, Units};
pub use types::{
    ImageRecord, ImageType, Inspection, InspectionStatus, MaintenanceRecord, MaintenanceRecordForm,
    RecordStatus, Transformer, User,
};
pub use viewer::Viewer;
pub use zoom::{ZoomDirection, ZoomPan};
