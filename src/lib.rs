//! Thermal Inspect
//!
//! Client for the transformer thermal-inspection backend: REST access,
//! annotation sync, comparison, training and maintenance reports. The viewer
//! engine and data model live in `thermal-inspect-common`.

pub mod annotate;
pub mod api;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod compare;
pub mod config;
pub mod error;
pub mod export;
pub mod imaging;
pub mod notify;
pub mod progress;
pub mod session;
pub mod sync;
pub mod training;

pub use api::ApiClient;
pub use error::{InspectError, Result};
pub use session::Session;
pub use sync::{LoadOutcome, RegionBackend, RegionSync};
pub use training::{TrainingStatus, TrainingTask};
