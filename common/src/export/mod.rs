//! Export core modules shared by the CLI and the desktop viewer.

pub mod pdf_core;

#[cfg(feature = "excel")]
pub mod excel_core;
