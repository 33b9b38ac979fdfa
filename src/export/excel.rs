//! Maintenance history workbook (CLI side).

use crate::error::Result;
use std::path::Path;
use thermal_inspect_common::export::excel_core::generate_history_buffer;
use thermal_inspect_common::types::{MaintenanceRecord, Transformer};

pub fn generate_history(
    transformer: &Transformer,
    records: &[MaintenanceRecord],
    output_path: &Path,
) -> Result<()> {
    let buffer = generate_history_buffer(transformer, records)?;
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, buffer)?;
    Ok(())
}
