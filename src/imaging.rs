//! Natural size of downloaded thermal images.

use std::io::Cursor;
use std::path::Path;

use image::ImageReader;
use thermal_inspect_common::layout::Size;

use crate::error::{InspectError, Result};

/// Reads the pixel size from encoded image bytes without decoding pixels.
pub fn natural_size(bytes: &[u8]) -> Result<Size> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| InspectError::ImageDecode(e.to_string()))?;
    let (w, h) = reader
        .into_dimensions()
        .map_err(|e| InspectError::ImageDecode(e.to_string()))?;
    if w == 0 || h == 0 {
        return Err(InspectError::ImageDecode("image has zero size".to_string()));
    }
    Ok(Size::new(w as f64, h as f64))
}

pub fn natural_size_of_file(path: &Path) -> Result<Size> {
    let (w, h) = image::image_dimensions(path).map_err(|e| InspectError::ImageDecode(e.to_string()))?;
    Ok(Size::new(w as f64, h as f64))
}
