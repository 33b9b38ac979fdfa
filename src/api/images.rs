use super::ApiClient;
use crate::error::{InspectError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use std::path::Path;
use thermal_inspect_common::types::{ImageRecord, UploadMeta};

/// File plus metadata for an upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub meta: UploadMeta,
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn from_path(meta: UploadMeta, path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        Ok(Self { meta, filename, bytes })
    }

    fn mime(&self) -> &'static str {
        let ext = self
            .filename
            .rsplit('.')
            .next()
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "tif" | "tiff" => "image/tiff",
            "webp" => "image/webp",
            _ => "application/octet-stream",
        }
    }

    fn into_form(self) -> Result<Form> {
        let mime = self.mime();
        let meta = Part::text(serde_json::to_string(&self.meta)?)
            .mime_str("application/json")?;
        let file = Part::bytes(self.bytes)
            .file_name(self.filename)
            .mime_str(mime)?;
        Ok(Form::new().part("meta", meta).part("file", file))
    }
}

impl ApiClient {
    pub async fn list_images(&self, transformer_id: &str) -> Result<Vec<ImageRecord>> {
        self.get_list(&format!("/transformers/{}/images", transformer_id))
            .await
    }

    /// Multipart upload: `meta` JSON part + `file` part.
    pub async fn upload_image(&self, transformer_id: &str, upload: ImageUpload) -> Result<ImageRecord> {
        if upload.bytes.is_empty() {
            return Err(InspectError::Validation("Selected file is empty".to_string()));
        }
        let form = upload.into_form()?;
        let builder = self
            .request(Method::POST, &format!("/transformers/{}/images", transformer_id))
            .multipart(form);
        let response = self.send(builder).await?;
        Self::parse_optional_json(response).await
    }

    pub async fn image_raw(&self, image_id: &str) -> Result<Vec<u8>> {
        self.get_bytes(&format!("/transformers/images/{}/raw", image_id))
            .await
    }

    pub async fn anomaly_comparison(&self, image_id: &str) -> Result<Vec<u8>> {
        self.get_bytes(&format!("/transformers/images/{}/anomaly-comparison", image_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermal_inspect_common::types::ImageType;

    fn upload(name: &str) -> ImageUpload {
        ImageUpload {
            meta: UploadMeta {
                image_type: ImageType::Maintenance,
                uploader: "eng".into(),
                env_condition: None,
                inspection_id: None,
            },
            filename: name.into(),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(upload("a.JPG").mime(), "image/jpeg");
        assert_eq!(upload("a.png").mime(), "image/png");
        assert_eq!(upload("noext").mime(), "application/octet-stream");
    }
}
