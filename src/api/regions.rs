use super::ApiClient;
use crate::error::Result;
use reqwest::Method;
use serde_json::Value;
use thermal_inspect_common::region::ErrorRegion;

/// Unwraps a `{ "data": {...} }` envelope; other payloads pass through.
fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Parses a single-region reply. Empty or non-object replies yield `None`.
fn region_from_reply(value: Value) -> Option<ErrorRegion> {
    match unwrap_data(value) {
        v @ Value::Object(_) => serde_json::from_value(v).ok(),
        _ => None,
    }
}

impl ApiClient {
    /// All regions of an image, deleted ones included.
    pub async fn list_regions(&self, image_id: &str) -> Result<Vec<ErrorRegion>> {
        self.get_list(&format!("/transformers/images/{}/errors", image_id))
            .await
    }

    /// Creates a region; returns the server's copy when it sends one back.
    pub async fn create_region(&self, image_id: &str, region: &ErrorRegion) -> Result<Option<ErrorRegion>> {
        let reply: Value = self
            .send_json(
                Method::POST,
                &format!("/transformers/images/{}/errors", image_id),
                region,
            )
            .await?;
        Ok(region_from_reply(reply))
    }

    pub async fn update_region(
        &self,
        image_id: &str,
        region_id: &str,
        region: &ErrorRegion,
    ) -> Result<Option<ErrorRegion>> {
        let reply: Value = self
            .send_json(
                Method::PUT,
                &format!("/transformers/images/{}/errors/{}", image_id, region_id),
                region,
            )
            .await?;
        Ok(region_from_reply(reply))
    }

    /// The backend keeps the row and flags it deleted.
    pub async fn delete_region(&self, image_id: &str, region_id: &str) -> Result<()> {
        self.delete(&format!("/transformers/images/{}/errors/{}", image_id, region_id))
            .await
    }
}
