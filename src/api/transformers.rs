use super::ApiClient;
use crate::error::Result;
use reqwest::Method;
use serde_json::Value;
use thermal_inspect_common::types::{Inspection, TrainRequest, Transformer};

impl ApiClient {
    pub async fn list_transformers(&self) -> Result<Vec<Transformer>> {
        self.get_list("/transformers").await
    }

    pub async fn get_transformer(&self, id: &str) -> Result<Transformer> {
        self.get_json(&format!("/transformers/{}", id)).await
    }

    pub async fn create_transformer(&self, transformer: &Transformer) -> Result<Transformer> {
        self.send_json(Method::POST, "/transformers", transformer).await
    }

    pub async fn update_transformer(&self, id: &str, transformer: &Transformer) -> Result<Transformer> {
        self.send_json(Method::PUT, &format!("/transformers/{}", id), transformer)
            .await
    }

    pub async fn delete_transformer(&self, id: &str) -> Result<()> {
        self.delete(&format!("/transformers/{}", id)).await
    }

    pub async fn list_inspections(&self, transformer_id: &str) -> Result<Vec<Inspection>> {
        self.get_list(&format!("/transformers/{}/inspections", transformer_id))
            .await
    }

    pub async fn create_inspection(&self, transformer_id: &str, inspection: &Inspection) -> Result<Inspection> {
        self.send_json(
            Method::POST,
            &format!("/transformers/{}/inspections", transformer_id),
            inspection,
        )
        .await
    }

    pub async fn delete_inspection(&self, transformer_id: &str, inspection_id: &str) -> Result<()> {
        self.delete(&format!(
            "/transformers/{}/inspections/{}",
            transformer_id, inspection_id
        ))
        .await
    }

    /// Starts model training for a baseline/maintenance pair.
    pub async fn train(&self, request: &TrainRequest) -> Result<Value> {
        self.send_json(
            Method::POST,
            &format!("/transformers/{}/train", request.transformer_id),
            request,
        )
        .await
    }
}
