use super::ApiClient;
use crate::error::Result;
use reqwest::Method;
use thermal_inspect_common::types::{MaintenanceRecord, MaintenanceRecordForm};

impl ApiClient {
    /// Prefilled record form. Without `image_id` the backend picks the latest
    /// maintenance image of the inspection.
    pub async fn record_form(
        &self,
        transformer_id: &str,
        inspection_id: Option<&str>,
        image_id: Option<&str>,
    ) -> Result<MaintenanceRecordForm> {
        let mut query = Vec::new();
        if let Some(id) = inspection_id {
            query.push(format!("inspectionId={}", id));
        }
        if let Some(id) = image_id {
            query.push(format!("imageId={}", id));
        }
        let mut path = format!("/transformers/{}/maintenance-record-form", transformer_id);
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query.join("&"));
        }
        self.get_json(&path).await
    }

    pub async fn create_record(&self, transformer_id: &str, record: &MaintenanceRecord) -> Result<MaintenanceRecord> {
        self.send_json(
            Method::POST,
            &format!("/transformers/{}/maintenance-records", transformer_id),
            record,
        )
        .await
    }

    pub async fn update_record(&self, record_id: &str, record: &MaintenanceRecord) -> Result<MaintenanceRecord> {
        self.send_json(
            Method::PUT,
            &format!("/transformers/maintenance-records/{}", record_id),
            record,
        )
        .await
    }

    /// History, newest inspection first.
    pub async fn list_records(&self, transformer_id: &str) -> Result<Vec<MaintenanceRecord>> {
        let mut records: Vec<MaintenanceRecord> = self
            .get_list(&format!("/transformers/{}/maintenance-records", transformer_id))
            .await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    pub async fn get_record(&self, record_id: &str) -> Result<MaintenanceRecord> {
        self.get_json(&format!("/transformers/maintenance-records/{}", record_id))
            .await
    }
}

/// Sorts by inspection timestamp, newest first; undated records last.
pub fn sort_newest_first(records: &mut [MaintenanceRecord]) {
    records.sort_by(|a, b| match (&a.inspection_timestamp, &b.inspection_timestamp) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ts: Option<&str>) -> MaintenanceRecord {
        MaintenanceRecord {
            inspection_timestamp: ts.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_sort_newest_first() {
        let mut records = vec![
            record(Some("2025-01-01T10:00")),
            record(None),
            record(Some("2025-03-01T10:00")),
        ];
        sort_newest_first(&mut records);
        let order: Vec<_> = records.iter().map(|r| r.inspection_timestamp.clone()).collect();
        assert_eq!(
            order,
            vec![Some("2025-03-01T10:00".into()), Some("2025-01-01T10:00".into()), None]
        );
    }
}
