//! Background model training with an observable status.

use std::sync::Arc;

use thermal_inspect_common::types::TrainRequest;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::sync::RegionBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingStatus {
    Queued,
    Running,
    Succeeded,
    Failed(String),
}

impl TrainingStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, TrainingStatus::Succeeded | TrainingStatus::Failed(_))
    }

    pub fn label(&self) -> String {
        match self {
            TrainingStatus::Queued => "queued".to_string(),
            TrainingStatus::Running => "running".to_string(),
            TrainingStatus::Succeeded => "succeeded".to_string(),
            TrainingStatus::Failed(message) => format!("failed: {}", message),
        }
    }
}

/// A training call running on the tokio runtime.
#[derive(Debug)]
pub struct TrainingTask {
    request: TrainRequest,
    status: watch::Receiver<TrainingStatus>,
    handle: JoinHandle<()>,
}

impl TrainingTask {
    pub fn spawn<B>(backend: Arc<B>, request: TrainRequest) -> Self
    where
        B: RegionBackend + 'static,
    {
        let (tx, rx) = watch::channel(TrainingStatus::Queued);
        let body = request.clone();
        let handle = tokio::spawn(async move {
            tx.send_replace(TrainingStatus::Running);
            let status = match backend.train_model(&body).await {
                Ok(()) => {
                    tracing::info!(transformer_id = %body.transformer_id, "model training finished");
                    TrainingStatus::Succeeded
                }
                Err(e) => {
                    tracing::warn!(transformer_id = %body.transformer_id, error = %e, "model training failed");
                    TrainingStatus::Failed(e.to_string())
                }
            };
            tx.send_replace(status);
        });
        Self {
            request,
            status: rx,
            handle,
        }
    }

    pub fn request(&self) -> &TrainRequest {
        &self.request
    }

    pub fn status(&self) -> TrainingStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TrainingStatus> {
        self.status.clone()
    }

    /// Waits for a final status.
    pub async fn wait(mut self) -> TrainingStatus {
        while !self.status.borrow().is_finished() {
            if self.status.changed().await.is_err() {
                break;
            }
        }
        let last = self.status.borrow().clone();
        if last.is_finished() {
            return last;
        }
        match self.handle.await {
            Ok(()) => last,
            Err(e) => TrainingStatus::Failed(format!("training task aborted: {}", e)),
        }
    }
}
