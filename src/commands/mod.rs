//! Command handlers behind the CLI.
//!
//! Each handler returns the notification to show; failures propagate as
//! [`InspectError`] and are turned into an error notification by `main`.

pub mod account;
pub mod compare;
pub mod image;
pub mod inspection;
pub mod record;
pub mod region;
pub mod transformer;

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use dialoguer::{Confirm, Password};

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::{InspectError, Result};
use crate::notify::Notification;
use crate::session::Session;
use crate::sync::RegionSync;
use crate::training::{TrainingStatus, TrainingTask};

/// Config, session and backend for one CLI invocation.
pub struct Context {
    pub config: Config,
    pub session: Session,
    api_url: Option<String>,
}

impl Context {
    pub fn new(config: Config, session: Session, api_url: Option<String>) -> Self {
        Self {
            config,
            session,
            api_url,
        }
    }

    pub fn load(api_url: Option<String>) -> Result<Self> {
        Ok(Self::new(Config::load()?, Session::restore()?, api_url))
    }

    pub fn api(&self) -> Result<ApiClient> {
        let client = match self.api_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => ApiClient::new(url, self.config.timeout())?,
            None => ApiClient::new(self.config.api_url()?, self.config.timeout())?,
        };
        Ok(client.with_session(&self.session))
    }

    pub fn region_sync(&self) -> Result<RegionSync<ApiClient>> {
        Ok(RegionSync::new(Arc::new(self.api()?)))
    }

    /// Name stamped on edits: the logged-in user, then the configured name.
    pub fn acting_user(&self) -> Option<String> {
        self.session
            .user_name()
            .map(String::from)
            .or_else(|| self.config.user_name.clone())
            .filter(|n| !n.trim().is_empty())
    }
}

pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Asks before a destructive call unless `yes` was given.
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| InspectError::Io(std::io::Error::other(e.to_string())))
}

pub fn prompt_password(given: Option<String>) -> Result<String> {
    match given {
        Some(p) => Ok(p),
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(|e| InspectError::Io(std::io::Error::other(e.to_string()))),
    }
}

pub fn cancelled() -> Notification {
    Notification::warning("Cancelled")
}

/// Waits for a training task and reports its final status.
pub async fn report_training(task: TrainingTask) -> Notification {
    let maintenance = task.request().maintenance_image_id.clone();
    println!("- Training queued for maintenance image {}", maintenance);
    match task.wait().await {
        TrainingStatus::Succeeded => Notification::success("Model training finished"),
        other => Notification::warning(format!("Model training {}", other.label())),
    }
}

/// Prints an aligned `label: value` line.
pub fn kv(label: &str, value: impl std::fmt::Display) {
    println!("  {:<18} {}", format!("{}:", label), value);
}

pub fn or_dash(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("-")
        .to_string()
}
