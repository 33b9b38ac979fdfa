//! Explicit authentication context.
//!
//! A `Session` is populated on login and cleared on logout. The CLI keeps it
//! in a small JSON file next to the config so consecutive commands share it;
//! nothing else reads that file.

use crate::config::{Config, TOKEN_ENV};
use crate::error::{InspectError, Result};
use std::path::{Path, PathBuf};
use thermal_inspect_common::User;

#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_user(user: User) -> Self {
        Self { user: Some(user) }
    }

    /// Token-only session, e.g. from `THERMAL_TOKEN`.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self::from_user(User {
            token: token.into(),
            ..Default::default()
        })
    }

    pub fn login(&mut self, user: User) {
        self.user = Some(user);
    }

    pub fn logout(&mut self) {
        self.user = None;
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.token.as_str())
            .filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.admin)
    }

    /// Display name for provenance stamps.
    pub fn user_name(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.name.as_str())
            .filter(|n| !n.trim().is_empty())
    }

    pub fn require_token(&self) -> Result<&str> {
        self.token().ok_or(InspectError::NotAuthenticated)
    }

    pub fn session_path() -> Result<PathBuf> {
        Ok(Config::config_dir()?.join("session.json"))
    }

    /// Restores the CLI session: `THERMAL_TOKEN` first, then the session file.
    pub fn restore() -> Result<Self> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                return Ok(Self::from_token(token.trim()));
            }
        }
        Self::load_from(&Self::session_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::anonymous());
        }
        let content = std::fs::read_to_string(path)?;
        let user: User = serde_json::from_str(&content)?;
        Ok(Self::from_user(user))
    }

    pub fn persist(&self) -> Result<()> {
        self.persist_to(&Self::session_path()?)
    }

    pub fn persist_to(&self, path: &Path) -> Result<()> {
        match &self.user {
            Some(user) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, serde_json::to_string_pretty(user)?)?;
            }
            None => {
                if path.exists() {
                    std::fs::remove_file(path)?;
                }
            }
        }
        Ok(())
    }
}
