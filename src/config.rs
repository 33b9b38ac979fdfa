use crate::error::{InspectError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const API_URL_ENV: &str = "THERMAL_API_URL";
pub const TOKEN_ENV: &str = "THERMAL_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL, e.g. `http://localhost:8080/api`
    pub api_url: Option<String>,
    /// Name used for annotation provenance when not logged in
    pub user_name: Option<String>,
    /// Queue model training after a session that edited regions
    pub auto_train: bool,
    pub timeout_seconds: u64,
    pub report_output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            user_name: None,
            auto_train: true,
            timeout_seconds: 30,
            report_output_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| InspectError::Config("Home directory not found".into()))?;
        Ok(home.join(".config").join("thermal-inspect"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Backend base URL without a trailing slash; the environment wins.
    pub fn api_url(&self) -> Result<String> {
        let from_env = std::env::var(API_URL_ENV).ok();
        resolve_api_url(from_env.as_deref(), self.api_url.as_deref())
    }

    pub fn set_api_url(&mut self, url: String) -> Result<()> {
        let url = url.trim().trim_end_matches('/').to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(InspectError::Config(format!(
                "API URL must start with http:// or https://: {}",
                url
            )));
        }
        self.api_url = Some(url);
        self.save()
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds.max(1))
    }

    pub fn report_dir(&self) -> PathBuf {
        self.report_output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn resolve_api_url(env: Option<&str>, configured: Option<&str>) -> Result<String> {
    env.into_iter()
        .chain(configured)
        .map(|s| s.trim().trim_end_matches('/'))
        .find(|s| !s.is_empty())
        .map(String::from)
        .ok_or(InspectError::MissingApiUrl)
}
