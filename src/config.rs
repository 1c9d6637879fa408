use crate::error::{CheckerError, Result};
use metric_checker_common::api::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// ベースURLを上書きする環境変数
pub const BASE_URL_ENV: &str = "METRIC_CHECKER_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
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

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CheckerError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("metric-checker").join("config.json"))
    }

    /// 実際に使うベースURL（環境変数を優先）
    pub fn api_base_url(&self) -> String {
        Self::resolve_base_url(std::env::var(BASE_URL_ENV).ok(), &self.base_url)
    }

    fn resolve_base_url(env_value: Option<String>, configured: &str) -> String {
        match env_value {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => configured.to_string(),
        }
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        self.base_url = Self::checked_url(&url)?;
        self.save()
    }

    fn checked_url(url: &str) -> Result<String> {
        let url = url.trim();
        if url.starts_with("http://") || url.starts_with("https://") {
            Ok(url.trim_end_matches('/').to_string())
        } else {
            Err(CheckerError::Config(format!(
                "URLは http:// または https:// で始めてください: {}",
                url
            )))
        }
    }
}
