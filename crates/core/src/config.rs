use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::paths::Paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalConfig {
    #[serde(default = "default_portal_url")]
    pub url: String,
    /// Upper bound for waits on single elements (refresh control, access code field).
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,
    /// How long one staleness probe of the refresh control may take before
    /// the page is considered loaded.
    #[serde(default = "default_load_poll_timeout_ms")]
    pub load_poll_timeout_ms: u64,
    #[serde(default = "default_load_poll_interval_ms")]
    pub load_poll_interval_ms: u64,
}

fn default_portal_url() -> String {
    "https://www.wemportal.com/Web/".to_string()
}

fn default_step_timeout_secs() -> u64 {
    10
}

fn default_load_poll_timeout_ms() -> u64 {
    8000
}

fn default_load_poll_interval_ms() -> u64 {
    200
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            url: default_portal_url(),
            step_timeout_secs: default_step_timeout_secs(),
            load_poll_timeout_ms: default_load_poll_timeout_ms(),
            load_poll_interval_ms: default_load_poll_interval_ms(),
        }
    }
}

impl PortalConfig {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }

    pub fn load_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.load_poll_timeout_ms)
    }

    pub fn load_poll_interval(&self) -> Duration {
        Duration::from_millis(self.load_poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
    /// Explicit Chrome/Chromium binary. Searched on PATH when unset.
    #[serde(default)]
    pub binary: Option<String>,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_true")]
    pub disable_gpu: bool,
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_ready_timeout_secs() -> u64 {
    15
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            binary: None,
            headless: true,
            disable_gpu: true,
            extra_args: Vec::new(),
            ready_timeout_secs: default_ready_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    /// Session restarts allowed per collection after automation failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Successful collections after which the session is recycled.
    #[serde(default = "default_recycle_after")]
    pub recycle_after: u32,
}

fn default_max_retries() -> u32 {
    3
}

fn default_recycle_after() -> u32 {
    200
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            recycle_after: default_recycle_after(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExporterConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            metrics_path: default_metrics_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub exporter: ExporterConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.exporter.host, self.exporter.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.exporter.port, 8000);
        assert_eq!(cfg.exporter.metrics_path, "/metrics");
        assert_eq!(cfg.collection.max_retries, 3);
        assert_eq!(cfg.collection.recycle_after, 200);
        assert!(cfg.browser.headless);
        assert!(cfg.browser.disable_gpu);
        assert_eq!(cfg.portal.load_poll_timeout(), Duration::from_secs(8));
        assert_eq!(cfg.portal.load_poll_interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let raw = r#"{
  "exporter": { "port": 9123 },
  "collection": { "recycleAfter": 50 },
  "browser": { "binary": "/usr/bin/chromium" }
}"#;
        let cfg: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.exporter.port, 9123);
        assert_eq!(cfg.exporter.host, "0.0.0.0");
        assert_eq!(cfg.collection.recycle_after, 50);
        assert_eq!(cfg.collection.max_retries, 3);
        assert_eq!(cfg.browser.binary.as_deref(), Some("/usr/bin/chromium"));
        assert!(cfg.browser.headless);
        assert_eq!(cfg.portal.url, "https://www.wemportal.com/Web/");
        assert_eq!(cfg.bind_addr(), "0.0.0.0:9123");
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("wemportal-config-{}", std::process::id()));
        let path = dir.join("config.json");
        let mut cfg = Config::default();
        cfg.portal.step_timeout_secs = 4;
        cfg.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.portal.step_timeout_secs, 4);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
