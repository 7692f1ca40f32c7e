pub mod catalog;
pub mod config_cmd;
pub mod scrape;
pub mod serve;

use std::path::Path;
use std::sync::Arc;

use wemportal_browser::{ChromeLauncher, LaunchOptions};
use wemportal_collector::{
    CollectionOrchestrator, CollectionPolicy, MetricCatalog, SessionManager, SessionSettings,
};
use wemportal_core::{Config, Credentials, Paths};

/// Explicit `--config` path, else `~/.wemportal-exporter/config.json`, else defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Paths::new())?,
    };
    Ok(config)
}

pub fn build_orchestrator(config: &Config, credentials: Credentials) -> CollectionOrchestrator {
    let paths = Paths::new();
    let options = LaunchOptions::from_config(
        &config.browser,
        config.portal.step_timeout(),
        paths.profiles_dir(),
    );
    let session = SessionManager::new(
        Arc::new(ChromeLauncher::new(options)),
        credentials,
        SessionSettings::from_config(&config.portal),
    );
    CollectionOrchestrator::new(
        session,
        Arc::new(MetricCatalog::standard()),
        CollectionPolicy::from(&config.collection),
    )
}
