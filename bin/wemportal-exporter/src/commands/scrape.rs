use tracing::info;
use wemportal_core::{Config, Credentials};

use super::build_orchestrator;
use crate::exposition;

/// One collection against a fresh session, printed to stdout.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    let credentials = Credentials::from_env()?;
    let orchestrator = build_orchestrator(config, credentials);

    let result = async {
        orchestrator.start().await?;
        let snapshot = orchestrator.collect().await?;
        exposition::render(&snapshot)
    }
    .await;

    orchestrator.shutdown().await;

    let text = result?;
    print!("{}", text);
    info!("Scrape finished");
    Ok(())
}
