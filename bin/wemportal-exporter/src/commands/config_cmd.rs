use std::path::Path;

use wemportal_core::Config;

/// Print the effective configuration, optionally writing it out as a starting point.
pub async fn run(config: &Config, write_to: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);

    if let Some(path) = write_to {
        if path.exists() {
            anyhow::bail!("{} already exists; not overwriting", path.display());
        }
        config.save(path)?;
        println!();
        println!("Written to {}", path.display());
    }
    Ok(())
}
