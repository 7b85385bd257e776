use anyhow::{Context, Result};

use hostkit::app::Host;

pub async fn run_info(host: &Host) -> Result<()> {
    let json =
        serde_json::to_string_pretty(host.config()).context("Failed to serialize config")?;
    println!("{}", json);
    Ok(())
}
