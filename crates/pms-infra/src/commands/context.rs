use pms_infra::{Context, DeployConfig};
use serde_json::json;

pub fn handle(config: &DeployConfig, context: &Context) -> anyhow::Result<()> {
    let report = json!({
        "config": config,
        "context": context,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
