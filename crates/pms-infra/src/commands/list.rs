use colored::Colorize;
use pms_infra::{Context, DeployConfig, orchestrate};

pub fn handle(config: &DeployConfig, context: &Context) -> anyhow::Result<()> {
    let deployment = orchestrate(config, context)?;

    for (i, stack) in deployment.app.ordered_stacks()?.into_iter().enumerate() {
        let deps: Vec<&str> = stack.dependencies().iter().map(String::as_str).collect();
        if deps.is_empty() {
            println!("{}. {}", i + 1, stack.name().bold());
        } else {
            println!(
                "{}. {} {}",
                i + 1,
                stack.name().bold(),
                format!("<- {}", deps.join(", ")).dimmed()
            );
        }
    }
    Ok(())
}
