use colored::Colorize;
use pms_infra::{Context, DeployConfig, orchestrate};
use std::path::Path;

pub fn handle(config: &DeployConfig, context: &Context, output: &Path) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("Synthesizing environment '{}'...", config.environment.name)
            .blue()
            .bold()
    );

    let deployment = orchestrate(config, context)?;
    let manifest = deployment.app.synth(output)?;
    let summary = deployment.app.summary()?;

    println!();
    for artifact in &manifest.stacks {
        let deps = if artifact.dependencies.is_empty() {
            String::new()
        } else {
            format!(" (after {})", artifact.dependencies.join(", "))
        };
        println!(
            "  {} {} {}{}",
            "■".green(),
            artifact.name.bold(),
            format!("{} resources", artifact.resource_count).dimmed(),
            deps.dimmed()
        );
    }

    println!();
    println!("  Image: {}", deployment.compute.image.to_string().cyan());
    match &deployment.compute.subscribed_email {
        Some(email) => println!("  Alarm notifications: {}", email.cyan()),
        None => println!(
            "  Alarm notifications: {}",
            "none (NOTIFICATION_EMAIL not set)".yellow()
        ),
    }

    println!();
    println!("{}", format!("✓ {}", summary).green().bold());
    println!("  {}", output.display().to_string().cyan());
    Ok(())
}
