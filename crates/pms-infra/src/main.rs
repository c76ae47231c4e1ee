mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use pms_infra::{Context, DeployConfig, ProcessEnv};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pms-infra")]
#[command(about = "Synthesize the Product Management System deployment", long_about = None)]
#[command(version)]
struct Cli {
    /// Context value (key=value), may be repeated
    #[arg(short = 'c', long = "context", global = true, value_name = "KEY=VALUE")]
    context: Vec<String>,

    /// cdk.json style file with a "context" object
    #[arg(long, global = true, env = "PMS_CONTEXT_FILE", value_name = "PATH")]
    context_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every stack and write the cloud assembly
    Synth {
        /// Output directory
        #[arg(short, long, default_value = "cdk.out")]
        output: PathBuf,
    },
    /// List stacks in deployment order
    List,
    /// Print the resolved configuration as JSON
    Context,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_context(cli: &Cli) -> anyhow::Result<Context> {
    let mut context = match &cli.context_file {
        Some(path) => Context::from_file(path)?,
        None => Context::new(),
    };
    context.apply_args(&cli.context)?;
    Ok(context)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let context = load_context(&cli)?;
    let config = DeployConfig::resolve(&context, &ProcessEnv::capture());

    match cli.command {
        Commands::Synth { output } => commands::synth::handle(&config, &context, &output),
        Commands::List => commands::list::handle(&config, &context),
        Commands::Context => commands::context::handle(&config, &context),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
