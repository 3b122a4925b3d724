use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod build;
mod commands;
mod config;
mod util;

use build::OutputFormat;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// The command to execute
    #[command(subcommand)]
    command: KbdmarkCommand,
}

#[derive(Parser)]
struct InitArgs {
    /// The directory to write kbdmark.yaml into
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser)]
struct RenderArgs {
    /// Markdown files to render
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// The path to the configuration file (defaults to ./kbdmark.yaml if present)
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Directory to write output files to (overrides the config; stdout if neither is set)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// What to write for each document
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
    format: OutputFormat,

    /// Also render documents marked `draft: true`
    #[arg(long, default_value = "false")]
    drafts: bool,
}

#[derive(Subcommand)]
enum KbdmarkCommand {
    /// Write a default kbdmark.yaml
    Init(InitArgs),

    /// Render markdown files to HTML fragments or JSON trees
    Render(RenderArgs),
}

/// Initialize tracing with the specified verbosity level.
///
/// `RUST_LOG` directives still apply on top of the chosen level.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        KbdmarkCommand::Init(args) => {
            commands::init::run(&args).await?;
        }
        KbdmarkCommand::Render(args) => {
            commands::render::run(&args).await?;
        }
    }

    Ok(())
}
