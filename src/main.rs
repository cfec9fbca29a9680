use std::path::PathBuf;

use clap::{Parser, Subcommand};
use image_release::commands::{release, search};
use image_release::config::Settings;

#[derive(Parser)]
#[command(name = "image-release")]
#[command(
    version,
    about = "Find the latest release tag of container images and render release manifests"
)]
struct Cli {
    /// JSON settings file; command-line flags take precedence
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write JSON logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the tags of an image, or the latest tag of every image in a list file
    Search(search::SearchArgs),
    /// Render templates with the latest image of each and optionally apply them
    Release(release::ReleaseArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = image_release::logging::init(cli.verbose, cli.log_file.as_deref())?;
    let settings = Settings::load_optional(cli.config.as_deref())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            match cli.command {
                Command::Search(args) => search::run(args, &settings).await,
                Command::Release(args) => release::run(args, &settings).await,
            }
        })?;
    Ok(())
}
