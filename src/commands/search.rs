//! `search`: list the tags of one image, or the latest tag of many

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use crate::commands::{BatchArgs, RegistryArgs, check_failures, write_line};
use crate::config::{SearchConfig, Settings};
use crate::error::{ConfigError, Error};
use crate::version::batch::resolve_all;
use crate::version::registries::create_registry;
use crate::version::registry::TagRegistry;
use crate::version::resolver::LatestTagResolver;

#[derive(Debug, Clone, Default, Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Image whose tags are listed
    #[arg(long)]
    pub name: Option<String>,

    /// File with one image name per line; prints the latest tag of each
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub name_file: Option<PathBuf>,

    #[command(flatten)]
    pub batch: BatchArgs,
}

impl SearchArgs {
    pub fn into_config(self, settings: &Settings) -> Result<SearchConfig, ConfigError> {
        let image = self
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        if image.is_none() && self.name_file.is_none() {
            return Err(ConfigError::MissingImage);
        }

        Ok(SearchConfig {
            version_prefix: self.batch.version_prefix(),
            concurrency: self.batch.concurrency(settings),
            failure_policy: self.batch.failure_policy(settings),
            registry: self.registry.into_config(settings)?,
            image,
            name_file: self.name_file,
        })
    }
}

pub async fn run(args: SearchArgs, settings: &Settings) -> Result<(), Error> {
    let config = args.into_config(settings)?;
    let registry = create_registry(&config.registry)?;
    execute(&config, registry.as_ref(), &mut std::io::stdout()).await
}

pub async fn execute(
    config: &SearchConfig,
    registry: &dyn TagRegistry,
    out: &mut impl Write,
) -> Result<(), Error> {
    match (&config.name_file, &config.image) {
        (Some(file), _) => print_latest(config, registry, &read_image_list(file)?, out).await,
        (None, Some(image)) => print_tags(config, registry, image, out).await,
        (None, None) => Err(ConfigError::MissingImage.into()),
    }
}

/// Image names from a list file: one per line, blank lines ignored
pub fn read_image_list(path: &Path) -> Result<Vec<String>, Error> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Prints every tag of `image`, narrowed to tags containing the version prefix
async fn print_tags(
    config: &SearchConfig,
    registry: &dyn TagRegistry,
    image: &str,
    out: &mut impl Write,
) -> Result<(), Error> {
    let tags = registry
        .fetch_tags(image)
        .await
        .map_err(|source| Error::Fetch {
            image: image.to_string(),
            source,
        })?;

    for record in tags.iter().filter(|record| {
        config
            .version_prefix
            .as_deref()
            .is_none_or(|prefix| record.tag.contains(prefix))
    }) {
        write_line(out, format_args!("{}", record))?;
    }
    Ok(())
}

async fn print_latest(
    config: &SearchConfig,
    registry: &dyn TagRegistry,
    images: &[String],
    out: &mut impl Write,
) -> Result<(), Error> {
    let resolver = LatestTagResolver::new(config.version_prefix.as_deref());
    let resolutions = resolve_all(
        registry,
        &resolver,
        images,
        config.concurrency,
        config.failure_policy,
    )
    .await?;

    for resolution in &resolutions {
        match &resolution.outcome {
            Ok(Some(tag)) => write_line(out, format_args!("{}:{}", resolution.image, tag))?,
            Ok(None) => write_line(
                out,
                format_args!("{}: no latest version found", resolution.image),
            )?,
            Err(e) => write_line(
                out,
                format_args!("{}: fetch failed: {}", resolution.image, e),
            )?,
        }
    }
    info!("Resolved {} images", resolutions.len());
    check_failures(&resolutions)
}
