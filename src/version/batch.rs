//! Fetch-then-resolve for many images at once

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::version::error::RegistryError;
use crate::version::registry::TagRegistry;
use crate::version::resolver::LatestTagResolver;

/// What to do when fetching the tags of one image fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Record the failure and keep resolving the remaining images
    #[default]
    Continue,
    /// Abort the whole batch with the first failure (in input order)
    FailFast,
}

/// Outcome for a single image of a batch
#[derive(Debug)]
pub struct ImageResolution {
    pub image: String,
    /// `Ok(None)` means the image has no tag following the convention
    pub outcome: Result<Option<String>, RegistryError>,
}

impl ImageResolution {
    pub fn latest_tag(&self) -> Option<&str> {
        self.outcome.as_ref().ok().and_then(|tag| tag.as_deref())
    }

    pub fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }
}

/// Fetches and resolves one image
pub async fn resolve_image(
    registry: &dyn TagRegistry,
    resolver: &LatestTagResolver,
    image: &str,
) -> Result<Option<String>, RegistryError> {
    let tags = registry.fetch_tags(image).await?;
    debug!("Fetched {} tags for {}", tags.len(), image);
    Ok(resolver.resolve_tag(&tags))
}

/// Resolves the latest tag of every image, at most `concurrency` fetches at a time.
///
/// Results come back in the order of `images`. With [`FailurePolicy::FailFast`]
/// the first failed image is returned as [`Error::Fetch`].
pub async fn resolve_all(
    registry: &dyn TagRegistry,
    resolver: &LatestTagResolver,
    images: &[String],
    concurrency: usize,
    policy: FailurePolicy,
) -> Result<Vec<ImageResolution>, Error> {
    info!(
        "Resolving latest tags for {} images from {}",
        images.len(),
        registry.kind()
    );

    let fetches = stream::iter(images)
        .map(|image| async move {
            let outcome = resolve_image(registry, resolver, image).await;
            if let Err(e) = &outcome {
                warn!("Failed to fetch tags for {}: {}", image, e);
            }
            ImageResolution {
                image: image.clone(),
                outcome,
            }
        })
        .buffered(concurrency.max(1));

    match policy {
        FailurePolicy::Continue => Ok(fetches.collect().await),
        // No new fetch starts once an error has been yielded
        FailurePolicy::FailFast => {
            fetches
                .map(|resolution| match resolution.outcome {
                    Ok(tag) => Ok(ImageResolution {
                        image: resolution.image,
                        outcome: Ok(tag),
                    }),
                    Err(source) => Err(Error::Fetch {
                        image: resolution.image,
                        source,
                    }),
                })
                .try_collect()
                .await
        }
    }
}
