//! Registry trait for fetching image tags from various backends

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;
use crate::version::types::{RegistryKind, TagRecord};

/// Trait for fetching the tags of an image from a registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TagRegistry: Send + Sync {
    /// Returns the kind of backend this implementation talks to
    fn kind(&self) -> RegistryKind;

    /// Fetches all tags for an image
    ///
    /// # Arguments
    /// * `image_name` - Repository name within the registry (e.g., "moebius/release/api")
    ///
    /// # Returns
    /// * `Ok(Vec<TagRecord>)` - Tags in the order the registry reported them; empty when the image has none
    /// * `Err(RegistryError)` - Connection failure, non-2xx status or undecodable body
    async fn fetch_tags(&self, image_name: &str) -> Result<Vec<TagRecord>, RegistryError>;
}

/// Rejects empty image names before any request is built
pub(crate) fn ensure_image_name(image_name: &str) -> Result<(), RegistryError> {
    if image_name.trim().is_empty() {
        return Err(RegistryError::EmptyImageName);
    }
    Ok(())
}
