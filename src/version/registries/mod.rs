//! Registry implementations for fetching image tags

pub mod credentials;
pub mod docker_hub;
pub mod harbor;
pub mod nexus;

pub use credentials::{Credentials, Endpoint, split_credentials};
pub use docker_hub::DockerHubRegistry;
pub use harbor::HarborRegistry;
pub use nexus::NexusRegistry;

use crate::config::RegistryConfig;
use crate::error::{ConfigError, Error};
use crate::version::registry::TagRegistry;
use crate::version::types::RegistryKind;

/// Builds the registry implementation selected by the configured kind.
///
/// Configuration problems (missing or malformed URL) are reported before any
/// request is made. DockerHub ignores the URL.
pub fn create_registry(config: &RegistryConfig) -> Result<Box<dyn TagRegistry>, Error> {
    let registry: Box<dyn TagRegistry> = match config.kind {
        RegistryKind::DockerHub => Box::new(DockerHubRegistry::with_default_url()?),
        kind @ (RegistryKind::Nexus | RegistryKind::Harbor) => {
            let url = config
                .url
                .as_deref()
                .filter(|url| !url.trim().is_empty())
                .ok_or(ConfigError::MissingUrl(kind))?;
            let endpoint = split_credentials(url)?;
            if kind == RegistryKind::Nexus {
                Box::new(NexusRegistry::new(endpoint)?)
            } else {
                Box::new(HarborRegistry::new(endpoint)?)
            }
        }
    };
    Ok(registry)
}
