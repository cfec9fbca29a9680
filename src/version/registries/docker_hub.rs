//! DockerHub repository tags API implementation

use crate::version::error::RegistryError;
use crate::version::registry::{TagRegistry, ensure_image_name};
use crate::version::types::{RegistryKind, TagRecord};
use serde::Deserialize;
use tracing::{debug, warn};

/// Default base URL for DockerHub
const DEFAULT_BASE_URL: &str = "https://registry.hub.docker.com";

/// Number of tags requested in the single page that is fetched
const PAGE_SIZE: &str = "100";

/// Response from the DockerHub tags API
#[derive(Debug, Deserialize)]
struct DockerHubTagsResponse {
    results: Vec<DockerHubTag>,
}

#[derive(Debug, Deserialize)]
struct DockerHubTag {
    name: String,
}

/// Registry implementation for public DockerHub repositories
pub struct DockerHubRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl DockerHubRegistry {
    /// Creates a new DockerHubRegistry with a custom base URL
    pub fn new(base_url: &str) -> Result<Self, RegistryError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(crate::config::USER_AGENT)
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a new DockerHubRegistry talking to the public registry.hub.docker.com
    pub fn with_default_url() -> Result<Self, RegistryError> {
        Self::new(DEFAULT_BASE_URL)
    }

    /// Official images live under the `library/` namespace
    fn repository_path(image_name: &str) -> String {
        if image_name.contains('/') {
            image_name.to_string()
        } else {
            format!("library/{}", image_name)
        }
    }
}

#[async_trait::async_trait]
impl TagRegistry for DockerHubRegistry {
    fn kind(&self) -> RegistryKind {
        RegistryKind::DockerHub
    }

    async fn fetch_tags(&self, image_name: &str) -> Result<Vec<TagRecord>, RegistryError> {
        ensure_image_name(image_name)?;
        let url = format!(
            "{}/v2/repositories/{}/tags",
            self.base_url,
            Self::repository_path(image_name)
        );
        debug!("Fetching DockerHub tags: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("page_size", PAGE_SIZE), ("page", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("DockerHub returned status {}: {}", status, url);
            return Err(RegistryError::UnexpectedStatus { status, url });
        }

        let tags: DockerHubTagsResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse DockerHub response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(tags
            .results
            .into_iter()
            .map(|t| TagRecord::new(image_name, t.name, RegistryKind::DockerHub))
            .collect())
    }
}
