//! Harbor repository tags API implementation

use serde::Deserialize;
use tracing::{debug, warn};

use crate::version::error::RegistryError;
use crate::version::registries::credentials::{Credentials, Endpoint};
use crate::version::registry::{TagRegistry, ensure_image_name};
use crate::version::types::{RegistryKind, TagRecord};

/// Tag object returned by the Harbor tags API
#[derive(Debug, Deserialize)]
struct HarborTag {
    name: String,
}

/// Registry implementation for Harbor, authenticating with HTTP Basic auth
pub struct HarborRegistry {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl HarborRegistry {
    pub fn new(endpoint: Endpoint) -> Result<Self, RegistryError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(crate::config::USER_AGENT)
                .danger_accept_invalid_certs(true)
                .build()?,
            base_url: endpoint.base_url,
            credentials: endpoint.credentials,
        })
    }
}

#[async_trait::async_trait]
impl TagRegistry for HarborRegistry {
    fn kind(&self) -> RegistryKind {
        RegistryKind::Harbor
    }

    async fn fetch_tags(&self, image_name: &str) -> Result<Vec<TagRecord>, RegistryError> {
        ensure_image_name(image_name)?;
        let url = format!("{}/api/repositories/{}/tags", self.base_url, image_name);
        debug!("Fetching Harbor tags: {}", url);

        let mut request = self.client.get(&url).query(&[("detail", "false")]);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Harbor returned status {}: {}", status, url);
            return Err(RegistryError::UnexpectedStatus { status, url });
        }

        let tags: Vec<HarborTag> = response.json().await.map_err(|e| {
            warn!("Failed to parse Harbor tags response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(tags
            .into_iter()
            .map(|t| TagRecord::new(image_name, t.name, RegistryKind::Harbor))
            .collect())
    }
}
