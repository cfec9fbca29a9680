//! Sonatype Nexus search API implementation

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::header::{COOKIE, SET_COOKIE};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::version::error::RegistryError;
use crate::version::registries::credentials::{Credentials, Endpoint};
use crate::version::registry::{TagRegistry, ensure_image_name};
use crate::version::types::{RegistryKind, TagRecord};

/// Response from the Nexus component search API
#[derive(Debug, Deserialize)]
struct NexusSearchResponse {
    items: Vec<NexusComponent>,
}

#[derive(Debug, Deserialize)]
struct NexusComponent {
    version: String,
}

/// Registry implementation for Nexus docker repositories
///
/// When credentials are configured, every fetch first logs in through the
/// rapture session endpoint and sends the returned session cookie along with
/// the search request.
pub struct NexusRegistry {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl NexusRegistry {
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

    /// Logs in and returns the session cookie to send with subsequent requests
    async fn login(&self, credentials: &Credentials) -> Result<String, RegistryError> {
        let url = format!("{}/service/rapture/session", self.base_url);
        let form = [
            ("username", BASE64.encode(credentials.username.as_bytes())),
            ("password", BASE64.encode(credentials.password.as_bytes())),
        ];

        let response = self.client.post(&url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Nexus login returned status {}: {}", status, url);
            return Err(RegistryError::LoginFailed { status });
        }

        let cookie = session_cookie(response.headers());
        if cookie.is_empty() {
            warn!("Nexus login did not return a session cookie");
        }
        Ok(cookie)
    }
}

/// Joins the `name=value` pairs of all Set-Cookie headers into a Cookie header value
fn session_cookie(headers: &reqwest::header::HeaderMap) -> String {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait::async_trait]
impl TagRegistry for NexusRegistry {
    fn kind(&self) -> RegistryKind {
        RegistryKind::Nexus
    }

    async fn fetch_tags(&self, image_name: &str) -> Result<Vec<TagRecord>, RegistryError> {
        ensure_image_name(image_name)?;

        let cookie = match &self.credentials {
            Some(credentials) => Some(self.login(credentials).await?),
            None => None,
        };

        let url = format!("{}/service/rest/v1/search", self.base_url);
        debug!("Searching Nexus for {}: {}", image_name, url);

        let mut request = self
            .client
            .get(&url)
            .query(&[("docker.imageName", image_name)]);
        if let Some(cookie) = cookie.filter(|c| !c.is_empty()) {
            request = request.header(COOKIE, cookie);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Nexus returned status {}: {}", status, url);
            return Err(RegistryError::UnexpectedStatus { status, url });
        }

        let search: NexusSearchResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse Nexus search response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(search
            .items
            .into_iter()
            .map(|item| TagRecord::new(image_name, item.version, RegistryKind::Nexus))
            .collect())
    }
}
