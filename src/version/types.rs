//! Common types shared by registries and the resolver

use std::fmt;

use crate::error::ConfigError;

/// Kind of container registry backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegistryKind {
    /// Public DockerHub (registry.hub.docker.com)
    #[default]
    DockerHub,
    /// Self-hosted Sonatype Nexus
    Nexus,
    /// Self-hosted Harbor
    Harbor,
}

impl RegistryKind {
    /// Returns the string representation of the registry kind
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryKind::DockerHub => "dockerhub",
            RegistryKind::Nexus => "nexus",
            RegistryKind::Harbor => "harbor",
        }
    }

    /// Whether this backend needs a base URL to be configured
    pub fn requires_url(&self) -> bool {
        !matches!(self, RegistryKind::DockerHub)
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RegistryKind {
    type Err = ConfigError;

    /// Case-insensitive. An empty string selects DockerHub.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "dockerhub" => Ok(RegistryKind::DockerHub),
            "nexus" => Ok(RegistryKind::Nexus),
            "harbor" => Ok(RegistryKind::Harbor),
            _ => Err(ConfigError::UnknownRegistry(s.to_string())),
        }
    }
}

/// A single tag of an image as reported by a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub image_name: String,
    pub tag: String,
    pub source: RegistryKind,
}

impl TagRecord {
    pub fn new(image_name: &str, tag: impl Into<String>, source: RegistryKind) -> Self {
        Self {
            image_name: image_name.to_string(),
            tag: tag.into(),
            source,
        }
    }
}

impl fmt::Display for TagRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.image_name, self.tag)
    }
}
