use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::version::batch::FailurePolicy;
use crate::version::types::RegistryKind;

// =============================================================================
// Defaults
// =============================================================================

/// User agent sent with every registry request
pub const USER_AGENT: &str = concat!("image-release/", env!("CARGO_PKG_VERSION"));

/// Directory holding the deployment templates
pub const DEFAULT_TEMPLATE_DIR: &str = "/tmp/template";

/// Directory the rendered release manifests are written to
pub const DEFAULT_RELEASE_DIR: &str = "/tmp/release";

/// Prepended to a template's file stem to form its image name
pub const DEFAULT_IMAGE_PREFIX: &str = "moebius/release/";

/// Maximum number of registry fetches in flight during a batch
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Program used to apply the release directory to the cluster
pub const DEFAULT_KUBECTL: &str = "kubectl";

/// Environment variable holding the tracing filter directive
pub const LOG_ENV: &str = "IMAGE_RELEASE_LOG";

/// Optional JSON settings file. Command-line flags take precedence.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub registry: RegistrySettings,
    pub release: ReleaseSettings,
    pub concurrency: Option<usize>,
    pub fail_fast: bool,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistrySettings {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ReleaseSettings {
    pub template_dir: Option<PathBuf>,
    pub release_dir: Option<PathBuf>,
    pub prefix: Option<String>,
    pub domain: Option<String>,
    pub kubectl: Option<String>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidSettings {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))
    }

    /// Loads the settings file when one is given, otherwise returns defaults
    pub fn load_optional(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn concurrency(&self, flag: Option<usize>) -> usize {
        flag.or(self.concurrency).unwrap_or(DEFAULT_CONCURRENCY)
    }

    pub fn failure_policy(&self, fail_fast_flag: bool) -> FailurePolicy {
        if fail_fast_flag || self.fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::Continue
        }
    }
}

/// Which registry to query and where
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistryConfig {
    pub kind: RegistryKind,
    pub url: Option<String>,
}

impl RegistryConfig {
    /// Merges flags over settings and checks that self-hosted backends have a URL
    pub fn resolve(
        kind_flag: Option<&str>,
        url_flag: Option<&str>,
        settings: &RegistrySettings,
    ) -> Result<Self, ConfigError> {
        let kind = kind_flag
            .or(settings.kind.as_deref())
            .unwrap_or_default()
            .parse::<RegistryKind>()?;
        let url = url_flag
            .or(settings.url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        if kind.requires_url() && url.is_none() {
            return Err(ConfigError::MissingUrl(kind));
        }
        Ok(Self { kind, url })
    }
}

/// Settings for `search`
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub registry: RegistryConfig,
    pub image: Option<String>,
    pub name_file: Option<PathBuf>,
    pub version_prefix: Option<String>,
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
}

/// Settings for `release`
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseConfig {
    pub registry: RegistryConfig,
    pub version_prefix: Option<String>,
    pub template_dir: PathBuf,
    pub release_dir: PathBuf,
    /// Always empty or ending in `/`
    pub image_prefix: String,
    /// Always empty or ending in `/`
    pub domain: String,
    pub apply: bool,
    pub kubectl: String,
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
}

/// Appends a `/` to non-empty values that lack one
pub fn with_trailing_slash(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() || value.ends_with('/') {
        value.to_string()
    } else {
        format!("{}/", value)
    }
}

/// Treats an empty version prefix as none
pub fn version_prefix(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
