//! `release`: render templates with the latest image of each and optionally apply them

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use crate::commands::{BatchArgs, RegistryArgs, write_line};
use crate::config::{
    DEFAULT_IMAGE_PREFIX, DEFAULT_KUBECTL, DEFAULT_RELEASE_DIR, DEFAULT_TEMPLATE_DIR,
    ReleaseConfig, Settings, with_trailing_slash,
};
use crate::error::{ConfigError, Error};
use crate::release::{apply_release, discover_templates, prepare_release_dir, write_release};
use crate::version::batch::resolve_all;
use crate::version::registries::create_registry;
use crate::version::registry::TagRegistry;
use crate::version::resolver::LatestTagResolver;

#[derive(Debug, Clone, Default, Args)]
pub struct ReleaseArgs {
    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Template directory [default: /tmp/template]
    #[arg(short = 'f', long, value_name = "DIR")]
    pub template_dir: Option<PathBuf>,

    /// Output directory, recreated on every run [default: /tmp/release]
    #[arg(short = 'o', long, value_name = "DIR")]
    pub release_dir: Option<PathBuf>,

    /// Image name prefix joined with each template's file name [default: moebius/release/]
    #[arg(long)]
    pub prefix: Option<String>,

    /// Registry domain put in front of the rendered image reference
    #[arg(long)]
    pub domain: Option<String>,

    /// Replace the cluster resources with the rendered manifests
    #[arg(long)]
    pub apply: bool,

    /// kubectl program used by --apply [default: kubectl]
    #[arg(long, value_name = "PROGRAM")]
    pub kubectl: Option<String>,

    #[command(flatten)]
    pub batch: BatchArgs,
}

impl ReleaseArgs {
    pub fn into_config(self, settings: &Settings) -> Result<ReleaseConfig, ConfigError> {
        let release = &settings.release;
        let prefix = self
            .prefix
            .or_else(|| release.prefix.clone())
            .filter(|prefix| !prefix.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_PREFIX.to_string());
        let domain = self
            .domain
            .or_else(|| release.domain.clone())
            .unwrap_or_default();

        Ok(ReleaseConfig {
            registry: self.registry.into_config(settings)?,
            version_prefix: self.batch.version_prefix(),
            template_dir: self
                .template_dir
                .or_else(|| release.template_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_DIR)),
            release_dir: self
                .release_dir
                .or_else(|| release.release_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RELEASE_DIR)),
            image_prefix: with_trailing_slash(&prefix),
            domain: with_trailing_slash(&domain),
            apply: self.apply,
            kubectl: self
                .kubectl
                .or_else(|| release.kubectl.clone())
                .unwrap_or_else(|| DEFAULT_KUBECTL.to_string()),
            concurrency: self.batch.concurrency(settings),
            failure_policy: self.batch.failure_policy(settings),
        })
    }
}

/// Files written and images skipped by a release run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseSummary {
    pub written: Vec<PathBuf>,
    /// Images without any tag following the version convention
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl ReleaseSummary {
    fn ensure_complete(&self) -> Result<(), Error> {
        if self.failed.is_empty() {
            return Ok(());
        }
        Err(Error::BatchFailed {
            failed: self.failed.len(),
            total: self.written.len() + self.skipped.len() + self.failed.len(),
        })
    }
}

pub async fn run(args: ReleaseArgs, settings: &Settings) -> Result<(), Error> {
    let config = args.into_config(settings)?;
    let registry = create_registry(&config.registry)?;
    let summary = execute(&config, registry.as_ref(), &mut std::io::stdout()).await?;

    // A partial release is never applied
    summary.ensure_complete()?;
    if config.apply {
        apply_release(&config.kubectl, &config.release_dir).await?;
        info!("Applied {}", config.release_dir.display());
    }
    Ok(())
}

/// The release directory is wiped on every run, so it must neither be nor
/// contain the template directory (nor live inside it).
fn ensure_disjoint(release_dir: &Path, template_dir: &Path) -> Result<(), ConfigError> {
    // A release dir that does not exist yet is resolved through its parent
    let absolute = |path: &Path| -> Result<PathBuf, ConfigError> {
        let path = std::path::absolute(path).map_err(|e| ConfigError::InvalidSettings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if let Ok(resolved) = path.canonicalize() {
            return Ok(resolved);
        }
        Ok(match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => parent
                .canonicalize()
                .map(|parent| parent.join(name))
                .unwrap_or_else(|_| path.clone()),
            _ => path.clone(),
        })
    };
    let release = absolute(release_dir)?;
    let template = absolute(template_dir)?;

    if release.starts_with(&template) || template.starts_with(&release) {
        return Err(ConfigError::ReleaseDirOverlapsTemplates {
            release_dir: release_dir.to_path_buf(),
            template_dir: template_dir.to_path_buf(),
        });
    }
    Ok(())
}

/// Resolves every template's image and writes the rendered manifests.
///
/// Nothing is written when the template directory is missing or, under the
/// fail-fast policy, when any fetch fails. With the default policy failed
/// images are listed in the summary and their templates are left out.
pub async fn execute(
    config: &ReleaseConfig,
    registry: &dyn TagRegistry,
    out: &mut impl Write,
) -> Result<ReleaseSummary, Error> {
    if !config.template_dir.is_dir() {
        return Err(ConfigError::TemplateDirNotFound(config.template_dir.clone()).into());
    }
    ensure_disjoint(&config.release_dir, &config.template_dir)?;

    let templates = discover_templates(&config.template_dir, &config.image_prefix)?;
    info!(
        "Found {} templates in {}",
        templates.len(),
        config.template_dir.display()
    );
    let images: Vec<String> = templates.iter().map(|t| t.image_name.clone()).collect();

    let resolver = LatestTagResolver::new(config.version_prefix.as_deref());
    let resolutions = resolve_all(
        registry,
        &resolver,
        &images,
        config.concurrency,
        config.failure_policy,
    )
    .await?;

    prepare_release_dir(&config.release_dir)?;

    let mut summary = ReleaseSummary::default();
    for (template, resolution) in templates.iter().zip(&resolutions) {
        match &resolution.outcome {
            Ok(Some(tag)) => {
                let image_ref = format!("{}{}:{}", config.domain, template.image_name, tag);
                summary
                    .written
                    .push(write_release(template, &config.release_dir, &image_ref)?);
                write_line(out, format_args!("{}", image_ref))?;
            }
            Ok(None) => {
                write_line(
                    out,
                    format_args!("{}: no latest version found", template.image_name),
                )?;
                summary.skipped.push(template.image_name.clone());
            }
            Err(e) => {
                write_line(
                    out,
                    format_args!("{}: fetch failed: {}", template.image_name, e),
                )?;
                summary.failed.push(template.image_name.clone());
            }
        }
    }

    write_line(
        out,
        format_args!(
            "Release written to {}: {} manifests, {} skipped, {} failed",
            config.release_dir.display(),
            summary.written.len(),
            summary.skipped.len(),
            summary.failed.len()
        ),
    )?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::version::batch::FailurePolicy;
    use crate::version::error::RegistryError;
    use crate::version::registry::MockTagRegistry;
    use crate::version::types::{RegistryKind, TagRecord};
    use std::fs;
    use tempfile::TempDir;

    fn registry() -> MockTagRegistry {
        let mut registry = MockTagRegistry::new();
        registry.expect_kind().return_const(RegistryKind::Harbor);
        registry.expect_fetch_tags().returning(|image| {
            let tags: &[&str] = match image {
                "moebius/release/api" => &["v1.9-3", "v1.9-7", "v2.0-1"],
                "moebius/release/worker" => &["v1.9.0-2", "v1.9-40"],
                "moebius/release/docs" => &["latest"],
                _ => return Err(RegistryError::InvalidResponse("boom".to_string())),
            };
            Ok(tags
                .iter()
                .map(|tag| TagRecord::new(image, *tag, RegistryKind::Harbor))
                .collect())
        });
        registry
    }

    fn setup(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join("template").join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "spec:\n  image: {{image}}\n").unwrap();
        }
        dir
    }

    fn config(dir: &Path, version_prefix: Option<&str>, policy: FailurePolicy) -> ReleaseConfig {
        ReleaseConfig {
            registry: RegistryConfig::default(),
            version_prefix: version_prefix.map(str::to_string),
            template_dir: dir.join("template"),
            release_dir: dir.join("release"),
            image_prefix: DEFAULT_IMAGE_PREFIX.to_string(),
            domain: "registry.example.com/".to_string(),
            apply: false,
            kubectl: DEFAULT_KUBECTL.to_string(),
            concurrency: 2,
            failure_policy: policy,
        }
    }

    #[test]
    fn into_config_normalizes_prefix_and_domain() {
        let args = ReleaseArgs {
            prefix: Some("team/apps".to_string()),
            domain: Some("registry.example.com".to_string()),
            ..ReleaseArgs::default()
        };
        let config = args.into_config(&Settings::default()).unwrap();

        assert_eq!(config.image_prefix, "team/apps/");
        assert_eq!(config.domain, "registry.example.com/");
        assert_eq!(config.template_dir, PathBuf::from(DEFAULT_TEMPLATE_DIR));
        assert_eq!(config.release_dir, PathBuf::from(DEFAULT_RELEASE_DIR));
        assert_eq!(config.kubectl, DEFAULT_KUBECTL);
    }

    #[test]
    fn into_config_uses_default_prefix_and_empty_domain() {
        let config = ReleaseArgs::default()
            .into_config(&Settings::default())
            .unwrap();

        assert_eq!(config.image_prefix, DEFAULT_IMAGE_PREFIX);
        assert_eq!(config.domain, "");
    }

    #[tokio::test]
    async fn execute_writes_latest_image_into_each_template() {
        let dir = setup(&["api.yaml", "backend/worker.yaml"]);
        let mut out = Vec::new();

        let summary = execute(
            &config(dir.path(), None, FailurePolicy::Continue),
            &registry(),
            &mut out,
        )
        .await
        .unwrap();

        let release = dir.path().join("release");
        assert_eq!(
            summary.written,
            vec![release.join("api.yaml"), release.join("backend/worker.yaml")]
        );
        assert_eq!(
            fs::read_to_string(release.join("api.yaml")).unwrap(),
            "spec:\n  image: registry.example.com/moebius/release/api:v2.0-1\n"
        );
        assert_eq!(
            fs::read_to_string(release.join("backend/worker.yaml")).unwrap(),
            "spec:\n  image: registry.example.com/moebius/release/worker:v1.9.0-2\n"
        );
    }

    #[tokio::test]
    async fn execute_pins_version_line_with_prefix() {
        let dir = setup(&["api.yaml", "backend/worker.yaml"]);
        let mut out = Vec::new();

        execute(
            &config(dir.path(), Some("v1.9"), FailurePolicy::Continue),
            &registry(),
            &mut out,
        )
        .await
        .unwrap();

        let release = dir.path().join("release");
        assert_eq!(
            fs::read_to_string(release.join("api.yaml")).unwrap(),
            "spec:\n  image: registry.example.com/moebius/release/api:v1.9-7\n"
        );
        assert_eq!(
            fs::read_to_string(release.join("backend/worker.yaml")).unwrap(),
            "spec:\n  image: registry.example.com/moebius/release/worker:v1.9-40\n"
        );
    }

    #[tokio::test]
    async fn execute_skips_images_without_latest_version() {
        let dir = setup(&["api.yaml", "docs.yaml"]);
        let mut out = Vec::new();

        let summary = execute(
            &config(dir.path(), None, FailurePolicy::Continue),
            &registry(),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(summary.skipped, vec!["moebius/release/docs".to_string()]);
        assert!(!dir.path().join("release/docs.yaml").exists());
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("moebius/release/docs: no latest version found\n"));
    }

    #[tokio::test]
    async fn execute_continues_past_failed_fetches() {
        let dir = setup(&["api.yaml", "unknown.yaml"]);
        let mut out = Vec::new();

        let summary = execute(
            &config(dir.path(), None, FailurePolicy::Continue),
            &registry(),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(summary.failed, vec!["moebius/release/unknown".to_string()]);
        assert!(dir.path().join("release/api.yaml").exists());
    }

    #[tokio::test]
    async fn execute_fail_fast_writes_nothing() {
        let dir = setup(&["api.yaml", "unknown.yaml"]);
        let release = dir.path().join("release");
        fs::create_dir_all(&release).unwrap();
        fs::write(release.join("previous.yaml"), "kept").unwrap();
        let mut out = Vec::new();

        let result = execute(
            &config(dir.path(), None, FailurePolicy::FailFast),
            &registry(),
            &mut out,
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::Fetch { image, .. }) if image == "moebius/release/unknown"
        ));
        assert!(release.join("previous.yaml").exists());
        assert!(!release.join("api.yaml").exists());
    }

    #[tokio::test]
    async fn execute_rejects_missing_template_dir() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();

        let result = execute(
            &config(dir.path(), None, FailurePolicy::Continue),
            &registry(),
            &mut out,
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::TemplateDirNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn execute_refuses_release_dir_equal_to_template_dir() {
        let dir = setup(&["api.yaml"]);
        let mut config = config(dir.path(), None, FailurePolicy::Continue);
        config.release_dir = config.template_dir.clone();
        let mut registry = MockTagRegistry::new();
        registry.expect_fetch_tags().never();
        let mut out = Vec::new();

        let result = execute(&config, &registry, &mut out).await;

        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::ReleaseDirOverlapsTemplates { .. }))
        ));
        assert!(dir.path().join("template/api.yaml").exists());
    }

    #[test]
    fn ensure_disjoint_rejects_nested_directories() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("template");
        fs::create_dir_all(&template).unwrap();

        assert!(ensure_disjoint(dir.path(), &template).is_err());
        assert!(ensure_disjoint(&template.join("out"), &template).is_err());
        assert!(ensure_disjoint(&template.join("."), &template).is_err());
        assert!(ensure_disjoint(&dir.path().join("release"), &template).is_ok());
        assert!(ensure_disjoint(&dir.path().join("template-out"), &template).is_ok());
    }
}
