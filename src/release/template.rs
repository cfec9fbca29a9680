//! Template discovery and `{{image}}` substitution

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::Error;

/// Placeholder replaced by the resolved image reference
pub const IMAGE_PLACEHOLDER: &str = "{{image}}";

/// A `.yaml` template and the image it deploys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub path: PathBuf,
    /// Path relative to the template directory, mirrored under the release directory
    pub relative_path: PathBuf,
    /// Image prefix followed by the file stem
    pub image_name: String,
}

/// Finds every `.yaml` file below `template_dir`, sorted by path.
///
/// `image_prefix` is expected to be empty or end with `/`.
pub fn discover_templates(template_dir: &Path, image_prefix: &str) -> Result<Vec<Template>, Error> {
    let mut templates = Vec::new();
    for entry in WalkDir::new(template_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(template_dir).to_path_buf();
            Error::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        debug!("Template candidate: {}", path.display());
        if path.extension().and_then(|ext| ext.to_str()) != Some("yaml") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let relative_path = path
            .strip_prefix(template_dir)
            .unwrap_or(path)
            .to_path_buf();

        templates.push(Template {
            path: path.to_path_buf(),
            relative_path,
            image_name: format!("{}{}", image_prefix, stem),
        });
    }
    Ok(templates)
}

/// Replaces every `{{image}}` in `content`
pub fn render(content: &str, image_ref: &str) -> String {
    content.replace(IMAGE_PLACEHOLDER, image_ref)
}

/// Removes any previous release directory and creates an empty one
pub fn prepare_release_dir(release_dir: &Path) -> Result<(), Error> {
    match std::fs::remove_dir_all(release_dir) {
        Ok(()) => debug!("Removed previous release directory {}", release_dir.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::io(release_dir, e)),
    }
    std::fs::create_dir_all(release_dir).map_err(|e| Error::io(release_dir, e))
}

/// Renders `template` with `image_ref` and writes it to its mirrored path
/// under `release_dir`. Returns the written path.
pub fn write_release(
    template: &Template,
    release_dir: &Path,
    image_ref: &str,
) -> Result<PathBuf, Error> {
    let content =
        std::fs::read_to_string(&template.path).map_err(|e| Error::io(&template.path, e))?;

    let target = release_dir.join(&template.relative_path);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    std::fs::write(&target, render(&content, image_ref)).map_err(|e| Error::io(&target, e))?;

    info!("Wrote {} ({})", target.display(), image_ref);
    Ok(target)
}
