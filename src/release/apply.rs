//! Applying a release directory with kubectl

use std::path::Path;

use tokio::process::Command;
use tracing::info;

use crate::error::Error;

/// Replaces the cluster resources described by `release_dir`.
///
/// Runs `<kubectl> delete --ignore-not-found -f <dir>` followed by
/// `<kubectl> apply -f <dir>`. The apply step only runs when the delete
/// step succeeded.
pub async fn apply_release(kubectl: &str, release_dir: &Path) -> Result<(), Error> {
    run(
        kubectl,
        &["delete", "--ignore-not-found", "-f"],
        release_dir,
    )
    .await?;
    run(kubectl, &["apply", "-f"], release_dir).await
}

async fn run(program: &str, args: &[&str], release_dir: &Path) -> Result<(), Error> {
    info!(
        "Running {} {} {}",
        program,
        args.join(" "),
        release_dir.display()
    );
    let status = Command::new(program)
        .args(args)
        .arg(release_dir)
        .status()
        .await
        .map_err(|e| Error::Apply(format!("failed to run {}: {}", program, e)))?;

    if !status.success() {
        return Err(Error::Apply(format!(
            "{} {} exited with {}",
            program,
            args.first().copied().unwrap_or_default(),
            status
        )));
    }
    Ok(())
}
