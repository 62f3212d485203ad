use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::process::Command;

use crate::error::{AppError, Result};
use crate::models::SourceConfig;

/// Branch the source publishes its catalogs on.
const DEFAULT_BRANCH: &str = "main";

/// How working copies of the metadata source are obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Keep one long-lived clone per source and update it in place.
    #[default]
    Persistent,
    /// Clone into a temporary directory and delete it after parsing.
    Disposable,
}

/// A point-in-time tree of the metadata source, ready for parsing.
///
/// Disposable snapshots own their temporary directory and remove it on
/// drop, whichever way the refresh cycle exits.
pub struct Snapshot {
    path: PathBuf,
    _temp: Option<TempDir>,
}

impl Snapshot {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub struct WorkingCopyProvider {
    strategy: Strategy,
    workdir: PathBuf,
    timeout: Duration,
}

impl WorkingCopyProvider {
    pub fn new(strategy: Strategy, workdir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            strategy,
            workdir: workdir.into(),
            timeout,
        }
    }

    /// Produce a directory holding the current tree of `source`.
    ///
    /// Any fetch failure aborts the cycle; a partial clone is never handed
    /// to the parser.
    pub async fn obtain(&self, source: &SourceConfig) -> Result<Snapshot> {
        match self.strategy {
            Strategy::Persistent => self.update_persistent(source).await,
            Strategy::Disposable => self.clone_disposable(source).await,
        }
    }

    async fn clone_disposable(&self, source: &SourceConfig) -> Result<Snapshot> {
        let temp = tempfile::Builder::new().prefix("metasync-").tempdir()?;
        self.git_clone(&source.clone_url, temp.path()).await?;

        Ok(Snapshot {
            path: temp.path().to_path_buf(),
            _temp: Some(temp),
        })
    }

    async fn update_persistent(&self, source: &SourceConfig) -> Result<Snapshot> {
        let dir = self.workdir.join(&source.name);

        if !is_valid_clone(&dir) {
            self.clone_fresh(&dir, source).await?;
        } else if let Err(e) = self.update_existing(&dir, source).await {
            // A clone that cannot be updated is discarded and recreated.
            tracing::warn!("updating working copy failed ({}), recloning", e);
            self.clone_fresh(&dir, source).await?;
        }

        Ok(Snapshot {
            path: dir,
            _temp: None,
        })
    }

    async fn clone_fresh(&self, dir: &Path, source: &SourceConfig) -> Result<()> {
        if dir.exists() {
            tokio::fs::remove_dir_all(dir).await?;
        }
        if let Some(parent) = dir.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tracing::info!("cloning {} into {}", source.clone_url, dir.display());
        self.git_clone(&source.clone_url, dir).await
    }

    async fn update_existing(&self, dir: &Path, source: &SourceConfig) -> Result<()> {
        self.run_git(dir, &["remote", "set-url", "origin", &source.clone_url])
            .await?;
        self.run_git(dir, &["clean", "-fdx"]).await?;
        self.run_git(dir, &["fetch", "--depth", "1", "origin", DEFAULT_BRANCH])
            .await?;
        self.run_git(dir, &["reset", "--hard", "FETCH_HEAD"]).await?;
        self.run_git(dir, &["clean", "-fdx"]).await
    }

    async fn git_clone(&self, url: &str, dest: &Path) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args(["clone", "--depth", "1", "--single-branch", url]).arg(dest);
        self.run(cmd, "clone").await
    }

    async fn run_git(&self, dir: &Path, args: &[&str]) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.current_dir(dir).args(args);
        self.run(cmd, args[0]).await
    }

    async fn run(&self, mut cmd: Command, op: &str) -> Result<()> {
        cmd.kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| AppError::Git(format!("git {} timed out", op)))??;

        if output.status.success() {
            Ok(())
        } else {
            Err(AppError::Git(format!(
                "git {} failed: {}",
                op,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

fn is_valid_clone(dir: &Path) -> bool {
    dir.join(".git").join("HEAD").exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_validity_probe() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_valid_clone(dir.path()));

        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git").join("HEAD"), "ref: refs/heads/main\n").unwrap();
        assert!(is_valid_clone(dir.path()));
    }

    #[test]
    fn disposable_snapshot_releases_its_directory() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().to_path_buf();

        let snapshot = Snapshot {
            path: path.clone(),
            _temp: Some(temp),
        };
        assert!(snapshot.path().exists());

        drop(snapshot);
        assert!(!path.exists());
    }

    #[test]
    fn strategy_deserializes_from_lowercase() {
        let strategy: Strategy = serde_json::from_str("\"disposable\"").unwrap();
        assert_eq!(strategy, Strategy::Disposable);
        assert_eq!(Strategy::default(), Strategy::Persistent);
    }
}
