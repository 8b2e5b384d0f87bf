//! Artifact directory: one ready-to-run frpc per target
//!
//! The fetcher replaces the directory contents wholesale; the launcher only
//! reads from it. Concurrent fetches race on the directory and are not
//! guarded against.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::BINARY_NAME;
use crate::error::{Error, Result};
use crate::platform::{supported_artifact_pattern, Target};

/// Handle on the artifact directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic location of the artifact for `target`
    pub fn path_for(&self, target: Target) -> PathBuf {
        self.dir.join(target.artifact_name(BINARY_NAME))
    }

    /// Return the artifact path for `target`, or explain how to obtain it
    pub fn locate(&self, target: Target) -> Result<PathBuf> {
        let path = self.path_for(target);
        if path.is_file() {
            return Ok(path);
        }
        Err(Error::ArtifactMissing {
            name: target.artifact_name(BINARY_NAME),
            path,
            supported: supported_artifact_pattern(BINARY_NAME),
            current: target.to_string(),
        })
    }

    /// Remove everything in the directory, creating it if missing
    ///
    /// Failures on individual entries are logged and skipped.
    pub async fn purge(&self) {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
                    warn!("frp-cli: failed to create native dir: {e}");
                }
                return;
            }
            Err(e) => {
                warn!("frp-cli: failed to clean native dir: {e}");
                return;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("frp-cli: failed to clean native dir: {e}");
                    break;
                }
            };
            let path = entry.path();
            let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
            let removed = if is_dir {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };
            match removed {
                Ok(()) => debug!("removed stale artifact {}", path.display()),
                Err(e) => warn!("frp-cli: failed to remove {}: {e}", path.display()),
            }
        }
    }

    /// Copy `source` into the store under the name for `target`
    pub async fn install(&self, source: &Path, target: Target) -> Result<PathBuf> {
        if !tokio::fs::try_exists(source).await.unwrap_or(false) {
            return Err(Error::ExecutableMissing(source.to_path_buf()));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::io(format!("create {}", self.dir.display()), e))?;

        let dest = self.path_for(target);
        tokio::fs::copy(source, &dest).await.map_err(|e| {
            Error::io(
                format!("copy {} to {}", source.display(), dest.display()),
                e,
            )
        })?;

        if !target.os.is_windows()
            && let Err(e) = make_executable(&dest)
        {
            warn!("frp-cli: failed to chmod {}: {e}", dest.display());
        }

        Ok(dest)
    }
}

/// Set mode 0755 on `path` (no-op on hosts without Unix permissions)
pub fn make_executable(path: &Path) -> std::io::Result<()> {
    cfg_if::cfg_if! {
        if #[cfg(unix)] {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(path, perms)
        } else {
            let _ = path;
            Ok(())
        }
    }
}
