//! Error taxonomy shared by the fetcher and the launcher

use std::path::PathBuf;

/// Errors raised while fetching or launching frpc
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("unsupported arch: {0}")]
    UnsupportedArch(String),

    #[error(
        "binary not found: {name}\n\
         Expected at: {path}\n\
         Supported names: {supported}\n\
         Current: {current}\n\
         Run `frpc-update` to download it."
    )]
    ArtifactMissing {
        name: String,
        path: PathBuf,
        supported: String,
        current: String,
    },

    #[error("cannot determine artifact directory: {0}")]
    ArtifactDir(String),

    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("no data received for {secs}s while downloading {url}")]
    Timeout { url: String, secs: u64 },

    #[error("cannot resolve frp version from release metadata")]
    ReleaseVersion,

    #[error("external download failed: {0}")]
    Download(String),

    #[error("failed to extract {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("inner dir not found in archive (looked in {0})")]
    InnerDirMissing(PathBuf),

    #[error("executable not found in archive: {0}")]
    ExecutableMissing(PathBuf),

    #[error("failed to start")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap an I/O error with a short description of what was being done
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    fn refused() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied")
    }

    #[test]
    fn spawn_failure_renders_reason_once() {
        let err = Error::Spawn {
            path: PathBuf::from("/opt/native/frpc-linux-x64"),
            source: refused(),
        };
        assert_eq!(err.to_string(), "failed to start");
        assert_eq!(
            format!("{:#}", anyhow::Error::from(err)),
            "failed to start: permission denied"
        );
    }

    #[test]
    fn io_context_is_not_duplicated_in_chain() {
        let err = Error::io("create /tmp/native", refused());
        let rendered = format!("{:#}", anyhow::Error::from(err));
        assert_eq!(rendered, "create /tmp/native: permission denied");
        assert_eq!(rendered.matches("permission denied").count(), 1);
    }
}
