//! Fetch the frpc release for a target into the artifact directory
//!
//! ## Module Organization
//!
//! - `github` - release resolution against the GitHub API
//! - `download` - streamed HTTP download with a curl fallback
//! - `extract` - .tar.gz / .zip unpacking

mod download;
mod extract;
mod github;

use std::path::PathBuf;

use log::info;

pub use download::http_download;
pub use extract::{extract_archive, find_inner_dir};
pub use github::{http_client, GitHubAsset, GitHubClient, GitHubRelease};

use crate::artifacts::ArtifactStore;
use crate::config::{EnvMap, FetchConfig, BINARY_NAME, TOOL_NAME};
use crate::error::{Error, Result};
use crate::platform::Target;
use download::{download_to, Curl, ExternalDownloader};

/// Environment variables that resolve the usual fetch failures
pub const HINTS: &str =
    "Hints: set GITHUB_TOKEN; FRP_VERSION=...; FRPC_SKIP_POSTINSTALL=1; FRPC_USE_CURL=1";

/// What a successful fetch installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub version: String,
    pub asset_name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// `FRPC_SKIP_POSTINSTALL=1` was set
    Skipped,
    Installed(InstallReport),
}

/// Fetch frpc for the target described by `env`
pub async fn run(env: &EnvMap) -> Result<FetchOutcome> {
    let config = FetchConfig::from_env(env)?;
    if config.skip {
        info!("frp-cli: skip postinstall");
        return Ok(FetchOutcome::Skipped);
    }

    let target = Target::detect(env)?;
    fetch(&config, target, &Curl)
        .await
        .map(FetchOutcome::Installed)
}

pub(crate) async fn fetch<D: ExternalDownloader>(
    config: &FetchConfig,
    target: Target,
    external: &D,
) -> Result<InstallReport> {
    let http = http_client(config)?;

    let release = GitHubClient::new(&http, config)
        .resolve_release(config.version.as_deref())
        .await?;
    let version = release.version()?;

    let asset_name = target.asset_name(TOOL_NAME, &version);
    let url = release.asset_url(&asset_name, &config.web_base, &config.repo, &version);

    let store = ArtifactStore::new(&config.artifact_dir);
    store.purge().await;

    let tmp = tempfile::Builder::new()
        .prefix("frp-")
        .tempdir()
        .map_err(|e| Error::io("create temp dir", e))?;
    let archive = tmp.path().join(&asset_name);

    info!("frp-cli: downloading {asset_name}");
    download_to(&http, &url, &archive, config.use_curl, external).await?;

    let unpack = tmp.path().join("unpack");
    extract_archive(&archive, target.os.archive_format(), &unpack).await?;
    let inner = find_inner_dir(&unpack).await?;

    let path = store
        .install(&inner.join(target.executable_name(BINARY_NAME)), target)
        .await?;
    info!("frp-cli: installed {}", path.display());

    Ok(InstallReport {
        version,
        asset_name,
        path,
    })
}
