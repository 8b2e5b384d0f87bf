//! Environment-derived configuration for the fetcher and the launcher
//!
//! Both components read their settings from an [`EnvMap`] snapshot rather
//! than from the live process environment. The binaries take the snapshot
//! once at start-up; CLI flags are written into it before any component
//! reads it, so an explicit flag always beats an inherited variable.

use std::collections::BTreeMap;
use std::path::PathBuf;

use once_cell::sync::OnceCell;

use crate::error::{Error, Result};

/// Immutable view of the configuration variables
pub type EnvMap = BTreeMap<String, String>;

/// Repository that publishes frp releases
pub const DEFAULT_REPO: &str = "fatedier/frp";
/// GitHub REST API base
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
/// GitHub web base used to synthesize release download links
pub const DEFAULT_WEB_BASE: &str = "https://github.com";
/// User agent sent with every request
pub const USER_AGENT: &str = "frp-cli-install";
/// Prefix of release asset names (`frp_<version>_<os>_<arch>.<ext>`)
pub const TOOL_NAME: &str = "frp";
/// Executable shipped inside the release archive, also the artifact prefix
pub const BINARY_NAME: &str = "frpc";
/// Directory name of the artifact store next to the running executable
pub const NATIVE_DIR_NAME: &str = "native";

/// Environment variable names
pub mod vars {
    pub const REPO: &str = "FRP_REPO";
    pub const VERSION: &str = "FRP_VERSION";
    pub const SKIP_FETCH: &str = "FRPC_SKIP_POSTINSTALL";
    pub const USE_CURL: &str = "FRPC_USE_CURL";
    pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
    pub const GH_TOKEN: &str = "GH_TOKEN";
    pub const FORCE_PLATFORM: &str = "FRPC_FORCE_PLATFORM";
    pub const FORCE_ARCH: &str = "FRPC_FORCE_ARCH";
    pub const NATIVE_DIR: &str = "FRPC_NATIVE_DIR";
    pub const API_BASE: &str = "FRP_GITHUB_API";
    pub const WEB_BASE: &str = "FRP_GITHUB_URL";
    pub const SERVER: &str = "FRP_SERVER";
    pub const TOKEN: &str = "FRP_TOKEN";
}

/// Take a snapshot of the process environment, skipping non-UTF-8 entries
pub fn snapshot() -> EnvMap {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Look up a variable, treating an empty value as unset
pub fn non_empty<'a>(env: &'a EnvMap, key: &str) -> Option<&'a str> {
    env.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn enabled(env: &EnvMap, key: &str) -> bool {
    env.get(key).is_some_and(|v| v == "1")
}

/// Drop a single leading `v` from a version tag
pub fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// Settings consumed by the fetcher
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// `owner/name` of the release repository
    pub repo: String,
    /// Pinned version without the leading `v`; `None` means latest
    pub version: Option<String>,
    pub skip: bool,
    /// Use curl for the asset download even if HTTP would work
    pub use_curl: bool,
    pub github_token: Option<String>,
    pub api_base: String,
    pub web_base: String,
    pub artifact_dir: PathBuf,
}

impl FetchConfig {
    pub fn from_env(env: &EnvMap) -> Result<Self> {
        let version = non_empty(env, vars::VERSION)
            .map(strip_v)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);

        let github_token = non_empty(env, vars::GITHUB_TOKEN)
            .or_else(|| non_empty(env, vars::GH_TOKEN))
            .map(str::to_owned);

        Ok(Self {
            repo: non_empty(env, vars::REPO).unwrap_or(DEFAULT_REPO).to_owned(),
            version,
            skip: enabled(env, vars::SKIP_FETCH),
            use_curl: enabled(env, vars::USE_CURL),
            github_token,
            api_base: base_url(env, vars::API_BASE, DEFAULT_API_BASE),
            web_base: base_url(env, vars::WEB_BASE, DEFAULT_WEB_BASE),
            artifact_dir: artifact_dir(env)?,
        })
    }
}

/// Settings consumed by the launcher
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub artifact_dir: PathBuf,
    /// Default for `-s/--server`
    pub server: Option<String>,
    /// Default for `-t/--token`
    pub token: Option<String>,
}

impl LaunchConfig {
    pub fn from_env(env: &EnvMap) -> Result<Self> {
        Ok(Self {
            artifact_dir: artifact_dir(env)?,
            server: non_empty(env, vars::SERVER).map(str::to_owned),
            token: non_empty(env, vars::TOKEN).map(str::to_owned),
        })
    }
}

fn base_url(env: &EnvMap, key: &str, default: &str) -> String {
    non_empty(env, key)
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_owned()
}

static DEFAULT_ARTIFACT_DIR: OnceCell<PathBuf> = OnceCell::new();

/// Resolve the artifact directory: `FRPC_NATIVE_DIR`, else `native/` beside
/// the running executable (cached after first resolution)
pub fn artifact_dir(env: &EnvMap) -> Result<PathBuf> {
    if let Some(dir) = non_empty(env, vars::NATIVE_DIR) {
        return Ok(PathBuf::from(dir));
    }

    DEFAULT_ARTIFACT_DIR
        .get_or_try_init(|| {
            let exe = std::env::current_exe()
                .map_err(|e| Error::ArtifactDir(format!("current executable unknown: {e}")))?;
            let parent = exe
                .parent()
                .ok_or_else(|| Error::ArtifactDir(format!("{} has no parent", exe.display())))?;
            Ok(parent.join(NATIVE_DIR_NAME))
        })
        .cloned()
}
