//! GitHub release API interaction

use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::{strip_v, FetchConfig, USER_AGENT};
use crate::error::{Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const API_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 10;

/// GitHub release metadata from API
#[derive(Deserialize, Debug, Clone)]
pub struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<GitHubAsset>,
}

/// GitHub release asset metadata
#[derive(Deserialize, Debug, Clone)]
pub struct GitHubAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

/// Entry of the repository tag listing
#[derive(Deserialize, Debug)]
pub struct GitHubTag {
    pub name: String,
}

impl GitHubRelease {
    /// Release version with the leading `v` removed
    pub fn version(&self) -> Result<String> {
        let version = strip_v(self.tag_name.trim());
        if version.is_empty() {
            return Err(Error::ReleaseVersion);
        }
        Ok(version.to_owned())
    }

    /// Download URL of `asset_name`, falling back to the canonical release link
    pub fn asset_url(&self, asset_name: &str, web_base: &str, repo: &str, version: &str) -> String {
        self.assets
            .iter()
            .find(|a| a.name == asset_name)
            .map(|a| a.browser_download_url.clone())
            .unwrap_or_else(|| {
                debug!("asset {asset_name} not listed, using canonical download link");
                format!("{web_base}/{repo}/releases/download/v{version}/{asset_name}")
            })
    }
}

/// HTTP client shared by the API calls and the asset download
pub fn http_client(config: &FetchConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    if let Some(token) = &config.github_token {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("frp-cli: ignoring GitHub token with invalid characters"),
        }
    }

    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|source| Error::Http {
            url: config.api_base.clone(),
            source,
        })
}

/// Accept 2xx and 3xx responses, like the upstream installer
pub(crate) fn check_status(url: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() || status.is_redirection() {
        Ok(response)
    } else {
        Err(Error::Status {
            url: url.to_owned(),
            status: status.as_u16(),
        })
    }
}

/// Release queries against one repository
pub struct GitHubClient<'a> {
    http: &'a reqwest::Client,
    api_base: &'a str,
    repo: &'a str,
}

impl<'a> GitHubClient<'a> {
    pub fn new(http: &'a reqwest::Client, config: &'a FetchConfig) -> Self {
        Self {
            http,
            api_base: &config.api_base,
            repo: &config.repo,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .timeout(API_TIMEOUT)
            .send()
            .await
            .map_err(|source| Error::Http {
                url: url.to_owned(),
                source,
            })?;

        check_status(url, response)?
            .json::<T>()
            .await
            .map_err(|source| Error::Http {
                url: url.to_owned(),
                source,
            })
    }

    /// Release tagged `v{version}`
    pub async fn release_by_tag(&self, version: &str) -> Result<GitHubRelease> {
        let url = format!(
            "{}/repos/{}/releases/tags/v{}",
            self.api_base, self.repo, version
        );
        self.get_json(&url).await
    }

    pub async fn latest_release(&self) -> Result<GitHubRelease> {
        let url = format!("{}/repos/{}/releases/latest", self.api_base, self.repo);
        self.get_json(&url).await
    }

    /// Most recent tag name without the leading `v`, if any
    pub async fn latest_tag(&self) -> Result<Option<String>> {
        let url = format!("{}/repos/{}/tags?per_page=1", self.api_base, self.repo);
        let tags: Vec<GitHubTag> = self.get_json(&url).await?;
        Ok(tags
            .into_iter()
            .next()
            .map(|t| strip_v(&t.name).to_owned())
            .filter(|v| !v.is_empty()))
    }

    /// Pinned release, or latest with a fallback through the tag listing
    pub async fn resolve_release(&self, pinned: Option<&str>) -> Result<GitHubRelease> {
        if let Some(version) = pinned {
            return self.release_by_tag(version).await;
        }

        match self.latest_release().await {
            Ok(release) => Ok(release),
            Err(err) => {
                warn!("frp-cli: latest release lookup failed ({err}), trying tags");
                match self.latest_tag().await? {
                    Some(version) => self.release_by_tag(&version).await,
                    None => Err(err),
                }
            }
        }
    }
}
