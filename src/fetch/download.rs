//! Asset download: streamed HTTP with an external-tool fallback

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use super::github::check_status;
use crate::error::{Error, Result};

// No body bytes for this long aborts the HTTP download
const DOWNLOAD_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(300);

/// A download tool run as a separate process
pub(crate) trait ExternalDownloader {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    async fn download(&self, url: &str, out: &Path) -> Result<()>;
}

/// `curl` from `PATH`
pub(crate) struct Curl;

impl ExternalDownloader for Curl {
    fn name(&self) -> &str {
        "curl"
    }

    fn is_available(&self) -> bool {
        which::which("curl").is_ok()
    }

    async fn download(&self, url: &str, out: &Path) -> Result<()> {
        let status = tokio::process::Command::new("curl")
            .args(["-L", url, "-o"])
            .arg(out)
            .args([
                "--fail",
                "--show-error",
                "--connect-timeout",
                "20",
                "--max-time",
                "900",
            ])
            .status()
            .await
            .map_err(|e| Error::Download(format!("cannot run curl: {e}")))?;

        if !status.success() {
            return Err(Error::Download(format!("curl failed ({status})")));
        }
        Ok(())
    }
}

/// Stream `url` into `out`, returning the number of bytes written
pub async fn http_download(client: &reqwest::Client, url: &str, out: &Path) -> Result<u64> {
    let response = client.get(url).send().await.map_err(|source| Error::Http {
        url: url.to_owned(),
        source,
    })?;
    let response = check_status(url, response)?;

    let mut file = tokio::fs::File::create(out)
        .await
        .map_err(|e| Error::io(format!("create {}", out.display()), e))?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    loop {
        let chunk = match timeout(DOWNLOAD_INACTIVITY_TIMEOUT, stream.next()).await {
            Ok(Some(Ok(chunk))) => chunk,
            Ok(Some(Err(source))) => {
                return Err(Error::Http {
                    url: url.to_owned(),
                    source,
                });
            }
            Ok(None) => break,
            Err(_) => {
                return Err(Error::Timeout {
                    url: url.to_owned(),
                    secs: DOWNLOAD_INACTIVITY_TIMEOUT.as_secs(),
                });
            }
        };

        file.write_all(&chunk)
            .await
            .map_err(|e| Error::io(format!("write {}", out.display()), e))?;
        downloaded += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| Error::io(format!("write {}", out.display()), e))?;

    Ok(downloaded)
}

/// Download `url` to `out`, using `external` when forced or when HTTP fails
pub(crate) async fn download_to<D: ExternalDownloader>(
    client: &reqwest::Client,
    url: &str,
    out: &Path,
    force_external: bool,
    external: &D,
) -> Result<()> {
    if force_external {
        info!("frp-cli: downloading with {}", external.name());
        return external.download(url, out).await;
    }

    match http_download(client, url, out).await {
        Ok(bytes) => {
            debug!("downloaded {bytes} bytes from {url}");
            Ok(())
        }
        Err(err) if external.is_available() => {
            warn!(
                "frp-cli: HTTP download failed ({:#}), fallback to {} …",
                anyhow::Error::from(err),
                external.name()
            );
            external.download(url, out).await
        }
        Err(err) => Err(err),
    }
}
