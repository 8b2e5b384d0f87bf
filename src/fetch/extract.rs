//! Release archive extraction (.tar.gz and .zip)

use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::platform::ArchiveFormat;

fn archive_error(path: &Path, reason: impl ToString) -> Error {
    Error::Archive {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn unpack_tar_gz(archive_path: &Path, out_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path)
        .map_err(|e| Error::io(format!("open {}", archive_path.display()), e))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive
        .unpack(out_dir)
        .map_err(|e| archive_error(archive_path, e))
}

fn unpack_zip(archive_path: &Path, out_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path)
        .map_err(|e| Error::io(format!("open {}", archive_path.display()), e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| archive_error(archive_path, e))?;
    archive
        .extract(out_dir)
        .map_err(|e| archive_error(archive_path, e))
}

/// Unpack `archive_path` into `out_dir` (created if needed)
pub async fn extract_archive(
    archive_path: &Path,
    format: ArchiveFormat,
    out_dir: &Path,
) -> Result<()> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|e| Error::io(format!("create {}", out_dir.display()), e))?;

    let archive_path = archive_path.to_path_buf();
    let out_dir = out_dir.to_path_buf();
    let join_path = archive_path.clone();

    // CPU-bound; keep it off the async executor
    tokio::task::spawn_blocking(move || match format {
        ArchiveFormat::TarGz => unpack_tar_gz(&archive_path, &out_dir),
        ArchiveFormat::Zip => unpack_zip(&archive_path, &out_dir),
    })
    .await
    .map_err(|e| archive_error(&join_path, e))?
}

/// First directory directly under `root`, by name order
///
/// Release archives wrap everything in a single `frp_<version>_<os>_<arch>/`
/// directory; nothing else about the layout is assumed.
pub async fn find_inner_dir(root: &Path) -> Result<PathBuf> {
    let mut entries = tokio::fs::read_dir(root)
        .await
        .map_err(|e| Error::io(format!("read {}", root.display()), e))?;

    let mut dirs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::io(format!("read {}", root.display()), e))?
    {
        let path = entry.path();
        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            dirs.push(path);
        }
    }

    dirs.sort();
    dirs.into_iter()
        .next()
        .ok_or_else(|| Error::InnerDirMissing(root.to_path_buf()))
}
