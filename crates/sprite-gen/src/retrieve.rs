//! Artifact download
//!
//! Bodies are streamed into a hidden temporary sibling of the destination and
//! renamed into place once complete, so a failed download never leaves a
//! partial file where skip-existing would mistake it for finished work.

use crate::http::HttpClient;
use sprite_core::{Result, SpriteError};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fetches a finished artifact and stores it at a destination path
pub trait ArtifactRetriever {
    /// Download `url` to `dest`, returning the number of bytes written
    fn retrieve(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Retriever over plain HTTP GET
pub struct HttpRetriever {
    http: HttpClient,
}

impl HttpRetriever {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: HttpClient::new(timeout),
        }
    }
}

impl ArtifactRetriever for HttpRetriever {
    fn retrieve(&self, url: &str, dest: &Path) -> Result<u64> {
        let download_error = |cause: String| SpriteError::DownloadError {
            url: url.to_string(),
            cause,
        };

        let (status, reader) = self.http.open(url).map_err(|e| download_error(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(download_error(format!("HTTP {}", status)));
        }

        let bytes = write_atomically(dest, reader).map_err(|e| match e {
            SpriteError::IoError(io) => download_error(io.to_string()),
            other => other,
        })?;
        log::info!("Saved {} ({} bytes)", dest.display(), bytes);
        Ok(bytes)
    }
}

/// Copy `reader` to `dest` through a temporary sibling file, creating parent directories.
///
/// On error the temporary file is removed and `dest` is left untouched.
pub fn write_atomically(dest: &Path, reader: impl Read) -> Result<u64> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let temp = temp_path(dest);
    let result = copy_to(&temp, reader).and_then(|n| std::fs::rename(&temp, dest).map(|_| n));
    if result.is_err() {
        let _ = std::fs::remove_file(&temp);
    }
    Ok(result?)
}

fn copy_to(path: &Path, mut reader: impl Read) -> std::io::Result<u64> {
    let mut writer = BufWriter::new(File::create(path)?);
    let n = std::io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    Ok(n)
}

fn temp_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    dest.with_file_name(format!(
        ".{}.{}.part",
        name,
        uuid::Uuid::new_v4().simple()
    ))
}
