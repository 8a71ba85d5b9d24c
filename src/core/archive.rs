//! Archive extractor - unpacks downloaded zip files into the storage directory.

use crate::errors::{Error, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

fn corrupt(archive_path: &Path, message: impl std::fmt::Display) -> Error {
    Error::CorruptArchive {
        path: archive_path.display().to_string(),
        message: message.to_string(),
    }
}

/// Extracts every file in the zip at `archive_path` into `destination_dir`.
///
/// Entries whose names would escape `destination_dir` are skipped.
///
/// # Errors
/// Returns `Error::CorruptArchive` when the archive cannot be opened or an entry cannot
/// be read, and `Error::Io` when writing an extracted file fails.
#[instrument]
pub fn extract(archive_path: &Path, destination_dir: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive_path).map_err(|e| corrupt(archive_path, e))?;
    let mut archive =
        zip::ZipArchive::new(BufReader::new(file)).map_err(|e| corrupt(archive_path, e))?;

    std::fs::create_dir_all(destination_dir)?;
    let mut extracted = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| corrupt(archive_path, e))?;
        let Some(relative) = entry.enclosed_name() else {
            debug!("Skipping unsafe archive entry {}", entry.name());
            continue;
        };
        let target = destination_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        std::io::copy(&mut entry, &mut out).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                corrupt(archive_path, e)
            } else {
                Error::Io(e)
            }
        })?;
        extracted.push(target);
    }

    info!(
        "Extracted {} file(s) from {}",
        extracted.len(),
        archive_path.display()
    );
    Ok(extracted)
}
