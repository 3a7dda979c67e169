//! On-disk deal records, document backups and atomic writes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tempfile::NamedTempFile;

use crate::models::ResolvedDeal;
use crate::pipeline::PublishError;

const RECORDS_PREFIX: &str = "deals_";
const RECORDS_EXTENSION: &str = "json";

/// Timestamp format shared by record and backup filenames.
const FILE_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

/// Write `contents` to `path` through a sibling temp file.
///
/// The original file is only replaced once the new contents are fully on
/// disk, so a failed write leaves it intact. An existing file keeps its
/// permissions, and a symlinked path is written through to its target.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let target = match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => fs::canonicalize(path)?,
        _ => path.to_path_buf(),
    };
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    if let Ok(meta) = fs::metadata(&target) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}

/// Path of the record file for a batch resolved at `timestamp`.
pub fn records_path(data_dir: &Path, timestamp: DateTime<Local>) -> PathBuf {
    data_dir.join(format!(
        "{}{}.{}",
        RECORDS_PREFIX,
        timestamp.format(FILE_TIMESTAMP),
        RECORDS_EXTENSION
    ))
}

/// Persist a resolved batch as a pretty JSON array.
pub fn save_records(
    data_dir: &Path,
    deals: &[ResolvedDeal],
    timestamp: DateTime<Local>,
) -> Result<PathBuf, PublishError> {
    fs::create_dir_all(data_dir).map_err(|e| PublishError::records(data_dir, e))?;
    let path = records_path(data_dir, timestamp);
    let json = serde_json::to_string_pretty(deals).map_err(|e| PublishError::records(&path, e))?;
    write_atomic(&path, json.as_bytes()).map_err(|e| PublishError::records(&path, e))?;
    Ok(path)
}

pub fn load_records(path: &Path) -> Result<Vec<ResolvedDeal>, PublishError> {
    let contents = fs::read_to_string(path).map_err(|e| PublishError::records(path, e))?;
    serde_json::from_str(&contents).map_err(|e| PublishError::records(path, e))
}

/// Newest record file in `data_dir`, by timestamped name.
pub fn latest_records(data_dir: &Path) -> Option<PathBuf> {
    fs::read_dir(data_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().is_some_and(|ext| ext == RECORDS_EXTENSION)
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(RECORDS_PREFIX))
        })
        .max_by(|a, b| a.file_name().cmp(&b.file_name()))
}

/// Copy `document` to `<backup_dir>/<stem>_backup_<timestamp>.<ext>`.
pub fn backup_document(
    document: &Path,
    backup_dir: &Path,
    timestamp: DateTime<Local>,
) -> std::io::Result<PathBuf> {
    fs::create_dir_all(backup_dir)?;
    let stem = document
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let extension = document
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("html");
    let backup = backup_dir.join(format!(
        "{}_backup_{}.{}",
        stem,
        timestamp.format(FILE_TIMESTAMP),
        extension
    ));
    fs::copy(document, &backup)?;
    Ok(backup)
}
