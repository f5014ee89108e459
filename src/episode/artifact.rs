use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::DownloadError;

/// List every audio file directly inside `dir`, oldest first.
///
/// `extensions` is the lowercase allow-list (without dots). Ties on
/// modification time are ordered by file name so the order is stable.
pub fn list_audio_files(
    dir: &Path,
    extensions: &[String],
) -> Result<Vec<PathBuf>, DownloadError> {
    let entries = std::fs::read_dir(dir).map_err(|e| DownloadError::ReadDirectoryFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut found: Vec<(SystemTime, PathBuf)> = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| DownloadError::ReadDirectoryFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        if !is_audio_file(&path, extensions) {
            continue;
        }

        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        found.push((modified, path));
    }

    found.sort();
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

/// Find the most recently modified audio file directly inside `dir`
pub fn find_latest_audio(
    dir: &Path,
    extensions: &[String],
) -> Result<Option<PathBuf>, DownloadError> {
    Ok(list_audio_files(dir, extensions)?.pop())
}

fn is_audio_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}
