//! File helpers: JSON load/save and cleanup of undersized files

use crate::error::Result;
use crate::types::CleanupStats;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// True when `path` exists and is larger than `min_size` bytes
pub fn file_exists_and_not_empty(path: &Path, min_size: u64) -> bool {
    fs::metadata(path).map(|m| m.len() > min_size).unwrap_or(false)
}

/// Write `data` as pretty-printed UTF-8 JSON
pub fn save_json<T: Serialize + ?Sized>(data: &T, path: &Path) -> Result<()> {
    log::info!("Saving data to {}", path.display());
    let content = serde_json::to_string_pretty(data)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    log::info!("Loading data from {}", path.display());
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Recursively delete files under `dir` whose name ends with `ext` and whose
/// size is below `min_size` bytes.
pub fn del_by_size(dir: &Path, ext: &str, min_size: u64) -> Result<CleanupStats> {
    let pattern = format!(
        "{}/**/*{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        glob::Pattern::escape(ext)
    );
    let mut stats = CleanupStats::default();

    for path in glob::glob(&pattern)?.flatten() {
        let metadata = match fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            _ => continue,
        };
        let size = metadata.len();
        stats.total += 1;
        stats.total_size += size;

        if size < min_size {
            fs::remove_file(&path)?;
            log::debug!("removed {} ({} bytes)", path.display(), size);
            stats.deleted += 1;
            stats.deleted_size += size;
        }
    }

    log::info!(
        "Cleaned {}: {} of {} files removed ({} bytes)",
        dir.display(),
        stats.deleted,
        stats.total,
        stats.deleted_size
    );
    Ok(stats)
}
