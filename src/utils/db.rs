//! Safe SQLite database reading utilities
//! Uses snapshot strategy so a live writer never blocks a reader

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

/// Create a temporary snapshot of a SQLite database for safe reading.
/// `-wal` and `-shm` side files are copied along when present.
pub fn create_db_snapshot(source_path: &Path) -> Result<NamedTempFile> {
    if !source_path.exists() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("database file does not exist: {}", source_path.display()),
        )));
    }

    let temp_file = tempfile::Builder::new()
        .prefix("stool-snapshot-")
        .suffix(".db")
        .tempfile()?;

    fs::copy(source_path, temp_file.path())?;

    let source_str = source_path.to_string_lossy();
    let temp_str = temp_file.path().to_string_lossy();

    for side in ["-wal", "-shm"] {
        let side_path = format!("{}{}", source_str, side);
        if Path::new(&side_path).exists() {
            if let Err(e) = fs::copy(&side_path, format!("{}{}", temp_str, side)) {
                log::warn!("could not copy {}: {}", side_path, e);
            }
        }
    }

    Ok(temp_file)
}

/// Run `f` against a snapshot of the database. The temporary files are
/// removed when the snapshot is dropped at the end of this call.
pub fn with_db_snapshot<F, T>(source_path: &Path, f: F) -> Result<T>
where
    F: FnOnce(&Path) -> Result<T>,
{
    let snapshot = create_db_snapshot(source_path)?;
    let result = f(snapshot.path());

    // WAL side files are not owned by the NamedTempFile
    let snap_str = snapshot.path().to_string_lossy().to_string();
    for side in ["-wal", "-shm"] {
        let _ = fs::remove_file(format!("{}{}", snap_str, side));
    }

    result
}
