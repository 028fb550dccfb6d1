//! Path utilities

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Get home directory
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Expand a leading `~` to the home directory, otherwise make the path
/// absolute against the current directory.
pub fn expand_dir(dir: &str) -> Result<PathBuf> {
    if let Some(rest) = dir.strip_prefix('~') {
        if let Some(home) = home_dir() {
            let rest = rest.trim_start_matches(['/', '\\']);
            return Ok(if rest.is_empty() { home } else { home.join(rest) });
        }
    }
    Ok(std::path::absolute(Path::new(dir))?)
}

/// Path of `file` next to the running executable
pub fn expand_config_file(file: &str) -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(dir.join(file))
}

/// Default location of the status database
pub fn default_status_db() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("stool").join("status.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_dir("~").unwrap(), home);
            assert_eq!(expand_dir("~/data/x").unwrap(), home.join("data").join("x"));
        }
    }

    #[test]
    fn relative_paths_become_absolute() {
        let expanded = expand_dir("some/dir").unwrap();
        assert!(expanded.is_absolute());
        assert!(expanded.ends_with("some/dir"));
    }

    #[test]
    fn config_file_sits_next_to_the_executable() {
        let path = expand_config_file("stool.json").unwrap();
        assert_eq!(path.file_name().unwrap(), "stool.json");
        assert_eq!(path.parent(), std::env::current_exe().unwrap().parent());
    }

    #[test]
    fn status_db_lives_under_stool() {
        if let Some(path) = default_status_db() {
            assert!(path.ends_with("stool/status.db"));
        }
    }
}
