//! External formatter
//!
//! Thin wrapper around `dart format`. The executable is located by a fixed
//! search: every `PATH` entry, then `$DART_SDK/bin`, `$FLUTTER_ROOT/bin`,
//! `/usr/lib/dart/bin` and `/usr/local/bin`.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

const EXECUTABLE: &str = if cfg!(windows) { "dart.exe" } else { "dart" };

const FIXED_DIRECTORIES: &[&str] = &["/usr/lib/dart/bin", "/usr/local/bin"];

/// Errors that can occur while running the formatter
#[derive(Debug, Error)]
pub enum FormatError {
    /// No executable in any searched directory
    #[error("Could not find `{executable}` (searched {searched} directories)")]
    NotFound { executable: &'static str, searched: usize },

    /// The process could not be started
    #[error("Failed to run formatter: {0}")]
    Spawn(#[from] std::io::Error),

    /// The process exited unsuccessfully
    #[error("Formatter exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// A located formatter executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DartFormatter {
    executable: PathBuf,
}

impl DartFormatter {
    /// Use a specific executable.
    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Search the environment for the executable.
    pub fn locate() -> Result<Self, FormatError> {
        let directories = search_directories(
            env::var_os("PATH").as_deref().map(|p| env::split_paths(p).collect()).unwrap_or_default(),
            env::var_os("DART_SDK").map(PathBuf::from),
            env::var_os("FLUTTER_ROOT").map(PathBuf::from),
        );
        let searched = directories.len();
        find_in(&directories).map(Self::with_executable).ok_or(FormatError::NotFound {
            executable: EXECUTABLE,
            searched,
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Format every file under `dir` in place. Blocks until the process exits.
    pub fn format(&self, dir: &Path) -> Result<(), FormatError> {
        tracing::debug!(executable = %self.executable.display(), dir = %dir.display(), "running formatter");
        let output = Command::new(&self.executable).arg("format").arg(dir).output()?;
        if !output.status.success() {
            return Err(FormatError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Directories to search, in order.
fn search_directories(path: Vec<PathBuf>, dart_sdk: Option<PathBuf>, flutter_root: Option<PathBuf>) -> Vec<PathBuf> {
    let mut directories = path;
    directories.extend(dart_sdk.map(|sdk| sdk.join("bin")));
    directories.extend(flutter_root.map(|root| root.join("bin")));
    directories.extend(FIXED_DIRECTORIES.iter().map(PathBuf::from));
    directories
}

fn find_in(directories: &[PathBuf]) -> Option<PathBuf> {
    directories
        .iter()
        .map(|dir| dir.join(EXECUTABLE))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_order() {
        let dirs = search_directories(
            vec![PathBuf::from("/a"), PathBuf::from("/b")],
            Some(PathBuf::from("/sdk")),
            None,
        );
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/a"),
                PathBuf::from("/b"),
                PathBuf::from("/sdk/bin"),
                PathBuf::from("/usr/lib/dart/bin"),
                PathBuf::from("/usr/local/bin"),
            ]
        );
    }

    #[test]
    fn test_first_match_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join(EXECUTABLE), "").unwrap();
        let found = find_in(&[first.path().to_path_buf(), second.path().to_path_buf()]);
        assert_eq!(found, Some(second.path().join(EXECUTABLE)));
    }

    #[test]
    fn test_missing_executable_fails_to_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let formatter = DartFormatter::with_executable(dir.path().join("no-such-dart"));
        assert!(matches!(formatter.format(dir.path()), Err(FormatError::Spawn(_))));
    }
}
