//! Shared plumbing for file-backed providers.
//!
//! Each provider reads its source exactly once, either at construction or (for
//! the dotenv provider) at its first load. Nothing here is ever re-read.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::BindError;

/// Stand-in path reported for sources parsed from an in-memory string.
pub(crate) const INLINE: &str = "<inline>";

pub(crate) fn inline_path() -> PathBuf {
    PathBuf::from(INLINE)
}

/// Read a whole source file. A missing file is an I/O error like any other:
/// a provider pointed at a path expects it to exist.
pub(crate) fn read_source(path: &Path) -> Result<String, BindError> {
    let content = std::fs::read_to_string(path).map_err(|e| BindError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), bytes = content.len(), "read config source");
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn reads_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.toml");
        fs::write(&path, "port = 1\n").unwrap();
        assert_eq!(read_source(&path).unwrap(), "port = 1\n");
    }

    #[test]
    fn missing_file_is_io_error_with_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");
        match read_source(&path) {
            Err(BindError::Io { path: p, .. }) => assert_eq!(p, path),
            other => panic!("Expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(read_source(dir.path()), Err(BindError::Io { .. })));
    }
}
