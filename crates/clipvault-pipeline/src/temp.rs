use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Removes the file at `path` when dropped, whether or not it was ever
/// created. Covers early returns, panics and cancelled futures alike.
#[derive(Debug)]
pub struct ScopedPath {
    path: PathBuf,
}

impl ScopedPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedPath {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Removed temporary file");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.path.display(),
                    "Failed to remove temporary file"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_removes_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.mp4.processing");
        std::fs::write(&path, b"data").unwrap();

        {
            let guard = ScopedPath::new(&path);
            assert_eq!(guard.path(), path);
        }

        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_is_fine() {
        let dir = tempdir().unwrap();
        drop(ScopedPath::new(dir.path().join("never-created")));
    }
}
