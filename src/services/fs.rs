//! File persistence collaborator.
//!
//! Only whole-file text reads and writes are needed. Writes are atomic:
//! write to a temp file next to the target, then rename, so a failed save
//! never leaves a truncated document on disk.

use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            FsError::NotFound(path.to_path_buf())
        } else {
            FsError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Whole-file text persistence
pub trait FileSystem {
    fn read_all_text(&self, path: &Path) -> Result<String, FsError>;

    fn write_all_text(&self, path: &Path, text: &str) -> Result<(), FsError>;

    /// Resolve a user-supplied path to the form used as a document identity
    fn resolve(&self, path: &Path) -> PathBuf {
        resolve_path(path)
    }
}

/// The real disk
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn read_all_text(&self, path: &Path) -> Result<String, FsError> {
        std::fs::read_to_string(path).map_err(|e| FsError::from_io(path, e))
    }

    fn write_all_text(&self, path: &Path, text: &str) -> Result<(), FsError> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = dir.join(format!(".{file_name}.{}.tmp", std::process::id()));

        // Read before writing so the replaced file keeps its permissions
        let original_metadata = std::fs::metadata(path).ok();

        let result = (|| {
            let mut file = std::fs::File::create(&temp_path)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
            drop(file);
            if let Some(meta) = &original_metadata {
                std::fs::set_permissions(&temp_path, meta.permissions())?;
            }
            std::fs::rename(&temp_path, path)
        })();

        if let Err(e) = result {
            let _ = std::fs::remove_file(&temp_path);
            return Err(FsError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
        tracing::debug!(path = %path.display(), bytes = text.len(), "file written");
        Ok(())
    }
}

/// Canonicalize when the path exists, otherwise make it absolute and
/// normalize `.`/`..` lexically so two spellings of a new file still match.
pub fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    // The parent may exist even if the file does not
    if let (Some(parent), Some(name)) = (absolute.parent(), absolute.file_name()) {
        if let Ok(parent) = std::fs::canonicalize(parent) {
            return parent.join(name);
        }
    }

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
