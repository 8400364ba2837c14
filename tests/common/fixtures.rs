// Test fixtures: documents on disk for open/save workflows

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Small Turtle document used across the tests
pub const SAMPLE_TURTLE: &str = "@prefix ex: <http://ex.org/>.\n\nex:alice ex:knows ex:bob .\n";

/// A file in its own temporary directory, removed on drop
pub struct TestFixture {
    _temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestFixture {
    /// Create a file named `name` with `content`
    pub fn new(name: &str, content: &str) -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join(name);
        std::fs::write(&path, content)?;
        Ok(Self {
            _temp_dir: temp_dir,
            path,
        })
    }

    /// `sample.ttl` holding [`SAMPLE_TURTLE`]
    pub fn turtle() -> std::io::Result<Self> {
        Self::new("sample.ttl", SAMPLE_TURTLE)
    }

    pub fn dir(&self) -> &Path {
        self._temp_dir.path()
    }

    pub fn read(&self) -> String {
        std::fs::read_to_string(&self.path).unwrap()
    }
}
