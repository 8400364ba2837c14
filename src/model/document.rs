//! Host-side text of one open document.
//!
//! `DocumentBuffer` is the source of truth while the editing surface is still
//! initializing. The `modified` flag is never stored independently of the
//! content: every setter recomputes it against the last saved baseline, so
//! `is_modified() == (content != saved_baseline)` holds after each mutation.

use std::path::{Path, PathBuf};

/// Text, modification state and backing file of one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentBuffer {
    content: String,
    file_path: Option<PathBuf>,
    modified: bool,
    saved_baseline: String,
}

impl DocumentBuffer {
    /// Create an empty, untitled buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer loaded from `path` with the given content (not modified)
    pub fn from_file(path: PathBuf, content: String) -> Self {
        let mut buffer = Self {
            file_path: Some(path),
            ..Self::default()
        };
        buffer.reset(content);
        buffer
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn set_file_path(&mut self, path: Option<PathBuf>) {
        self.file_path = path;
    }

    /// Has the content diverged from the last saved baseline?
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn saved_baseline(&self) -> &str {
        &self.saved_baseline
    }

    /// Replace the content (an edit) and recompute `modified`.
    ///
    /// Returns true when the modified flag changed.
    pub fn set_content(&mut self, text: impl Into<String>) -> bool {
        let was_modified = self.modified;
        self.content = text.into();
        self.modified = self.content != self.saved_baseline;
        was_modified != self.modified
    }

    /// Record that the current content was written out.
    pub fn mark_saved(&mut self) {
        self.saved_baseline.clone_from(&self.content);
        self.modified = false;
    }

    /// Record that `text` was written out, leaving any newer content in place.
    ///
    /// A save writes a snapshot taken when it began; edits that arrived since
    /// then keep the buffer modified.
    pub fn mark_saved_as(&mut self, text: &str) {
        self.saved_baseline = text.to_string();
        self.modified = self.content != self.saved_baseline;
    }

    /// Load content that is not an edit (e.g. a file read).
    pub fn reset(&mut self, text: impl Into<String>) {
        self.content = text.into();
        self.saved_baseline.clone_from(&self.content);
        self.modified = false;
    }

    /// An untitled document nobody has typed into yet
    pub fn is_pristine_untitled(&self) -> bool {
        self.file_path.is_none() && self.content.is_empty() && !self.modified
    }
}
