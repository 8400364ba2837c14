//! One open document: a `DocumentBuffer` paired with the surface showing it.
//!
//! All content flow between the two goes through here. Surface edits update
//! the buffer; host-initiated replacements update the buffer and are pushed
//! into the surface, whose echo the bridge discards. A re-entrancy guard
//! keeps a push from feeding back into the buffer update path even if the
//! surface reports it synchronously.

use std::path::{Path, PathBuf};

use crate::model::DocumentBuffer;
use crate::services::fs::{FileSystem, FsError};
use crate::services::surface::bridge::PushOutcome;
use crate::services::surface::{BridgeEvent, EditingSurfaceBridge, ProtocolError, SurfaceError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Save attempted before a target path was chosen
    #[error("document has no file to save to")]
    NoTargetFile,

    #[error("save failed: {0}")]
    IoFailure(#[source] FsError),
}

#[derive(Debug)]
pub struct DocumentSession {
    buffer: DocumentBuffer,
    bridge: EditingSurfaceBridge,
    applying_host_change: bool,
}

impl DocumentSession {
    pub fn new(bridge: EditingSurfaceBridge) -> Self {
        Self {
            buffer: DocumentBuffer::new(),
            bridge,
            applying_host_change: false,
        }
    }

    pub fn buffer(&self) -> &DocumentBuffer {
        &self.buffer
    }

    pub fn bridge(&self) -> &EditingSurfaceBridge {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut EditingSurfaceBridge {
        &mut self.bridge
    }

    pub fn content(&self) -> &str {
        self.buffer.content()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.buffer.file_path()
    }

    pub fn is_modified(&self) -> bool {
        self.buffer.is_modified()
    }

    /// Load content that is not an edit and show it in the surface
    pub fn open(&mut self, initial_content: &str) -> Result<PushOutcome, SurfaceError> {
        self.buffer.reset(initial_content);
        self.push_guarded(initial_content)
    }

    /// Load a file's content and bind the session to it
    pub fn open_file(&mut self, path: PathBuf, content: &str) -> Result<PushOutcome, SurfaceError> {
        self.buffer.set_file_path(Some(path));
        self.open(content)
    }

    /// The user changed the surface buffer.
    ///
    /// Returns true when the modified flag flipped.
    pub fn on_surface_edit(&mut self, text: String) -> bool {
        if self.applying_host_change {
            tracing::trace!(surface = %self.bridge.id(), "edit during host push ignored");
            return false;
        }
        self.buffer.set_content(text)
    }

    /// The host replaces the content (e.g. an undo performed outside the surface).
    ///
    /// Returns true when the modified flag flipped.
    pub fn on_buffer_external_change(&mut self, text: &str) -> Result<bool, SurfaceError> {
        if self.applying_host_change {
            return Ok(false);
        }
        let flipped = self.buffer.set_content(text);
        self.push_guarded(text)?;
        Ok(flipped)
    }

    fn push_guarded(&mut self, text: &str) -> Result<PushOutcome, SurfaceError> {
        self.applying_host_change = true;
        let outcome = self.bridge.push_content(text);
        self.applying_host_change = false;
        outcome
    }

    /// Route one surface notification.
    ///
    /// Returns true when the modified flag flipped.
    pub fn handle_notification(&mut self, payload: &str) -> Result<bool, ProtocolError> {
        let mut flipped = false;
        for event in self.bridge.handle_notification(payload)? {
            match event {
                BridgeEvent::Ready => {}
                BridgeEvent::UserEdit(text) => flipped ^= self.on_surface_edit(text),
            }
        }
        Ok(flipped)
    }

    /// Write the content to the bound file.
    ///
    /// The content is snapshotted when the save begins; on failure the
    /// buffer is left exactly as it was.
    pub fn save(&mut self, fs: &dyn FileSystem) -> Result<(), SessionError> {
        let path = self
            .buffer
            .file_path()
            .map(Path::to_path_buf)
            .ok_or(SessionError::NoTargetFile)?;
        let snapshot = self.buffer.content().to_string();

        fs.write_all_text(&path, &snapshot)
            .map_err(SessionError::IoFailure)?;
        self.buffer.mark_saved_as(&snapshot);
        tracing::info!(path = %path.display(), "document saved");
        Ok(())
    }

    /// Bind to `path` and save; the previous binding is restored on failure
    pub fn save_as(&mut self, fs: &dyn FileSystem, path: PathBuf) -> Result<(), SessionError> {
        let previous = self.buffer.file_path().map(Path::to_path_buf);
        self.buffer.set_file_path(Some(path));
        let result = self.save(fs);
        if result.is_err() {
            self.buffer.set_file_path(previous);
        }
        result
    }

    /// Release the surface
    pub fn dispose(&mut self) {
        self.bridge.dispose();
    }
}
