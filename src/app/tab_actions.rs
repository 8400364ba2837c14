//! Opening, creating, selecting and closing tabs.

use std::path::Path;

use super::{title_for, TabLifecycleController};
use crate::app::tab_registry::TabSlot;
use crate::app::types::{CloseOutcome, ControllerError, UiEvent};
use crate::model::TabId;
use crate::services::fs::FsError;
use crate::view::save_dialog::SaveConfirmation;

impl TabLifecycleController {
    /// Open `path` in a tab.
    ///
    /// A path that is already open selects its tab instead. A path that does
    /// not exist yet opens as an empty document bound to it; saving creates
    /// the file.
    pub fn open_file(&mut self, path: &Path) -> Result<TabId, ControllerError> {
        let path = self.fs.resolve(path);

        if let Some(existing) = self.registry.find_by_file_path(&path) {
            tracing::debug!(path = %path.display(), tab = %existing, "already open, selecting");
            self.select_slot(TabSlot::Document(existing));
            return Ok(existing);
        }

        let content = match self.fs.read_all_text(&path) {
            Ok(text) => text,
            Err(FsError::NotFound(_)) => {
                tracing::info!(path = %path.display(), "opening new file");
                String::new()
            }
            Err(e) => {
                self.notify(format!("Could not open {}: {}", path.display(), e));
                return Err(ControllerError::IoFailure(e));
            }
        };

        let title = title_for(&path);
        let tab = match self.replaceable_tab() {
            Some(tab) => {
                let entry = self
                    .registry
                    .entry_mut(tab)
                    .ok_or(ControllerError::UnknownTab(tab))?;
                entry.session.open_file(path.clone(), &content)?;
                entry.title.clone_from(&title);
                tracing::debug!(%tab, "empty untitled tab reused");
                self.events.push(UiEvent::TitleChanged { tab, title });
                tab
            }
            None => {
                let mut session = self.new_session()?;
                session.open_file(path.clone(), &content)?;
                let tab = self.registry.create_tab(title.clone(), session);
                self.events.push(UiEvent::TabOpened { tab, title });
                self.events.push(UiEvent::TabSelected(TabSlot::Document(tab)));
                tab
            }
        };

        tracing::info!(path = %path.display(), %tab, "file opened");
        self.state.record_recent(&path);
        Ok(tab)
    }

    /// Replace a tab's content from the host side (an undo or reset performed
    /// outside the surface) and push it to the surface.
    ///
    /// Returns the new modified flag.
    pub fn replace_content(&mut self, tab: TabId, text: &str) -> Result<bool, ControllerError> {
        let session = self
            .registry
            .session_for_mut(TabSlot::Document(tab))
            .ok_or(ControllerError::UnknownTab(tab))?;
        let flipped = session.on_buffer_external_change(text)?;
        let modified = session.is_modified();
        tracing::debug!(%tab, modified, "content replaced by host");
        if flipped {
            self.events.push(UiEvent::ModifiedChanged { tab, modified });
        }
        Ok(modified)
    }

    /// Ask the chooser for a file and open it; `None` if the user cancelled
    pub fn open_with_chooser(&mut self) -> Result<Option<TabId>, ControllerError> {
        match self.chooser.choose_open() {
            Some(path) => self.open_file(&path).map(Some),
            None => Ok(None),
        }
    }

    /// Selected tab if it is an untitled, empty, clean document
    fn replaceable_tab(&self) -> Option<TabId> {
        if !self.state.config.editor.replace_empty_untitled {
            return None;
        }
        let tab = self.registry.selected_tab()?;
        let session = self.registry.session_for(TabSlot::Document(tab))?;
        session.buffer().is_pristine_untitled().then_some(tab)
    }

    /// Open an empty untitled document in a new tab
    pub fn new_tab(&mut self) -> Result<TabId, ControllerError> {
        let mut session = self.new_session()?;
        session.open("")?;

        self.untitled_counter += 1;
        let title = format!(
            "{}-{}",
            self.state.config.editor.untitled_prefix, self.untitled_counter
        );
        let tab = self.registry.create_tab(title.clone(), session);
        tracing::debug!(%tab, %title, "new tab");
        self.events.push(UiEvent::TabOpened { tab, title });
        self.events.push(UiEvent::TabSelected(TabSlot::Document(tab)));
        Ok(tab)
    }

    /// Select a slot of the strip. Selecting the "+" marker opens a new tab.
    pub fn select(&mut self, slot: TabSlot) -> Result<TabId, ControllerError> {
        match slot {
            TabSlot::AddTab => self.new_tab(),
            TabSlot::Document(tab) => {
                if !self.registry.contains(tab) {
                    return Err(ControllerError::UnknownTab(tab));
                }
                self.select_slot(slot);
                Ok(tab)
            }
        }
    }

    pub fn next_tab(&mut self) -> Option<TabId> {
        self.cycle_selection(1)
    }

    pub fn prev_tab(&mut self) -> Option<TabId> {
        self.cycle_selection(-1)
    }

    fn cycle_selection(&mut self, offset: isize) -> Option<TabId> {
        let tab = self.registry.cycle(offset)?;
        self.select_slot(TabSlot::Document(tab));
        Some(tab)
    }

    /// Close a tab. A clean tab goes away at once; a dirty one waits for the
    /// save confirmation (see `resolve_confirmation`).
    pub fn request_close(&mut self, tab: TabId) -> Result<CloseOutcome, ControllerError> {
        if self.pending_confirmation.is_some() {
            return Err(ControllerError::ConfirmationPending);
        }
        let entry = self
            .registry
            .entry(tab)
            .ok_or(ControllerError::UnknownTab(tab))?;

        if !entry.session.is_modified() {
            self.remove_tab(tab);
            return Ok(CloseOutcome::Removed);
        }

        let confirmation = SaveConfirmation::for_close(tab, &entry.title);
        tracing::debug!(%tab, "close pending on unsaved changes");
        self.close_pending.insert(tab);
        self.events.push(UiEvent::ConfirmationRequested {
            message: confirmation.message().to_string(),
        });
        self.pending_confirmation = Some(confirmation.clone());
        Ok(CloseOutcome::AwaitingConfirmation(confirmation))
    }

    /// Close the selected tab; no-op on the "+" marker
    pub fn close_current(&mut self) -> Result<Option<CloseOutcome>, ControllerError> {
        match self.registry.selected_tab() {
            Some(tab) => self.request_close(tab).map(Some),
            None => Ok(None),
        }
    }

    /// Delete the tab and release its surface
    pub(super) fn remove_tab(&mut self, tab: TabId) {
        self.close_pending.remove(&tab);
        let Some(mut entry) = self.registry.remove(tab) else {
            return;
        };
        entry.session.dispose();
        tracing::info!(%tab, title = %entry.title, "tab closed");
        self.events.push(UiEvent::TabRemoved(tab));
        self.events
            .push(UiEvent::TabSelected(self.registry.selected()));
    }
}
