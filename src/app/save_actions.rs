//! Saving, the save confirmation, quitting and engine runs.

use super::{title_for, TabLifecycleController};
use crate::app::tab_registry::TabSlot;
use crate::app::types::{
    CloseOutcome, ConfirmationOutcome, ControllerError, QuitOutcome, UiEvent,
};
use crate::model::TabId;
use crate::services::engine::EngineAction;
use crate::view::save_dialog::{ConfirmationSubject, SaveChoice, SaveConfirmation};

impl TabLifecycleController {
    /// Save a tab to its file; untitled tabs ask the chooser for one.
    ///
    /// Failures are reported as a notification and leave the tab as it was.
    pub fn save_tab(&mut self, tab: TabId) -> Result<(), ControllerError> {
        let entry = self
            .registry
            .entry(tab)
            .ok_or(ControllerError::UnknownTab(tab))?;
        let was_modified = entry.session.is_modified();
        let title = entry.title.clone();

        let result = if entry.session.file_path().is_some() {
            let fs = self.fs.as_ref();
            match self.registry.entry_mut(tab) {
                Some(entry) => entry.session.save(fs).map_err(ControllerError::from),
                None => Err(ControllerError::UnknownTab(tab)),
            }
        } else {
            self.save_untitled(tab, &title)
        };

        match result {
            Ok(()) => {
                if was_modified {
                    self.events.push(UiEvent::ModifiedChanged {
                        tab,
                        modified: false,
                    });
                }
                Ok(())
            }
            Err(e) => {
                self.notify(format!("Could not save {title}: {e}"));
                Err(e)
            }
        }
    }

    fn save_untitled(&mut self, tab: TabId, title: &str) -> Result<(), ControllerError> {
        let suggested = format!("{title}.{}", self.state.config.editor.default_extension);
        let path = self
            .chooser
            .choose_save(Some(&suggested))
            .ok_or(ControllerError::NoTargetFile)?;
        let path = self.fs.resolve(&path);

        if let Some(other) = self.registry.find_by_file_path(&path) {
            if other != tab {
                return Err(ControllerError::PathAlreadyOpen(path));
            }
        }

        let fs = self.fs.as_ref();
        let entry = self
            .registry
            .entry_mut(tab)
            .ok_or(ControllerError::UnknownTab(tab))?;
        entry.session.save_as(fs, path.clone())?;

        let title = title_for(&path);
        entry.title.clone_from(&title);
        self.events.push(UiEvent::TitleChanged { tab, title });
        self.state.record_recent(&path);
        Ok(())
    }

    /// Save the selected tab. Returns false on the "+" marker.
    pub fn save_current(&mut self) -> Result<bool, ControllerError> {
        match self.registry.selected_tab() {
            Some(tab) => self.save_tab(tab).map(|()| true),
            None => Ok(false),
        }
    }

    /// Apply the user's answer to the open confirmation
    pub fn resolve_confirmation(
        &mut self,
        choice: SaveChoice,
    ) -> Result<ConfirmationOutcome, ControllerError> {
        let confirmation = self
            .pending_confirmation
            .take()
            .ok_or(ControllerError::NoPendingConfirmation)?;
        tracing::debug!(?choice, "confirmation resolved");

        match confirmation.subject() {
            ConfirmationSubject::CloseTab(tab) => {
                self.finish_close(*tab, choice).map(ConfirmationOutcome::Close)
            }
            ConfirmationSubject::Quit(tabs) => {
                self.finish_quit(tabs, choice).map(ConfirmationOutcome::Quit)
            }
        }
    }

    fn finish_close(
        &mut self,
        tab: TabId,
        choice: SaveChoice,
    ) -> Result<CloseOutcome, ControllerError> {
        self.close_pending.remove(&tab);
        if !self.registry.contains(tab) {
            return Err(ControllerError::UnknownTab(tab));
        }

        match choice {
            SaveChoice::Save => {
                // A failed save keeps the tab open and dirty
                self.save_tab(tab)?;
                self.remove_tab(tab);
                Ok(CloseOutcome::Removed)
            }
            SaveChoice::DiscardAndClose => {
                self.remove_tab(tab);
                Ok(CloseOutcome::Removed)
            }
            SaveChoice::Cancel => {
                self.select_slot(TabSlot::Document(tab));
                Ok(CloseOutcome::Kept)
            }
        }
    }

    /// Quit, asking once about every dirty tab
    pub fn request_quit(&mut self) -> Result<QuitOutcome, ControllerError> {
        if self.pending_confirmation.is_some() {
            return Err(ControllerError::ConfirmationPending);
        }
        let (tabs, names): (Vec<TabId>, Vec<String>) = self
            .registry
            .iter()
            .filter(|entry| entry.session.is_modified())
            .map(|entry| (entry.id, entry.title.clone()))
            .unzip();

        if tabs.is_empty() {
            self.quit();
            return Ok(QuitOutcome::Quit);
        }

        let confirmation = SaveConfirmation::for_quit(tabs, &names);
        self.events.push(UiEvent::ConfirmationRequested {
            message: confirmation.message().to_string(),
        });
        self.pending_confirmation = Some(confirmation.clone());
        Ok(QuitOutcome::AwaitingConfirmation(confirmation))
    }

    fn finish_quit(
        &mut self,
        tabs: &[TabId],
        choice: SaveChoice,
    ) -> Result<QuitOutcome, ControllerError> {
        match choice {
            SaveChoice::Save => {
                for &tab in tabs {
                    if self.registry.contains(tab) {
                        // Any failure aborts the quit
                        self.save_tab(tab)?;
                    }
                }
                self.quit();
                Ok(QuitOutcome::Quit)
            }
            SaveChoice::DiscardAndClose => {
                self.quit();
                Ok(QuitOutcome::Quit)
            }
            SaveChoice::Cancel => Ok(QuitOutcome::Cancelled),
        }
    }

    fn quit(&mut self) {
        tracing::info!(open_tabs = self.registry.len(), "quit requested");
        self.quit_requested = true;
        self.events.push(UiEvent::QuitRequested);
    }

    /// Hand a snapshot of the tab's content to the engine. Returns the job id;
    /// the result arrives through `pump` as `UiEvent::EngineFinished`.
    pub fn run_engine(&mut self, tab: TabId, action: EngineAction) -> Result<u64, ControllerError> {
        let text = self
            .session(tab)
            .ok_or(ControllerError::UnknownTab(tab))?
            .content()
            .to_string();
        let rules = self.state.enabled_rules();

        match self.engine.as_mut() {
            Some(engine) => {
                let job_id = engine.dispatch(tab, action, text, rules);
                self.engine_jobs.insert(job_id);
                Ok(job_id)
            }
            None => {
                self.notify("No engine available");
                Err(ControllerError::EngineUnavailable)
            }
        }
    }

    /// Run the engine on the selected tab; no-op on the "+" marker
    pub fn run_current(&mut self) -> Result<Option<u64>, ControllerError> {
        match self.registry.selected_tab() {
            Some(tab) => self.run_engine(tab, EngineAction::Run).map(Some),
            None => Ok(None),
        }
    }
}
