mod save_actions;
pub mod state;
mod tab_actions;
pub mod tab_registry;
pub mod types;

use std::collections::HashSet;
use std::path::Path;

use crate::input::keybindings::{Action, Keymap};
use crate::model::{DocumentSession, TabId};
use crate::services::chooser::FileChooser;
use crate::services::engine::{EngineDispatcher, EngineMessage};
use crate::services::fs::FileSystem;
use crate::services::surface::{
    EditingSurfaceBridge, SurfaceBus, SurfaceFactory, SurfaceId, SurfaceMessage,
};
use crate::view::save_dialog::SaveConfirmation;
use crate::view::tabs::{tab_labels, TabLabel};

pub use state::AppState;
pub use tab_registry::{TabEntry, TabRegistry, TabSlot};
pub use types::{
    CloseOutcome, ConfirmationOutcome, ControllerError, QuitOutcome, TabState, UiEvent,
};

use crossterm::event::KeyEvent;

/// External collaborators the controller drives
pub struct Collaborators {
    pub surfaces: Box<dyn SurfaceFactory>,
    pub fs: Box<dyn FileSystem>,
    pub chooser: Box<dyn FileChooser>,
    /// `None` disables engine runs
    pub engine: Option<EngineDispatcher>,
}

/// Orchestrates tabs: opening, saving, closing and the confirmation that
/// guards unsaved changes.
///
/// Single-threaded. Surface notifications and engine results arrive over
/// channels and are applied in `pump`, so every state change happens on
/// the caller's thread.
pub struct TabLifecycleController {
    registry: TabRegistry,
    state: AppState,

    bus: SurfaceBus,
    surfaces: Box<dyn SurfaceFactory>,
    fs: Box<dyn FileSystem>,
    chooser: Box<dyn FileChooser>,
    engine: Option<EngineDispatcher>,
    /// Dispatched runs whose result has not come back yet
    engine_jobs: HashSet<u64>,

    keymap: Keymap,

    /// At most one confirmation is open at a time
    pending_confirmation: Option<SaveConfirmation>,
    close_pending: HashSet<TabId>,

    events: Vec<UiEvent>,
    next_surface_id: u64,
    untitled_counter: u64,
    quit_requested: bool,
}

impl TabLifecycleController {
    pub fn new(state: AppState, collaborators: Collaborators) -> Self {
        let keymap = Keymap::new(&state.config);
        Self {
            registry: TabRegistry::new(),
            state,
            bus: SurfaceBus::new(),
            surfaces: collaborators.surfaces,
            fs: collaborators.fs,
            chooser: collaborators.chooser,
            engine: collaborators.engine,
            engine_jobs: HashSet::new(),
            keymap,
            pending_confirmation: None,
            close_pending: HashSet::new(),
            events: Vec::new(),
            next_surface_id: 1,
            untitled_counter: 0,
            quit_requested: false,
        }
    }

    pub fn registry(&self) -> &TabRegistry {
        &self.registry
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn session(&self, tab: TabId) -> Option<&DocumentSession> {
        self.registry.session_for(TabSlot::Document(tab))
    }

    pub fn title(&self, tab: TabId) -> Option<&str> {
        self.registry.entry(tab).map(|e| e.title.as_str())
    }

    pub fn selected(&self) -> TabSlot {
        self.registry.selected()
    }

    pub fn pending_confirmation(&self) -> Option<&SaveConfirmation> {
        self.pending_confirmation.as_ref()
    }

    /// Engine runs still in flight, including those of closed tabs
    pub fn pending_engine_jobs(&self) -> usize {
        self.engine_jobs.len()
    }

    pub fn is_quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn tab_state(&self, tab: TabId) -> Option<TabState> {
        let session = self.session(tab)?;
        Some(if self.close_pending.contains(&tab) {
            TabState::ClosePending
        } else if session.is_modified() {
            TabState::Dirty
        } else {
            TabState::Clean
        })
    }

    /// Labels of the tab strip, marker last
    pub fn tab_labels(&self) -> Vec<TabLabel> {
        tab_labels(&self.registry)
    }

    pub fn drain_events(&mut self) -> Vec<UiEvent> {
        std::mem::take(&mut self.events)
    }

    /// Apply everything the surfaces and the engine have posted.
    ///
    /// Handling a notification can make a surface post more (a queued push
    /// sent on `ready`), so the bus is drained until it stays empty.
    /// Returns the number of messages processed.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        loop {
            let messages = self.bus.try_recv_all();
            if messages.is_empty() {
                break;
            }
            processed += messages.len();
            for message in messages {
                self.route_surface_message(message);
            }
        }

        let engine_messages = self
            .engine
            .as_ref()
            .map(EngineDispatcher::try_recv_all)
            .unwrap_or_default();
        processed += engine_messages.len();
        for message in engine_messages {
            self.handle_engine_message(message);
        }
        processed
    }

    fn route_surface_message(&mut self, message: SurfaceMessage) {
        let Some(tab) = self.registry.find_by_surface(message.surface) else {
            tracing::trace!(surface = %message.surface, "message for released surface dropped");
            return;
        };
        let Some(entry) = self.registry.entry_mut(tab) else {
            return;
        };
        match entry.session.handle_notification(&message.payload) {
            Ok(true) => {
                let modified = entry.session.is_modified();
                tracing::debug!(%tab, modified, "modified flag changed");
                self.events.push(UiEvent::ModifiedChanged { tab, modified });
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(%tab, surface = %message.surface, "bad surface notification: {}", e);
            }
        }
    }

    fn handle_engine_message(&mut self, message: EngineMessage) {
        let (tab, job_id, result) = match message {
            EngineMessage::Finished {
                job_id,
                tab,
                report,
            } => (tab, job_id, Ok(report)),
            EngineMessage::Failed { job_id, tab, error } => (tab, job_id, Err(error)),
        };
        self.engine_jobs.remove(&job_id);
        if !self.registry.contains(tab) {
            tracing::debug!(job_id, %tab, "engine result for closed tab dropped");
            return;
        }
        if let Err(error) = &result {
            self.notify(format!("Engine failed: {error}"));
        }
        self.events.push(UiEvent::EngineFinished {
            tab,
            job_id,
            result,
        });
    }

    /// Route a key press: an open confirmation takes every key, otherwise
    /// global shortcuts apply. Returns true when the key was consumed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> Result<bool, ControllerError> {
        if let Some(confirmation) = &self.pending_confirmation {
            if let Some(choice) = confirmation.handle_key(key) {
                self.resolve_confirmation(choice)?;
            }
            return Ok(true);
        }

        let Some(action) = self.keymap.resolve(key) else {
            return Ok(false);
        };
        tracing::debug!(action = action.name(), "shortcut");
        match action {
            Action::Save => {
                self.save_current()?;
            }
            Action::CloseTab => {
                self.close_current()?;
            }
            Action::NewTab => {
                self.new_tab()?;
            }
            Action::Open => {
                self.open_with_chooser()?;
            }
            Action::NextTab => {
                self.next_tab();
            }
            Action::PrevTab => {
                self.prev_tab();
            }
            Action::Quit => {
                self.request_quit()?;
            }
            Action::RunEngine => {
                self.run_current()?;
            }
        }
        Ok(true)
    }

    fn new_session(&mut self) -> Result<DocumentSession, ControllerError> {
        let id = SurfaceId(self.next_surface_id);
        self.next_surface_id += 1;
        let channel = self.surfaces.create(id, self.bus.outbox(id));
        let bridge = EditingSurfaceBridge::new(id, channel)?;
        Ok(DocumentSession::new(bridge))
    }

    fn notify(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.events.push(UiEvent::Notification(message));
    }

    fn select_slot(&mut self, slot: TabSlot) {
        if self.registry.select(slot) {
            self.events.push(UiEvent::TabSelected(slot));
        }
    }
}

/// Tab title for a file: its name, or the whole path if it has none
fn title_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
