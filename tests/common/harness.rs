// TabsTestHarness - drives the tab controller against headless surfaces and
// a real temporary directory

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use graphpad::app::{
    AppState, Collaborators, TabLifecycleController, TabSlot, TabState, UiEvent,
};
use graphpad::config::Config;
use graphpad::model::TabId;
use graphpad::services::chooser::QueuedChooser;
use graphpad::services::engine::{EngineDispatcher, SemanticEngine};
use graphpad::services::fs::LocalFileSystem;
use graphpad::services::surface::{HeadlessSurfaceFactory, HeadlessSurfaceHandle};
use graphpad::view::tabs::render_strip;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Install a test-friendly tracing subscriber (RUST_LOG controls the level)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct TabsTestHarness {
    controller: TabLifecycleController,
    surfaces: HeadlessSurfaceFactory,
    chooser: QueuedChooser,
    temp_dir: TempDir,
    /// Every event drained so far, in order
    events: Vec<UiEvent>,
}

/// Builder for harness variations
#[derive(Default)]
pub struct HarnessOptions {
    pub config: Config,
    pub deferred_surfaces: bool,
    pub untagged_echoes: bool,
    pub engine: Option<Arc<dyn SemanticEngine>>,
}

impl TabsTestHarness {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_options(HarnessOptions::default())
    }

    pub fn with_config(config: Config) -> anyhow::Result<Self> {
        Self::with_options(HarnessOptions {
            config,
            ..HarnessOptions::default()
        })
    }

    pub fn with_options(options: HarnessOptions) -> anyhow::Result<Self> {
        init_tracing();
        let temp_dir = TempDir::new()?;

        let mut surfaces = HeadlessSurfaceFactory::new();
        if options.deferred_surfaces {
            surfaces = surfaces.with_deferred_ready();
        }
        if options.untagged_echoes {
            surfaces = surfaces.with_untagged_echoes();
        }
        let chooser = QueuedChooser::new().with_base_dir(temp_dir.path());
        let engine = options.engine.map(EngineDispatcher::new).transpose()?;

        let controller = TabLifecycleController::new(
            AppState::new(options.config),
            Collaborators {
                surfaces: Box::new(surfaces.clone()),
                fs: Box::new(LocalFileSystem),
                chooser: Box::new(chooser.clone()),
                engine,
            },
        );

        Ok(Self {
            controller,
            surfaces,
            chooser,
            temp_dir,
            events: Vec::new(),
        })
    }

    pub fn controller(&self) -> &TabLifecycleController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut TabLifecycleController {
        &mut self.controller
    }

    pub fn chooser(&self) -> &QueuedChooser {
        &self.chooser
    }

    /// Path inside the harness directory
    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn read_file(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.path(name)).ok()
    }

    /// Open a file of the harness directory and let its surface settle
    pub fn open(&mut self, name: &str) -> TabId {
        let path = self.path(name);
        let tab = self.controller.open_file(&path).unwrap();
        self.pump();
        tab
    }

    pub fn new_tab(&mut self) -> TabId {
        let tab = self.controller.new_tab().unwrap();
        self.pump();
        tab
    }

    pub fn selected_tab(&self) -> Option<TabId> {
        self.controller.registry().selected_tab()
    }

    /// Headless surface behind a tab
    pub fn surface(&self, tab: TabId) -> HeadlessSurfaceHandle {
        let id = self.controller.session(tab).unwrap().bridge().id();
        self.surfaces.handle(id).unwrap()
    }

    /// Type as the user into a tab's surface
    pub fn type_into(&mut self, tab: TabId, text: &str) {
        self.surface(tab).type_text(text);
        self.pump();
    }

    /// Type into the selected tab
    pub fn type_text(&mut self, text: &str) {
        let tab = self.selected_tab().expect("no document tab selected");
        self.type_into(tab, text);
    }

    /// Press a key; returns whether the controller consumed it
    pub fn send_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let consumed = self
            .controller
            .handle_key(&KeyEvent::new(code, modifiers))
            .unwrap_or(true);
        self.pump();
        consumed
    }

    pub fn ctrl(&mut self, c: char) -> bool {
        self.send_key(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Deliver pending surface and engine messages
    pub fn pump(&mut self) {
        self.controller.pump();
        self.events.extend(self.controller.drain_events());
    }

    /// Events since the last call
    pub fn take_events(&mut self) -> Vec<UiEvent> {
        self.pump();
        std::mem::take(&mut self.events)
    }

    pub fn strip(&self) -> String {
        render_strip(&self.controller.tab_labels())
    }

    pub fn content(&self, tab: TabId) -> String {
        self.controller.session(tab).unwrap().content().to_string()
    }

    pub fn assert_tab_count(&self, expected: usize) {
        assert_eq!(
            self.controller.registry().len(),
            expected,
            "tab strip: {}",
            self.strip()
        );
    }

    pub fn assert_state(&self, tab: TabId, expected: TabState) {
        assert_eq!(self.controller.tab_state(tab), Some(expected));
    }

    pub fn assert_selected(&self, expected: TabSlot) {
        assert_eq!(self.controller.selected(), expected);
    }

    pub fn assert_marker_last(&self) {
        assert_eq!(
            self.controller.registry().visual_order().last(),
            Some(&TabSlot::AddTab)
        );
    }
}
