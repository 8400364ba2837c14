//! In-process reference surface.
//!
//! Interprets the command scripts the way an embedded editor would and posts
//! notifications back through the bus, so the whole host side can run
//! without a real renderer (the CLI and the test suite both use it).
//! Handles let a driver play the user: type into a surface, finish its
//! initialization late, inspect what it received.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::protocol::{SurfaceCommand, SurfaceNotification};
use super::{SurfaceChannel, SurfaceError, SurfaceFactory, SurfaceId, SurfaceOutbox};

#[derive(Debug, Default)]
struct HeadlessState {
    content: String,
    init_requested: bool,
    ready: bool,
    disposed: bool,
    scripts: Vec<String>,
}

/// Driver-side view of one headless surface
#[derive(Debug, Clone)]
pub struct HeadlessSurfaceHandle {
    state: Rc<RefCell<HeadlessState>>,
    outbox: SurfaceOutbox,
}

impl HeadlessSurfaceHandle {
    pub fn id(&self) -> SurfaceId {
        self.outbox.surface()
    }

    /// Current text of the surface buffer
    pub fn content(&self) -> String {
        self.state.borrow().content.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    /// Every script received, in order
    pub fn scripts(&self) -> Vec<String> {
        self.state.borrow().scripts.clone()
    }

    /// Complete a deferred initialization
    pub fn finish_initialization(&self) {
        let mut state = self.state.borrow_mut();
        if state.init_requested && !state.ready && !state.disposed {
            state.ready = true;
            self.outbox.post(&SurfaceNotification::Ready);
        }
    }

    /// Simulate the user typing at the end of the buffer
    pub fn type_text(&self, text: &str) {
        let mut state = self.state.borrow_mut();
        state.content.push_str(text);
        self.post_user_change(&state);
    }

    /// Simulate the user replacing the whole buffer (select all + type)
    pub fn replace_text(&self, text: &str) {
        let mut state = self.state.borrow_mut();
        state.content = text.to_string();
        self.post_user_change(&state);
    }

    fn post_user_change(&self, state: &HeadlessState) {
        if state.disposed {
            return;
        }
        self.outbox.post(&SurfaceNotification::Changed {
            generation: None,
            text: state.content.clone(),
        });
    }
}

/// Headless implementation of the surface command channel
pub struct HeadlessSurface {
    handle: HeadlessSurfaceHandle,
    defer_ready: bool,
    tag_echoes: bool,
}

impl HeadlessSurface {
    pub fn new(outbox: SurfaceOutbox) -> Self {
        Self {
            handle: HeadlessSurfaceHandle {
                state: Rc::new(RefCell::new(HeadlessState::default())),
                outbox,
            },
            defer_ready: false,
            tag_echoes: true,
        }
    }

    pub fn handle(&self) -> HeadlessSurfaceHandle {
        self.handle.clone()
    }
}

impl SurfaceChannel for HeadlessSurface {
    fn initialize(&mut self) -> Result<(), SurfaceError> {
        let mut state = self.handle.state.borrow_mut();
        state.init_requested = true;
        state.scripts.push(SurfaceCommand::Initialize.encode());
        if !self.defer_ready {
            state.ready = true;
            self.handle.outbox.post(&SurfaceNotification::Ready);
        }
        Ok(())
    }

    fn send(&mut self, script: &str) -> Result<(), SurfaceError> {
        let id = self.handle.id();
        let mut state = self.handle.state.borrow_mut();
        if state.disposed {
            return Err(SurfaceError::Disposed(id));
        }
        state.scripts.push(script.to_string());

        let command = SurfaceCommand::decode(script)?;
        if !state.ready && command != SurfaceCommand::Dispose {
            return Err(SurfaceError::Rejected {
                id,
                reason: "surface is not initialized".to_string(),
            });
        }

        let outbox = &self.handle.outbox;
        match command {
            SurfaceCommand::Initialize => {}
            SurfaceCommand::SetContent { generation, text } => {
                state.content = text;
                // Editors report programmatic changes like any other change
                outbox.post(&SurfaceNotification::Changed {
                    generation: self.tag_echoes.then_some(generation),
                    text: state.content.clone(),
                });
                outbox.post(&SurfaceNotification::Applied { generation });
            }
            SurfaceCommand::GetContent { request_id } => {
                outbox.post(&SurfaceNotification::Content {
                    request_id,
                    text: state.content.clone(),
                });
            }
            SurfaceCommand::Dispose => state.disposed = true,
        }
        Ok(())
    }
}

/// Creates headless surfaces and keeps their handles reachable by id
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurfaceFactory {
    handles: Rc<RefCell<BTreeMap<SurfaceId, HeadlessSurfaceHandle>>>,
    defer_ready: bool,
    tag_echoes: bool,
}

impl HeadlessSurfaceFactory {
    pub fn new() -> Self {
        Self {
            tag_echoes: true,
            ..Self::default()
        }
    }

    /// Surfaces stay uninitialized until `finish_initialization` is called
    pub fn with_deferred_ready(mut self) -> Self {
        self.defer_ready = true;
        self
    }

    /// Echoes carry no generation, like editors that cannot tag changes
    pub fn with_untagged_echoes(mut self) -> Self {
        self.tag_echoes = false;
        self
    }

    pub fn handle(&self, id: SurfaceId) -> Option<HeadlessSurfaceHandle> {
        self.handles.borrow().get(&id).cloned()
    }

    /// Handle of the most recently created surface
    pub fn last_handle(&self) -> Option<HeadlessSurfaceHandle> {
        self.handles.borrow().values().next_back().cloned()
    }
}

impl SurfaceFactory for HeadlessSurfaceFactory {
    fn create(&mut self, id: SurfaceId, outbox: SurfaceOutbox) -> Box<dyn SurfaceChannel> {
        let mut surface = HeadlessSurface::new(outbox);
        surface.defer_ready = self.defer_ready;
        surface.tag_echoes = self.tag_echoes;
        self.handles.borrow_mut().insert(id, surface.handle());
        Box::new(surface)
    }
}
