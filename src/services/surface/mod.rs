//! Embedded editing surfaces.
//!
//! A surface is an opaque, independently rendered text editor (an embedded
//! web view, a native widget, an out-of-process component). The host can
//! only drive it through a string command channel and learns about its state
//! through notifications that arrive later on the control thread.
//!
//! Architecture:
//! - `SurfaceChannel` is the host's handle: `initialize()` and `send(script)`
//! - Surfaces post notifications onto a shared `SurfaceBus`, tagged with their id
//! - The controller drains the bus each tick and routes notifications to the
//!   owning `EditingSurfaceBridge`
//!
//! Nothing here touches document state off the control thread.

pub mod bridge;
pub mod headless;
pub mod protocol;

use std::fmt;
use std::sync::mpsc;

pub use bridge::{BridgeEvent, EditingSurfaceBridge};
pub use headless::{HeadlessSurface, HeadlessSurfaceFactory, HeadlessSurfaceHandle};
pub use protocol::{ProtocolError, SurfaceCommand, SurfaceNotification};

/// Unique identifier of one surface instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Errors raised by the command channel itself
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("{0} has been disposed")]
    Disposed(SurfaceId),

    #[error("{id} rejected command: {reason}")]
    Rejected { id: SurfaceId, reason: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Host-side handle to one embedded surface
pub trait SurfaceChannel {
    /// Request initialization; completion is signalled by a `ready` notification
    fn initialize(&mut self) -> Result<(), SurfaceError>;

    /// Send one encoded command (fire-and-forget)
    fn send(&mut self, script: &str) -> Result<(), SurfaceError>;
}

/// Creates surfaces for new tabs
pub trait SurfaceFactory {
    fn create(&mut self, id: SurfaceId, outbox: SurfaceOutbox) -> Box<dyn SurfaceChannel>;
}

/// A raw notification as posted by a surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceMessage {
    pub surface: SurfaceId,
    pub payload: String,
}

/// Sending half handed to a surface so it can post notifications
#[derive(Debug, Clone)]
pub struct SurfaceOutbox {
    surface: SurfaceId,
    sender: mpsc::Sender<SurfaceMessage>,
}

impl SurfaceOutbox {
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// Post a notification; dropped silently once the host side is gone
    pub fn post(&self, notification: &SurfaceNotification) {
        let _ = self.sender.send(SurfaceMessage {
            surface: self.surface,
            payload: notification.encode(),
        });
    }

    /// Post an already-encoded payload
    pub fn post_raw(&self, payload: impl Into<String>) {
        let _ = self.sender.send(SurfaceMessage {
            surface: self.surface,
            payload: payload.into(),
        });
    }
}

/// Channel carrying notifications from every surface to the control thread
///
/// Unbounded: notifications are small and drained every tick.
pub struct SurfaceBus {
    sender: mpsc::Sender<SurfaceMessage>,
    receiver: mpsc::Receiver<SurfaceMessage>,
}

impl SurfaceBus {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// Outbox for the surface with the given id
    pub fn outbox(&self, surface: SurfaceId) -> SurfaceOutbox {
        SurfaceOutbox {
            surface,
            sender: self.sender.clone(),
        }
    }

    /// Drain everything posted so far (non-blocking), in arrival order
    pub fn try_recv_all(&self) -> Vec<SurfaceMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.receiver.try_recv() {
            messages.push(msg);
        }
        messages
    }
}

impl Default for SurfaceBus {
    fn default() -> Self {
        Self::new()
    }
}
