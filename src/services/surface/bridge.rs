//! Host side of one editing surface.
//!
//! The bridge turns the surface's fire-and-forget command channel into a
//! get/set content API and turns its raw notifications into host events,
//! dropping the echoes of the host's own pushes.
//!
//! Echo suppression works on push generations rather than a single flag:
//! every `setContent` carries a fresh generation, the surface tags the change
//! it causes with that generation and acknowledges it with `applied`. Until
//! the latest generation is acknowledged the bridge is suppressing echoes,
//! so a push that races an in-flight one still wins.

use super::protocol::{ProtocolError, SurfaceCommand, SurfaceNotification};
use super::{SurfaceChannel, SurfaceError, SurfaceId};

/// Something the owning session must react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// The surface finished initializing
    Ready,
    /// The user changed the surface buffer to this text
    UserEdit(String),
}

/// What happened to a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Sent to the surface with this generation
    Sent(u64),
    /// Surface not ready yet; held until it is (informational, not an error)
    Queued,
    /// Surface already disposed
    Dropped,
}

/// Work that arrived before the surface was ready (last write wins)
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Push(String),
    Edit(String),
}

pub struct EditingSurfaceBridge {
    id: SurfaceId,
    channel: Box<dyn SurfaceChannel>,
    ready: bool,
    disposed: bool,
    pending: Option<Pending>,
    /// Generation of the most recent push sent to the surface
    push_generation: u64,
    /// Highest generation the surface has acknowledged
    applied_generation: u64,
    /// Last content known to be in the surface
    last_known: String,
    next_request_id: u64,
    /// Outstanding `getContent` and the push generation it was issued at
    outstanding_request: Option<(u64, u64)>,
}

impl std::fmt::Debug for EditingSurfaceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditingSurfaceBridge")
            .field("id", &self.id)
            .field("ready", &self.ready)
            .field("disposed", &self.disposed)
            .field("push_generation", &self.push_generation)
            .field("applied_generation", &self.applied_generation)
            .finish_non_exhaustive()
    }
}

impl EditingSurfaceBridge {
    /// Wrap a surface and request its initialization.
    ///
    /// The notification handler is live from this point: edits arriving
    /// before `ready` are held, not lost.
    pub fn new(id: SurfaceId, mut channel: Box<dyn SurfaceChannel>) -> Result<Self, SurfaceError> {
        channel.initialize()?;
        tracing::debug!(surface = %id, "surface initialization requested");
        Ok(Self {
            id,
            channel,
            ready: false,
            disposed: false,
            pending: None,
            push_generation: 0,
            applied_generation: 0,
            last_known: String::new(),
            next_request_id: 1,
            outstanding_request: None,
        })
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// True while a host push has not been acknowledged by the surface
    pub fn suppress_echo(&self) -> bool {
        self.applied_generation < self.push_generation
    }

    /// Content requested before the surface was ready
    pub fn pending_content(&self) -> Option<&str> {
        match &self.pending {
            Some(Pending::Push(text)) => Some(text),
            _ => None,
        }
    }

    pub fn push_generation(&self) -> u64 {
        self.push_generation
    }

    /// Replace the surface buffer with `text`
    pub fn push_content(&mut self, text: &str) -> Result<PushOutcome, SurfaceError> {
        if self.disposed {
            tracing::trace!(surface = %self.id, "push after dispose dropped");
            return Ok(PushOutcome::Dropped);
        }
        if !self.ready {
            tracing::trace!(surface = %self.id, len = text.len(), "surface not ready, push queued");
            self.pending = Some(Pending::Push(text.to_string()));
            return Ok(PushOutcome::Queued);
        }
        self.send_push(text.to_string()).map(PushOutcome::Sent)
    }

    fn send_push(&mut self, text: String) -> Result<u64, SurfaceError> {
        let generation = self.push_generation + 1;
        let script = SurfaceCommand::SetContent {
            generation,
            text: text.clone(),
        }
        .encode();
        self.channel.send(&script)?;

        self.push_generation = generation;
        self.last_known = text;
        tracing::trace!(surface = %self.id, generation, "content pushed");
        Ok(generation)
    }

    /// Last content known to be in the surface.
    ///
    /// Before the surface is ready this is the queued host value.
    pub fn pull_content(&self) -> &str {
        match &self.pending {
            Some(Pending::Push(text)) | Some(Pending::Edit(text)) if !self.ready => text,
            _ => &self.last_known,
        }
    }

    /// Issue a live `getContent` query; the reply refreshes [`Self::pull_content`].
    ///
    /// Returns the request id, or `None` when the surface cannot answer yet.
    pub fn request_content(&mut self) -> Result<Option<u64>, SurfaceError> {
        if !self.ready || self.disposed {
            return Ok(None);
        }
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.channel
            .send(&SurfaceCommand::GetContent { request_id }.encode())?;
        self.outstanding_request = Some((request_id, self.push_generation));
        Ok(Some(request_id))
    }

    /// Decode and apply one notification from the surface
    pub fn handle_notification(&mut self, payload: &str) -> Result<Vec<BridgeEvent>, ProtocolError> {
        let notification = SurfaceNotification::decode(payload)?;
        let mut events = Vec::new();
        if self.disposed {
            return Ok(events);
        }

        match notification {
            SurfaceNotification::Ready => {
                if self.ready {
                    return Ok(events);
                }
                self.ready = true;
                tracing::debug!(surface = %self.id, "surface ready");
                events.push(BridgeEvent::Ready);

                match self.pending.take() {
                    Some(Pending::Push(text)) => {
                        if let Err(e) = self.send_push(text) {
                            tracing::warn!(surface = %self.id, "failed to flush queued push: {}", e);
                        }
                    }
                    Some(Pending::Edit(text)) => {
                        self.last_known.clone_from(&text);
                        events.push(BridgeEvent::UserEdit(text));
                    }
                    None => {}
                }
            }
            SurfaceNotification::Changed {
                generation: Some(generation),
                text,
            } => {
                // Echo of one of our own pushes
                if generation == self.push_generation {
                    self.last_known = text;
                }
                tracing::trace!(surface = %self.id, generation, "echo dropped");
            }
            SurfaceNotification::Changed {
                generation: None,
                text,
            } => {
                if !self.ready {
                    tracing::trace!(surface = %self.id, "edit before ready held");
                    self.pending = Some(Pending::Edit(text));
                } else if self.suppress_echo() {
                    // The unacknowledged push overwrites this change
                    tracing::debug!(
                        surface = %self.id,
                        generation = self.push_generation,
                        "change during push round trip dropped"
                    );
                } else {
                    self.last_known.clone_from(&text);
                    events.push(BridgeEvent::UserEdit(text));
                }
            }
            SurfaceNotification::Applied { generation } => {
                self.applied_generation = self.applied_generation.max(generation);
            }
            SurfaceNotification::Content { request_id, text } => match self.outstanding_request {
                Some((expected, at_generation)) if expected == request_id => {
                    self.outstanding_request = None;
                    if at_generation == self.push_generation {
                        self.last_known = text;
                    }
                }
                _ => {
                    tracing::trace!(surface = %self.id, request_id, "stale content reply ignored");
                }
            },
        }

        Ok(events)
    }

    /// Release the surface. Later pushes are dropped.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.pending = None;
        if let Err(e) = self.channel.send(&SurfaceCommand::Dispose.encode()) {
            tracing::debug!(surface = %self.id, "dispose not delivered: {}", e);
        }
        tracing::debug!(surface = %self.id, "surface disposed");
    }
}
