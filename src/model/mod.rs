//! Document model: host-side text buffers and the sessions pairing them with
//! editing surfaces.

pub mod document;
pub mod session;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use document::DocumentBuffer;
pub use session::{DocumentSession, SessionError};

/// Unique identifier for an open document tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}
