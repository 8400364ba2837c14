use std::path::PathBuf;

use crate::app::tab_registry::TabSlot;
use crate::model::{SessionError, TabId};
use crate::services::engine::EngineReport;
use crate::services::fs::FsError;
use crate::services::surface::SurfaceError;
use crate::view::save_dialog::SaveConfirmation;

/// Lifecycle state of one tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabState {
    Clean,
    Dirty,
    /// Close requested while dirty; waiting for the save confirmation
    ClosePending,
}

/// Result of asking to close a tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Tab deleted and its surface released
    Removed,
    /// Unsaved changes; the confirmation must be resolved first
    AwaitingConfirmation(SaveConfirmation),
    /// Close cancelled, tab still open
    Kept,
}

/// Result of asking to quit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuitOutcome {
    Quit,
    AwaitingConfirmation(SaveConfirmation),
    Cancelled,
}

/// What a resolved confirmation led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Close(CloseOutcome),
    Quit(QuitOutcome),
}

/// Changes the embedding UI renders, drained with `drain_events`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    TabOpened { tab: TabId, title: String },
    TabSelected(TabSlot),
    TabRemoved(TabId),
    TitleChanged { tab: TabId, title: String },
    /// The per-tab "modified" indicator changed
    ModifiedChanged { tab: TabId, modified: bool },
    /// A save confirmation must be shown
    ConfirmationRequested { message: String },
    /// Transient status text
    Notification(String),
    EngineFinished {
        tab: TabId,
        job_id: u64,
        result: Result<EngineReport, String>,
    },
    QuitRequested,
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("document has no file to save to")]
    NoTargetFile,

    #[error("{0}")]
    IoFailure(#[source] FsError),

    #[error("{} is already open in another tab", .0.display())]
    PathAlreadyOpen(PathBuf),

    #[error("unknown tab {0}")]
    UnknownTab(TabId),

    #[error("a save confirmation is already pending")]
    ConfirmationPending,

    #[error("no save confirmation is pending")]
    NoPendingConfirmation,

    #[error("no semantic engine is available")]
    EngineUnavailable,

    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),
}

impl From<SessionError> for ControllerError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NoTargetFile => ControllerError::NoTargetFile,
            SessionError::IoFailure(e) => ControllerError::IoFailure(e),
        }
    }
}
