//! Presentation models: the tab strip and the save confirmation.

pub mod save_dialog;
pub mod tabs;
