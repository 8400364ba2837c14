//! File chooser collaborator.
//!
//! A chooser returns a resolved path or `None` when the user cancels;
//! cancellation is never an error.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub trait FileChooser {
    /// Pick an existing document to open
    fn choose_open(&mut self) -> Option<PathBuf>;

    /// Pick a target for saving, optionally suggesting a file name
    fn choose_save(&mut self, suggested_name: Option<&str>) -> Option<PathBuf>;
}

/// Chooser that answers from a queue of prepared responses.
///
/// Used by the command-script driver and tests; an empty queue behaves like
/// a cancelled dialog. Clones share the queue, so a driver can keep
/// answering after handing a clone to the controller.
#[derive(Debug, Clone, Default)]
pub struct QueuedChooser {
    answers: Rc<RefCell<VecDeque<Option<PathBuf>>>>,
    base_dir: Option<PathBuf>,
}

impl QueuedChooser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative answers are joined onto `dir`
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn push_answer(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let path = match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        };
        self.answers.borrow_mut().push_back(Some(path));
    }

    pub fn push_cancel(&self) {
        self.answers.borrow_mut().push_back(None);
    }

    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next_answer(&mut self) -> Option<PathBuf> {
        self.answers.borrow_mut().pop_front().flatten()
    }
}

impl FileChooser for QueuedChooser {
    fn choose_open(&mut self) -> Option<PathBuf> {
        self.next_answer()
    }

    fn choose_save(&mut self, suggested_name: Option<&str>) -> Option<PathBuf> {
        tracing::trace!(?suggested_name, "save chooser opened");
        self.next_answer()
    }
}
