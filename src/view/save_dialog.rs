//! Save confirmation shown when closing would drop unsaved changes.
//!
//! The dialog does not block anything: the controller parks the close (or
//! quit) in a pending state and the dialog resolves it later with exactly
//! one `SaveChoice`. It never times out and never picks an answer on its own.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::TabId;

/// Outcome of the confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveChoice {
    Save,
    DiscardAndClose,
    Cancel,
}

impl SaveChoice {
    pub const ALL: [SaveChoice; 3] = [
        SaveChoice::Save,
        SaveChoice::DiscardAndClose,
        SaveChoice::Cancel,
    ];

    /// Interpret a typed answer: `s...` saves, `d...` discards, anything
    /// else cancels
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().chars().next() {
            Some('s') => SaveChoice::Save,
            Some('d') => SaveChoice::DiscardAndClose,
            _ => SaveChoice::Cancel,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SaveChoice::Save => "Save",
            SaveChoice::DiscardAndClose => "Don't Save",
            SaveChoice::Cancel => "Cancel",
        }
    }
}

/// What the confirmation is guarding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationSubject {
    CloseTab(TabId),
    Quit(Vec<TabId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveConfirmation {
    subject: ConfirmationSubject,
    message: String,
}

impl SaveConfirmation {
    pub fn for_close(tab: TabId, name: &str) -> Self {
        Self {
            subject: ConfirmationSubject::CloseTab(tab),
            message: format!("{name} has unsaved changes. (s)ave, (d)iscard, (c)ancel?"),
        }
    }

    pub fn for_quit(tabs: Vec<TabId>, names: &[String]) -> Self {
        let message = match names {
            [single] => format!("{single} has unsaved changes. (s)ave, (d)iscard, (c)ancel?"),
            _ => format!(
                "{} documents have unsaved changes ({}). (s)ave all, (d)iscard, (c)ancel?",
                names.len(),
                names.join(", ")
            ),
        };
        Self {
            subject: ConfirmationSubject::Quit(tabs),
            message,
        }
    }

    pub fn subject(&self) -> &ConfirmationSubject {
        &self.subject
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Map a key press to a choice; `None` keeps the dialog open.
    ///
    /// Enter is the default affordance (Save), Escape cancels.
    pub fn handle_key(&self, key: &KeyEvent) -> Option<SaveChoice> {
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return None;
        }
        match key.code {
            KeyCode::Enter => Some(SaveChoice::Save),
            KeyCode::Esc => Some(SaveChoice::Cancel),
            KeyCode::Char(c) => match c.to_ascii_lowercase() {
                's' => Some(SaveChoice::Save),
                'd' => Some(SaveChoice::DiscardAndClose),
                'c' => Some(SaveChoice::Cancel),
                _ => None,
            },
            _ => None,
        }
    }
}
