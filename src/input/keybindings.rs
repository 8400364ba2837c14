use crate::config::{Config, Keybinding};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Format a keybinding as a user-friendly string
pub fn format_keybinding(keycode: &KeyCode, modifiers: &KeyModifiers) -> String {
    let mut result = String::new();

    if modifiers.contains(KeyModifiers::CONTROL) {
        result.push_str("Ctrl+");
    }
    if modifiers.contains(KeyModifiers::ALT) {
        result.push_str("Alt+");
    }
    if modifiers.contains(KeyModifiers::SHIFT) {
        result.push_str("Shift+");
    }

    match keycode {
        KeyCode::Enter => result.push_str("Enter"),
        KeyCode::Tab => result.push_str("Tab"),
        KeyCode::Esc => result.push_str("Esc"),
        KeyCode::PageUp => result.push_str("PgUp"),
        KeyCode::PageDown => result.push_str("PgDn"),
        KeyCode::Char(' ') => result.push_str("Space"),
        KeyCode::Char(c) => result.push_str(&c.to_uppercase().to_string()),
        KeyCode::F(n) => result.push_str(&format!("F{}", n)),
        _ => return String::new(),
    }

    result
}

/// Global actions reachable through shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Action {
    Save,
    CloseTab,
    NewTab,
    Open,
    NextTab,
    PrevTab,
    Quit,
    RunEngine,
}

impl Action {
    /// Parse the action name used in config files
    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "save" => Action::Save,
            "close_tab" => Action::CloseTab,
            "new_tab" => Action::NewTab,
            "open" => Action::Open,
            "next_tab" => Action::NextTab,
            "prev_tab" => Action::PrevTab,
            "quit" => Action::Quit,
            "run_engine" => Action::RunEngine,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Save => "save",
            Action::CloseTab => "close_tab",
            Action::NewTab => "new_tab",
            Action::Open => "open",
            Action::NextTab => "next_tab",
            Action::PrevTab => "prev_tab",
            Action::Quit => "quit",
            Action::RunEngine => "run_engine",
        }
    }
}

/// Parse a key name from config ("s", "Enter", "F5", "PageDown")
pub fn parse_key(key: &str) -> Option<KeyCode> {
    let lower = key.to_lowercase();
    Some(match lower.as_str() {
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "space" => KeyCode::Char(' '),
        "pageup" | "pgup" => KeyCode::PageUp,
        "pagedown" | "pgdn" => KeyCode::PageDown,
        s if s.starts_with('f') && s.len() > 1 => KeyCode::F(s[1..].parse().ok()?),
        s if s.chars().count() == 1 => KeyCode::Char(s.chars().next()?),
        _ => return None,
    })
}

/// Parse modifier names from config ("ctrl", "alt", "shift")
pub fn parse_modifiers(modifiers: &[String]) -> KeyModifiers {
    let mut result = KeyModifiers::empty();
    for modifier in modifiers {
        match modifier.to_lowercase().as_str() {
            "ctrl" | "control" => result |= KeyModifiers::CONTROL,
            "shift" => result |= KeyModifiers::SHIFT,
            "alt" => result |= KeyModifiers::ALT,
            other => tracing::warn!("unknown modifier `{}` in keybinding", other),
        }
    }
    result
}

/// Resolves key events to global actions
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<(KeyCode, KeyModifiers), Action>,
}

impl Default for Keymap {
    fn default() -> Self {
        let mut bindings = HashMap::new();
        let ctrl = KeyModifiers::CONTROL;
        bindings.insert((KeyCode::Char('s'), ctrl), Action::Save);
        bindings.insert((KeyCode::Char('w'), ctrl), Action::CloseTab);
        bindings.insert((KeyCode::Char('t'), ctrl), Action::NewTab);
        bindings.insert((KeyCode::Char('o'), ctrl), Action::Open);
        bindings.insert((KeyCode::PageDown, ctrl), Action::NextTab);
        bindings.insert((KeyCode::PageUp, ctrl), Action::PrevTab);
        bindings.insert((KeyCode::Char('q'), ctrl), Action::Quit);
        bindings.insert((KeyCode::F(5), KeyModifiers::NONE), Action::RunEngine);
        Self { bindings }
    }
}

impl Keymap {
    /// Defaults plus the config's custom bindings.
    ///
    /// A custom binding for an action replaces that action's default keys.
    pub fn new(config: &Config) -> Self {
        let mut keymap = Self::default();
        for binding in &config.keybindings {
            keymap.apply(binding);
        }
        keymap
    }

    fn apply(&mut self, binding: &Keybinding) {
        let Some(action) = Action::from_str(&binding.action) else {
            tracing::warn!("unknown action `{}` in keybinding", binding.action);
            return;
        };
        let Some(code) = parse_key(&binding.key) else {
            tracing::warn!("unknown key `{}` in keybinding", binding.key);
            return;
        };
        let modifiers = parse_modifiers(&binding.modifiers);
        self.bindings.retain(|_, bound| *bound != action);
        self.bindings.insert((normalize(code, modifiers), modifiers), action);
    }

    pub fn resolve(&self, event: &KeyEvent) -> Option<Action> {
        let code = normalize(event.code, event.modifiers);
        self.bindings.get(&(code, event.modifiers)).copied()
    }

    /// Display string of the first key bound to `action`
    pub fn describe(&self, action: Action) -> Option<String> {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, bound)| **bound == action)
            .map(|((code, modifiers), _)| format_keybinding(code, modifiers))
            .collect();
        keys.sort();
        keys.into_iter().next()
    }
}

/// Terminals report Ctrl+S as either 's' or 'S'; compare lowercase unless
/// Shift is part of the binding
fn normalize(code: KeyCode, modifiers: KeyModifiers) -> KeyCode {
    match code {
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::SHIFT) => {
            KeyCode::Char(c.to_ascii_lowercase())
        }
        other => other,
    }
}
