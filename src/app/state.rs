//! Application-wide state shared by the open and save flows.
//!
//! Owned by the controller and handed to whoever needs it; there is no
//! global instance.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::Config;

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub config: Config,
    /// Most recent first, no duplicates
    recent_files: Vec<PathBuf>,
    /// Engine rule flags by name
    rule_flags: BTreeMap<String, bool>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn recent_files(&self) -> &[PathBuf] {
        &self.recent_files
    }

    /// Move `path` to the front of the recent list, trimming to the
    /// configured limit
    pub fn record_recent(&mut self, path: &Path) {
        self.recent_files.retain(|p| p != path);
        self.recent_files.insert(0, path.to_path_buf());
        self.recent_files
            .truncate(self.config.editor.recent_files_limit);
    }

    pub fn set_rule(&mut self, name: impl Into<String>, enabled: bool) {
        self.rule_flags.insert(name.into(), enabled);
    }

    /// Flip a rule flag; unknown rules start out disabled. Returns the new value.
    pub fn toggle_rule(&mut self, name: &str) -> bool {
        let flag = self.rule_flags.entry(name.to_string()).or_insert(false);
        *flag = !*flag;
        tracing::debug!(rule = name, enabled = *flag, "rule toggled");
        *flag
    }

    pub fn is_rule_enabled(&self, name: &str) -> bool {
        self.rule_flags.get(name).copied().unwrap_or(false)
    }

    /// Enabled rule names in sorted order
    pub fn enabled_rules(&self) -> Vec<String> {
        self.rule_flags
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.clone())
            .collect()
    }
}
