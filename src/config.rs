use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Tab and document behavior
    #[serde(default)]
    pub editor: EditorConfig,

    /// Log filter and destination
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Custom keybindings (override the defaults for the same action)
    #[serde(default)]
    pub keybindings: Vec<Keybinding>,
}

/// Tab and document behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EditorConfig {
    /// Title prefix of new, unsaved documents ("Untitled" gives "Untitled-1", ...)
    #[serde(default = "default_untitled_prefix")]
    pub untitled_prefix: String,

    /// Extension suggested when saving an untitled document
    #[serde(default = "default_extension")]
    pub default_extension: String,

    /// Opening a file replaces the selected tab if it is an empty, unmodified,
    /// untitled document
    #[serde(default = "default_true")]
    pub replace_empty_untitled: bool,

    /// Number of recently opened files remembered
    #[serde(default = "default_recent_files_limit")]
    pub recent_files_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            untitled_prefix: default_untitled_prefix(),
            default_extension: default_extension(),
            replace_empty_untitled: true,
            recent_files_limit: default_recent_files_limit(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LoggingConfig {
    /// Filter directives used when RUST_LOG is not set (e.g. "info", "graphpad=debug")
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Log file; defaults to `graphpad.log` in the data directory
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            file: None,
        }
    }
}

/// A single key -> action binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Keybinding {
    /// Key name (e.g., "s", "Enter", "F5", "PageDown")
    pub key: String,

    /// Modifiers (e.g., ["ctrl"], ["ctrl", "shift"])
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,

    /// Action to perform (e.g., "save", "close_tab", "new_tab")
    pub action: String,
}

fn default_true() -> bool {
    true
}

fn default_untitled_prefix() -> String {
    "Untitled".to_string()
}

fn default_extension() -> String {
    "ttl".to_string()
}

fn default_recent_files_limit() -> usize {
    10
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl Config {
    pub const FILENAME: &'static str = "config.json";

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load the user config; defaults when there is no config file
    pub fn load_user_config(dir_context: &DirectoryContext) -> Result<Self, ConfigError> {
        let path = dir_context.config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(&path)
    }

    /// Load the user config if there is one, defaults otherwise.
    ///
    /// A broken config file is reported and ignored rather than aborting startup.
    pub fn load_or_default(dir_context: &DirectoryContext) -> Self {
        Self::load_user_config(dir_context).unwrap_or_else(|e| {
            tracing::warn!(path = %dir_context.config_path().display(), "ignoring config: {}", e);
            Self::default()
        })
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), contents)?;
        Ok(())
    }

    /// JSON Schema of the config file
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(Config)).unwrap_or_default()
    }
}

/// Directory paths for state and configuration
///
/// Only `main` builds this from the system (`dirs`); everything else
/// receives it, so tests can point it at temp directories.
#[derive(Debug, Clone)]
pub struct DirectoryContext {
    /// Data directory for logs and state, e.g. ~/.local/share/graphpad
    pub data_dir: PathBuf,

    /// Config directory, e.g. ~/.config/graphpad
    pub config_dir: PathBuf,
}

impl DirectoryContext {
    pub fn from_system() -> std::io::Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| std::io::Error::other("could not determine data directory"))?
            .join("graphpad");
        let config_dir = dirs::config_dir()
            .ok_or_else(|| std::io::Error::other("could not determine config directory"))?
            .join("graphpad");
        Ok(Self {
            data_dir,
            config_dir,
        })
    }

    /// Both directories under one root (for tests)
    pub fn for_testing(root: &Path) -> Self {
        Self {
            data_dir: root.join("data"),
            config_dir: root.join("config"),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(Config::FILENAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("graphpad.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.editor.untitled_prefix, "Untitled");
        assert!(config.editor.replace_empty_untitled);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "editor": { "replace_empty_untitled": false },
                "keybindings": [ { "key": "s", "modifiers": ["alt"], "action": "save" } ]
            }"#,
        )
        .unwrap();
        assert!(!config.editor.replace_empty_untitled);
        assert_eq!(config.editor.recent_files_limit, 10);
        assert_eq!(config.keybindings.len(), 1);
        assert_eq!(config.keybindings[0].modifiers, vec!["alt".to_string()]);
    }

    #[test]
    fn test_save_and_load_roundtrip_through_dir_context() {
        let temp = TempDir::new().unwrap();
        let dirs = DirectoryContext::for_testing(temp.path());
        std::fs::create_dir_all(&dirs.config_dir).unwrap();

        let mut config = Config::default();
        config.editor.untitled_prefix = "Draft".to_string();
        config.save_to_file(dirs.config_path()).unwrap();

        assert_eq!(Config::load_or_default(&dirs), config);
    }

    #[test]
    fn test_broken_config_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let dirs = DirectoryContext::for_testing(temp.path());
        std::fs::create_dir_all(&dirs.config_dir).unwrap();
        std::fs::write(dirs.config_path(), "{ not json").unwrap();

        assert_eq!(Config::load_or_default(&dirs), Config::default());
        assert!(matches!(
            Config::load_from_file(dirs.config_path()),
            Err(ConfigError::ParseError(_))
        ));
        // The error stays visible to callers that report it themselves
        assert!(matches!(
            Config::load_user_config(&dirs),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_user_config_is_default() {
        let temp = TempDir::new().unwrap();
        let dirs = DirectoryContext::for_testing(temp.path());
        assert_eq!(Config::load_user_config(&dirs).unwrap(), Config::default());
    }

    #[test]
    fn test_schema_mentions_sections() {
        let schema = Config::json_schema().to_string();
        assert!(schema.contains("editor"));
        assert!(schema.contains("keybindings"));
    }
}
