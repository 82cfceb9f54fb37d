use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Deny-list applied when no user config overrides it.
pub const DEFAULT_DENY_LIST: &[&str] = &["rm"];

const APP_NAME: &str = "plumb";

/// Arrangement of the two preview panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Side by side (the default).
    Columns,
    /// Stacked, stdin pane above stdout pane.
    Rows,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Columns
    }
}

/// Immutable startup configuration.
///
/// Assembled once by the CLI from flags layered over the optional user
/// config file, validated, then passed by `Arc` into the supervisor.
/// Nothing mutates it after startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shell used to run every stage as `<shell> -c <text>`.
    pub shell: String,

    /// Initial pipeline text (seeds the committed/tail split at startup).
    pub initial_text: String,

    /// On accept, print the assembled command instead of executing it.
    pub print_command: bool,

    /// Preview pane arrangement.
    pub layout: Layout,

    /// Leading command tokens whose preview execution is suppressed.
    pub deny_list: Vec<String>,
}

impl Config {
    /// Returns the deny-list entry matching `command`'s leading token, if any.
    ///
    /// Matching is a literal comparison of the first whitespace-delimited
    /// token. Quoting or path prefixes defeat it.
    pub fn denies<'a>(&'a self, command: &str) -> Option<&'a str> {
        let token = leading_token(command)?;
        self.deny_list
            .iter()
            .find(|entry| entry.as_str() == token)
            .map(String::as_str)
    }
}

/// First whitespace-delimited token of `text`, if any.
pub fn leading_token(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}

/// Optional user config file, parsed from YAML.
///
/// Every field is optional; CLI flags win over file values, file values win
/// over built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Shell to use when `--shell` is not given and `$SHELL` is unset.
    #[serde(default)]
    pub shell: Option<String>,

    /// Default pane layout.
    #[serde(default)]
    pub layout: Option<Layout>,

    /// Replacement deny-list. An explicit empty list disables suppression.
    #[serde(default)]
    pub deny: Option<Vec<String>>,
}

impl ConfigFile {
    /// Parse a config file from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Load a config file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Load the config file from its default location.
    ///
    /// Returns `Ok(None)` when the file does not exist; a file that exists
    /// but fails to read or parse is an error.
    pub fn load_default() -> Result<Option<Self>, ConfigError> {
        let path = Self::default_path();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    /// Default config file location: `<config_dir>/plumb/config.yaml`.
    ///
    /// Falls back to `~/.plumb/config.yaml` if the platform config
    /// directory cannot be determined.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(format!(".{APP_NAME}"))
            })
            .join("config.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_deny(deny: &[&str]) -> Config {
        Config {
            shell: "/bin/sh".to_string(),
            initial_text: String::new(),
            print_command: false,
            layout: Layout::default(),
            deny_list: deny.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_leading_token() {
        assert_eq!(leading_token("rm -rf /tmp"), Some("rm"));
        assert_eq!(leading_token("  grep foo"), Some("grep"));
        assert_eq!(leading_token("solo"), Some("solo"));
        assert_eq!(leading_token(""), None);
        assert_eq!(leading_token("   "), None);
    }

    #[test]
    fn test_denies_literal_match() {
        let config = config_with_deny(&["rm", "shutdown"]);
        assert_eq!(config.denies("rm -rf /tmp"), Some("rm"));
        assert_eq!(config.denies("shutdown now"), Some("shutdown"));
        assert_eq!(config.denies("grep rm"), None);
    }

    #[test]
    fn test_denies_is_not_path_aware() {
        // Quoting or a path prefix defeats the literal token comparison.
        let config = config_with_deny(&["rm"]);
        assert_eq!(config.denies("/bin/rm -rf /tmp"), None);
        assert_eq!(config.denies("\"rm\" -rf /tmp"), None);
    }

    #[test]
    fn test_denies_empty_text() {
        let config = config_with_deny(&["rm"]);
        assert_eq!(config.denies(""), None);
    }

    #[test]
    fn test_config_file_from_yaml() {
        let file = ConfigFile::from_yaml(
            r#"
shell: /bin/zsh
layout: rows
deny:
  - rm
  - dd
"#,
        )
        .expect("valid yaml");
        assert_eq!(file.shell.as_deref(), Some("/bin/zsh"));
        assert_eq!(file.layout, Some(Layout::Rows));
        assert_eq!(
            file.deny,
            Some(vec!["rm".to_string(), "dd".to_string()])
        );
    }

    #[test]
    fn test_config_file_empty_yaml_is_all_defaults() {
        let file = ConfigFile::from_yaml("{}").expect("valid yaml");
        assert!(file.shell.is_none());
        assert!(file.layout.is_none());
        assert!(file.deny.is_none());
    }

    #[test]
    fn test_config_file_explicit_empty_deny() {
        let file = ConfigFile::from_yaml("deny: []").expect("valid yaml");
        assert_eq!(file.deny, Some(Vec::new()));
    }

    #[test]
    fn test_config_file_load_missing_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ConfigFile::load(&dir.path().join("nope.yaml"));
        assert!(matches!(err, Err(ConfigError::FileRead { .. })));
    }

    #[test]
    fn test_config_file_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "shell: /bin/bash\n").expect("write");
        let file = ConfigFile::load(&path).expect("load");
        assert_eq!(file.shell.as_deref(), Some("/bin/bash"));
    }

    #[test]
    fn test_default_path_ends_with_config_yaml() {
        let path = ConfigFile::default_path();
        assert!(path.ends_with("config.yaml"));
        assert!(path.to_string_lossy().contains("plumb"));
    }
}
