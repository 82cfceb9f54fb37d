use crate::Config;
use std::collections::HashSet;
use std::path::Path;

/// Validation result containing all issues found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate an assembled configuration before entering the interactive loop.
///
/// Errors are fatal (the CLI exits with code 1); warnings are printed to
/// stderr before the terminal switches to the alternate screen.
pub fn validate(config: &Config) -> ValidationResult {
    let mut result = ValidationResult::default();

    if config.shell.trim().is_empty() {
        result.errors.push(
            "Shell is not set; pass --shell or export SHELL".to_string(),
        );
    } else if config.shell.contains('/') && !Path::new(&config.shell).exists() {
        result
            .errors
            .push(format!("Shell not found: {}", config.shell));
    }

    let mut seen = HashSet::new();
    for entry in &config.deny_list {
        if entry.trim().is_empty() {
            result
                .warnings
                .push("Empty deny-list entry is ignored".to_string());
            continue;
        }
        if entry.split_whitespace().count() > 1 {
            result.warnings.push(format!(
                "Deny-list entry '{entry}' contains whitespace and can never match a leading token"
            ));
        }
        if !seen.insert(entry.as_str()) {
            result
                .warnings
                .push(format!("Duplicate deny-list entry: '{entry}'"));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Layout;

    fn base_config() -> Config {
        Config {
            shell: "/bin/sh".to_string(),
            initial_text: String::new(),
            print_command: false,
            layout: Layout::Columns,
            deny_list: vec!["rm".to_string()],
        }
    }

    #[test]
    fn test_valid_config() {
        let result = validate(&base_config());
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_shell_is_error() {
        let mut config = base_config();
        config.shell = String::new();
        let result = validate(&config);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_missing_shell_path_is_error() {
        let mut config = base_config();
        config.shell = "/nonexistent/bin/nosh".to_string();
        let result = validate(&config);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_bare_shell_name_is_accepted() {
        // A bare name is resolved through PATH at spawn time.
        let mut config = base_config();
        config.shell = "sh".to_string();
        assert!(validate(&config).is_valid());
    }

    #[test]
    fn test_whitespace_deny_entry_warns() {
        let mut config = base_config();
        config.deny_list = vec!["rm -rf".to_string()];
        let result = validate(&config);
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_duplicate_deny_entry_warns() {
        let mut config = base_config();
        config.deny_list = vec!["rm".to_string(), "rm".to_string()];
        let result = validate(&config);
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }
}
