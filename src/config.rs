//! Parser configuration.
//!
//! Defaults are compiled in; a YAML file can override any subset of the keys,
//! and command-line flags are layered on top of whatever the file produced.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{DescentError, ErrorKind};

/// Step budget used when nothing else is configured.
pub const DEFAULT_MAX_STEPS: usize = 1_000_000;
/// Nesting bound when rebuilding a parse tree.
pub const DEFAULT_MAX_TREE_DEPTH: usize = 10_000;

/// Knobs shared by the grammar loader, the automaton and the tree builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Upper bound on automaton transitions; `0` disables the guard.
    pub max_steps: usize,
    /// Upper bound on nesting while rebuilding the tree.
    pub max_tree_depth: usize,
    /// Spellings of the empty alternative in grammar text.
    pub empty_markers: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            empty_markers: vec!["epsilon".into(), "ε".into()],
        }
    }
}

impl ParserConfig {
    /// Read a YAML configuration; missing keys keep their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, DescentError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| {
            ErrorKind::Config {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Read a YAML configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, DescentError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DescentError::io(path, e))?;
        Self::from_yaml_str(&text)
    }

    /// Override the step budget (command-line layer).
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn is_empty_marker(&self, text: &str) -> bool {
        self.empty_markers.iter().any(|m| m == text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = ParserConfig::from_yaml_str("max_steps: 50\n").unwrap();
        assert_eq!(config.max_steps, 50);
        assert_eq!(config.max_tree_depth, DEFAULT_MAX_TREE_DEPTH);
        assert!(config.is_empty_marker("epsilon"));
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(ParserConfig::from_yaml_str("").unwrap(), ParserConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ParserConfig::from_yaml_str("max_stepz: 3\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config { .. }));
    }

    #[test]
    fn custom_markers_replace_defaults() {
        let config = ParserConfig::from_yaml_str("empty_markers: [\"@\"]\n").unwrap();
        assert!(config.is_empty_marker("@"));
        assert!(!config.is_empty_marker("epsilon"));
    }
}
