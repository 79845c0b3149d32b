//! Materializer options, loadable from `feedmat.yaml`.
//!
//! ```yaml
//! max_depth: 8
//! bind_unknown_elements: false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::LoadError;
use crate::loader::{self, Format};

/// Default limit on nested association depth.
pub const DEFAULT_MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MaterializerConfig {
    /// Nested feeds deeper than this are reported and left unset
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Store elements with no matching property as string fields instead of
    /// reporting them
    #[serde(default)]
    pub bind_unknown_elements: bool,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for MaterializerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            bind_unknown_elements: false,
        }
    }
}

impl MaterializerConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, LoadError> {
        loader::from_str(contents, Format::Yaml)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        loader::load_from_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = MaterializerConfig::from_yaml_str("bind_unknown_elements: true").unwrap();
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.bind_unknown_elements);

        let config = MaterializerConfig::from_yaml_str("max_depth: 2").unwrap();
        assert_eq!(config, MaterializerConfig::default().with_max_depth(2));
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert!(MaterializerConfig::from_yaml_str("max_depth: deep").is_err());
    }
}
