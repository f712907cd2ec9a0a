//! Lowering configuration
//!
//! Loaded from a JSON file next to the rest of the pipeline settings.
//! Every field is optional in the file.

use gpuc_common::CompilerError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoweringConfig {
    /// Base name of the target's "copy one object" primitive. The pointer
    /// type is appended to form the declaration name.
    pub copy_memory_name: String,
    /// Check that no intrinsic reference survives before committing
    pub verify: bool,
}

impl Default for LoweringConfig {
    fn default() -> Self {
        Self {
            copy_memory_name: "spirv.copy_memory".to_string(),
            verify: true,
        }
    }
}

/// Load lowering configuration from a JSON file
pub fn load_config(path: &Path) -> Result<LoweringConfig, CompilerError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| CompilerError::ConfigError {
        message: format!("{}: {e}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "copy_memory_name": "target.copy" }}"#).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.copy_memory_name, "target.copy");
        assert!(config.verify);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, CompilerError::ConfigError { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/lowering.json")).unwrap_err();
        assert!(matches!(err, CompilerError::IoError { .. }));
    }
}
