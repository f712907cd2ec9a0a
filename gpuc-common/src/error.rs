//! Error handling for the GPU target compiler
//!
//! Passes define their own precise error enums and convert into
//! `CompilerError` at the pipeline boundary.

use thiserror::Error;

/// Main compiler error type that encompasses all phases of compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Internal compiler error in pass '{pass}': {message}")]
    InternalError { pass: String, message: String },
}

impl CompilerError {
    /// Create an internal error attributed to a pass
    pub fn internal(pass: &str, message: impl Into<String>) -> Self {
        CompilerError::InternalError {
            pass: pass.to_string(),
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::IoError {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_error_display() {
        let err = CompilerError::internal("replace-intrinsics", "bad width");
        assert_eq!(
            err.to_string(),
            "Internal compiler error in pass 'replace-intrinsics': bad width"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
        let err: CompilerError = io.into();
        assert!(matches!(err, CompilerError::IoError { .. }));
    }
}
