//! Error types for kira-core.

use std::path::PathBuf;

/// Errors that can occur in kira-core.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A path that must be UTF-8 is not.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for kira-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::NonUtf8Path(PathBuf::from("plain"));
        assert_eq!(err.to_string(), "path is not valid UTF-8: plain");

        let err = CoreError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.to_string(), "IO error: gone");
    }
}
