use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the novel-pdf library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// Group level outside of 1..=3.
    #[error("Invalid group level {level}: expected 1 (novel), 2 (volume) or 3 (chapter)")]
    InvalidGroupLevel {
        /// The rejected level
        level: u8,
    },

    /// Invalid UTF-8 encountered in a chapter file.
    #[error("Invalid UTF-8 encoding in file '{path}'. File may be binary or use unsupported encoding.")]
    InvalidUtf8 {
        /// Path to file with encoding issues
        path: PathBuf,
    },

    /// Font could not be located or parsed.
    #[error("Failed to load font '{path}': {message}")]
    Font {
        /// Font file path
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// PDF rendering failed for one document.
    #[error("Failed to render '{document}': {message}")]
    Render {
        /// Document title (the group key)
        document: String,
        /// Error message
        message: String,
    },

    /// A group had no readable chapters left to render.
    #[error("Nothing to render for '{document}': every chapter was skipped")]
    EmptyDocument {
        /// Document title (the group key)
        document: String,
    },

    /// System time error.
    #[error("System time error: {message}")]
    SystemTime {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid UTF-8 error.
    #[must_use]
    pub fn invalid_utf8(path: impl Into<PathBuf>) -> Self {
        Self::InvalidUtf8 { path: path.into() }
    }

    /// Creates a font loading error.
    #[must_use]
    pub fn font(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Font {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Creates a rendering error for the named document.
    #[must_use]
    pub fn render(document: impl Into<String>, source: genpdf::error::Error) -> Self {
        Self::Render {
            document: document.into(),
            message: source.to_string(),
        }
    }

    /// Creates an empty document error.
    #[must_use]
    pub fn empty_document(document: impl Into<String>) -> Self {
        Self::EmptyDocument {
            document: document.into(),
        }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::InvalidGroupLevel { .. } | Self::Font { .. }
        )
    }
}

impl From<std::time::SystemTimeError> for Error {
    fn from(e: std::time::SystemTimeError) -> Self {
        Self::SystemTime {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("test message");
        assert!(err.is_config());
        assert!(err.to_string().contains("test message"));
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io("/tmp/3084_11641.txt", io_err);
        assert!(err.is_io());
        assert!(err.to_string().contains("/tmp/3084_11641.txt"));
    }

    #[test]
    fn test_group_level_error_is_config() {
        let err = Error::InvalidGroupLevel { level: 7 };
        assert!(err.is_config());
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn test_font_error_mentions_path() {
        let err = Error::font("/fonts/missing.ttf", "not found");
        assert!(err.is_config());
        assert!(err.to_string().contains("/fonts/missing.ttf"));
    }

    #[test]
    fn test_error_clone() {
        let err = Error::empty_document("3084_11641");
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_system_time_error() {
        use std::time::{Duration, SystemTime};

        let past = SystemTime::UNIX_EPOCH;
        let future = past + Duration::from_secs(1);
        let result = past.duration_since(future);

        if let Err(e) = result {
            let err: Error = e.into();
            assert!(err.to_string().contains("System time error"));
        }
    }
}
