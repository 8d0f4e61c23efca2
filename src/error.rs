//! Error types for schema loading and remote definition fetches.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading a schema document from a file, string or URL.
///
/// Dereferencing itself never fails; these surface when the CLI loads the
/// root schema, and are logged and swallowed when a remote fetch fails.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("remote fetch disabled: {url}")]
    Offline { url: String },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("refusing to load '{base}' from a document served at {origin}")]
    DisallowedSource { base: String, origin: String },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. }
            | LoadError::ReadError { .. }
            | LoadError::Offline { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::InvalidJson { .. }
            | LoadError::InvalidUrl { .. }
            | LoadError::DisallowedSource { .. } => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("schema.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = LoadError::Offline {
            url: "https://example.com/defs.json".into(),
        };
        assert_eq!(err.exit_code(), 3);

        let err = LoadError::DisallowedSource {
            base: "file:///etc/defs.json".into(),
            origin: "https://example.com/schema.json".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = LoadError::InvalidJson { source };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn load_error_display() {
        let err = LoadError::Offline {
            url: "https://example.com/defs.json".into(),
        };
        assert_eq!(
            err.to_string(),
            "remote fetch disabled: https://example.com/defs.json"
        );
    }
}
