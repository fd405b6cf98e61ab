//! Error type for configuration persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the writer and the configuration manager.
///
/// Parse problems are not errors: the parser recovers from them and reports
/// [`crate::document::parser::ParseDiagnostic`]s instead.  Reading a missing
/// file is not an error either; the manager falls back to defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Creating, writing or flushing the target failed.  The partially
    /// written file has already been removed.
    #[error("failed to write config to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temporary file was written but could not be moved over the
    /// target.  The temporary file has already been removed.
    #[error("failed to replace {path} with the freshly written config: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No field of the schema has this fully qualified name.
    #[error("unknown config field: {0}")]
    UnknownField(String),
}
