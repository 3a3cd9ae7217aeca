use std::path::PathBuf;

use thiserror::Error;

/// Load-time errors. Per the specification's error-handling policy, some of
/// these abort the whole directory load (§7 "hard" errors) while others are
/// logged and skipped per-file or per-rule ("soft" errors, handled by the
/// caller rather than surfaced as an `Err` here).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config directory {0} does not exist")]
    DirectoryMissing(PathBuf),

    #[error("config directory {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Soft per-file error (§7): the caller logs and skips this file rather
    /// than aborting the whole directory load.
    #[error("{path}: cannot read file: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Soft per-file error (§7): malformed TOML skips the file, not the load.
    #[error("{path}: malformed TOML: {source}")]
    BadToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{path}: redirect/rewrite value for \"{key}\" has no 'to' value")]
    MissingTo { path: PathBuf, key: String },

    #[error("{path}: non-conditional rule \"{key}\" already exists")]
    DuplicateKey { path: PathBuf, key: String },

    #[error("{path}: destination \"{name}\" already defined")]
    DuplicateDestination { path: PathBuf, name: String },

    #[error("{path}: destination \"{name}\" has no 'kind' value")]
    MissingDestKind { path: PathBuf, name: String },

    #[error("{path}: destination \"{name}\" has unknown kind \"{kind}\"")]
    UnknownDestKind {
        path: PathBuf,
        name: String,
        kind: String,
    },

    #[error("{path}: redirect/rewrite value for \"{key}\" is neither a string nor a table")]
    BadRuleShape { path: PathBuf, key: String },
}

/// Request-time errors from the redirect engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("referenced destination \"{0}\" is not defined")]
    UnknownDestination(String),

    #[error(transparent)]
    Destination(#[from] crate::destinations::DestinationError),
}
