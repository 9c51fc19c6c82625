//! Fatal error conditions of a generation run.
//!
//! Per-item and per-scope failures are logged where they happen and never
//! reach this type; everything here aborts the run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    /// Persist and diff were both requested.
    #[error("--write and --diff are mutually exclusive")]
    ConflictingModes,

    /// A child profile references a login profile that was not generated.
    #[error("profile '{child}' requires login profile '{parent}', which was not generated")]
    MissingParent { child: String, parent: String },

    #[error("cannot read persisted profiles {}: {source}", path.display())]
    ReadPersisted {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed persisted profiles {}: {source}", path.display())]
    ParsePersisted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot write profiles to {}: {source}", path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read instance cache {}: {source}", path.display())]
    ReadCache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed instance cache {}: {source}", path.display())]
    ParseCache {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot write instance cache {}: {source}", path.display())]
    WriteCache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no cache directory is available on this platform")]
    CacheDirUnavailable,

    #[error("cannot serialize profiles: {0}")]
    Serialize(#[source] serde_json::Error),
}
