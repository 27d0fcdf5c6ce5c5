//! Save system errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the save/restore protocol.
///
/// Only structural failures reach the caller: missing files, unresolvable
/// prefab templates, stream corruption. Per-record and per-member
/// resolution failures are logged and skipped so a partially matching
/// stream still loads as far as possible.
#[derive(Debug, Error)]
pub enum SaveError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Stream ended before a field could be read
    #[error("unexpected end of save stream")]
    UnexpectedEof,
    /// Stream contains bytes that cannot be decoded
    #[error("corrupted save data: {0}")]
    Corrupted(String),
    /// A value outside the storable set was selected for saving
    #[error("value is not storable: {0}")]
    UnsupportedValue(String),
    /// A record references a prefab template that is not registered
    #[error("prefab template not registered: {0}")]
    PrefabNotRegistered(String),
    /// A template was explicitly registered under an occupied hash
    #[error("prefab hash already registered: {0}")]
    DuplicateHash(String),
    /// The configured save directory is an existing regular file
    #[error("save path is a regular file: {0}")]
    PathIsFile(PathBuf),
    /// No save with the given name exists on disk
    #[error("save not found: {0}")]
    SaveNotFound(String),
}
