use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, InfbkError>;

#[derive(Debug, Error)]
pub enum InfbkError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("archive exceeds maximum allowed size of {limit} bytes")]
    SizeExceeded { limit: u64 },

    #[error("invalid archive format: {0}")]
    InvalidFormat(String),

    #[error("unsupported archive version: {0}")]
    UnsupportedVersion(u8),

    #[error("decryption failed: wrong password or corrupted archive")]
    DecryptionFailed,

    #[error("storage error while {step}: {source}")]
    Storage {
        step: String,
        #[source]
        source: StoreError,
    },

    #[error("invalid backup payload: {0}")]
    InvalidPayload(String),

    #[error("decompression error: {0}")]
    Decompression(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("key derivation error: {0}")]
    KeyDerivation(String),

    #[error("invalid password: {0}")]
    InvalidPassword(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl InfbkError {
    /// Attach the failing step to a storage collaborator error.
    pub fn storage(step: impl Into<String>, source: StoreError) -> Self {
        InfbkError::Storage {
            step: step.into(),
            source,
        }
    }

    /// Collapse the error onto the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InfbkError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            InfbkError::SizeExceeded { .. } => ErrorKind::SizeExceeded,
            InfbkError::InvalidFormat(_) => ErrorKind::FormatInvalid,
            InfbkError::UnsupportedVersion(_) => ErrorKind::VersionUnsupported,
            InfbkError::DecryptionFailed => ErrorKind::DecryptionFailed,
            InfbkError::Storage { .. } => ErrorKind::Storage,
            InfbkError::InvalidPayload(_)
            | InfbkError::Decompression(_)
            | InfbkError::Serialization(_) => ErrorKind::Malformed,
            InfbkError::InvalidPassword(_) | InfbkError::Config(_) => ErrorKind::InvalidInput,
            InfbkError::KeyDerivation(_) | InfbkError::Io(_) | InfbkError::Other(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Caller-facing failure classes. Detail stays on the `InfbkError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    PermissionDenied,
    SizeExceeded,
    FormatInvalid,
    VersionUnsupported,
    DecryptionFailed,
    Storage,
    Malformed,
    InvalidInput,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::SizeExceeded => "size_exceeded",
            ErrorKind::FormatInvalid => "format_invalid",
            ErrorKind::VersionUnsupported => "version_unsupported",
            ErrorKind::DecryptionFailed => "decryption_failed",
            ErrorKind::Storage => "storage_error",
            ErrorKind::Malformed => "malformed",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Errors raised by the storage collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} '{id}' already exists")]
    Duplicate { entity: &'static str, id: String },

    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
