//! Error types for Flutterlog.

use thiserror::Error;

/// A shared error type for the history store and its collaborators.
///
/// Read-side failures (`StorageRead`) are normally recovered inside the store;
/// everything else is surfaced to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlutterlogError {
    /// A persisted value could not be parsed as a record collection
    #[error("Storage read error for key '{key}': {message}")]
    StorageRead { key: String, message: String },

    /// A record with the same id already exists in the collection
    #[error("Duplicate record id: '{0}'")]
    DuplicateId(String),

    /// The key-value backend rejected a write
    #[error("Persistence error for key '{key}': {message}")]
    Persistence { key: String, message: String },

    /// Concurrent writer detected. Reserved; never produced by the current store.
    #[error("Conflict on key '{0}'")]
    Conflict(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A record failed field validation
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A classifier result failed contract validation
    #[error("Invalid classification: {0}")]
    InvalidClassification(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FlutterlogError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a StorageRead error
    pub fn storage_read(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageRead {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a Persistence error
    pub fn persistence(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_duplicate_id(&self) -> bool {
        matches!(self, Self::DuplicateId(_))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_storage_read(&self) -> bool {
        matches!(self, Self::StorageRead { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for FlutterlogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for FlutterlogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, FlutterlogError>`.
pub type Result<T> = std::result::Result<T, FlutterlogError>;
