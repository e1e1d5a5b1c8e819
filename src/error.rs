use thiserror::Error;

/// Main error type for spmap
#[derive(Error, Debug)]
pub enum SpmapError {
    /// Output store errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session could not be established with the remote store
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A folder listing request failed
    #[error("Listing failed for {path}: {message}")]
    Listing { path: String, message: String },

    /// A property bag request failed (a blank property is not an error)
    #[error("Metadata fetch failed for {path}: {message}")]
    Metadata { path: String, message: String },

    /// The output store already holds a snapshot relation
    #[error("Relation already exists in output store: {0}")]
    SchemaExists(String),

    /// Traversal bookkeeping invariant broken
    #[error("Traversal error: {0}")]
    Traversal(String),
}

/// Convenient Result type using SpmapError
pub type Result<T> = std::result::Result<T, SpmapError>;
