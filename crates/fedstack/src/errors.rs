//! # Error Types

/// Errors from fedstack operations.
#[derive(Debug, thiserror::Error)]
pub enum FedstackError {
    /// The split name is not one of the known splits.
    #[error("invalid split={0:?}")]
    InvalidSplit(String),

    /// The load mode is not supported.
    #[error("unsupported mode={0:?}")]
    UnsupportedMode(String),

    /// An argument is out of its valid domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A required feature is absent from a record.
    #[error("missing feature {0:?}")]
    MissingFeature(String),

    /// A feature has the wrong column type.
    #[error("feature {name:?} is {found}, expected {expected}")]
    FeatureType {
        /// The feature name.
        name: String,
        /// The expected column kind.
        expected: &'static str,
        /// The found column kind.
        found: &'static str,
    },

    /// The features of one record disagree on the number of examples.
    #[error("feature {name:?} has {found} examples, expected {expected}")]
    LengthMismatch {
        /// The feature name.
        name: String,
        /// The example count of the first feature.
        expected: usize,
        /// The example count of `name`.
        found: usize,
    },

    /// The client is not in the store.
    #[error("unknown client {0:?}")]
    UnknownClient(String),

    /// Parse error (vocabulary lines, etc.)
    #[error("parse error: {0}")]
    Parse(String),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// `SQLite` error.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Record (de)serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A stored record blob could not be decoded.
    #[error("record codec error: {0}")]
    Codec(String),

    /// Download or disk cache failure.
    #[error("download error: {0}")]
    Download(String),
}

/// Result type for fedstack operations.
pub type FSResult<T> = core::result::Result<T, FedstackError>;
