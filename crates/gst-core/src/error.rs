use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the ggst crates.
#[derive(Error, Debug)]
pub enum GstError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row is missing a column, has a column of the wrong type, or is
    /// internally inconsistent.
    #[error("Malformed row at {origin}: {reason}")]
    MalformedRow { origin: String, reason: String },

    /// A particle list claims more entries than the row format can hold.
    #[error("Particle list overflow at {origin}: {list} has {count} entries, capacity is {capacity}")]
    ParticleOverflow {
        origin: String,
        list: &'static str,
        count: i64,
        capacity: usize,
    },

    /// None of the input arguments resolved to a readable file.
    #[error("No input files matched: {}", .0.join(", "))]
    NoInputFiles(Vec<String>),

    /// The configuration / generator tag could not be derived.
    #[error("Cannot derive run tag: {0}")]
    RunTag(String),

    /// A selection or aggregate name was registered twice.
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// An operation was called in the wrong lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the ggst crates.
pub type Result<T> = std::result::Result<T, GstError>;
