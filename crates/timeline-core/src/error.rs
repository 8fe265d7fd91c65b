use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the scan timeline crates.
#[derive(Error, Debug)]
pub enum TimelineError {
    /// An input file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input file extension is neither `.json` nor `.jsonl`.
    #[error("Unsupported file format: {0} (expected .json or .jsonl)")]
    UnsupportedFormat(PathBuf),

    /// A `.json` document whose top-level value is not an array.
    #[error("Invalid JSON format: the file must contain an array of scan events")]
    NotAnArray,

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// One line of a `.jsonl` file could not be parsed.
    #[error("Failed to parse JSON on line {line}: {source}")]
    JsonLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A top-N value that is neither `all` nor a positive integer.
    #[error("Invalid top-N value: {0} (expected \"all\" or a positive integer)")]
    InvalidTopN(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the timeline crates.
pub type Result<T> = std::result::Result<T, TimelineError>;
