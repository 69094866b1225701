use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors produced by the glucose trend tooling.
///
/// Degradations inside the pipeline (too few points to smooth, a collapsed
/// IQR) are not errors; they are reported as
/// [`PipelineNotice`](crate::models::PipelineNotice) values instead.
#[derive(Error, Debug)]
pub enum TrendError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The export could not be parsed as CSV.
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// A JSON document could not be parsed or produced.
    #[error("Failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A schema name string is not one of the recognised export schemas.
    #[error("Unknown export schema: {0}")]
    UnknownSchema(String),

    /// No header row matching a known export schema was found.
    #[error("Could not detect export schema in {0}")]
    SchemaNotDetected(PathBuf),

    /// The header row lacks a column the selected schema requires.
    #[error("Missing column \"{column}\" for {schema} export")]
    MissingColumn { schema: String, column: String },

    /// The configured timestamp layout is not a valid strftime pattern.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// The series handed to the pipeline contains no readings.
    #[error("No readings to analyse")]
    EmptyInput,

    /// Readings were not strictly increasing by timestamp.
    #[error("Series is not strictly increasing at index {index}")]
    UnorderedSeries { index: usize },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the glucose crates.
pub type Result<T> = std::result::Result<T, TrendError>;
