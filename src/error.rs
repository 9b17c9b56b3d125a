//! Error types for loading, aggregating and rendering post statistics.

use thiserror::Error;

/// Errors surfaced by the library side of postats.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A column the pipeline depends on is absent from the input table.
    #[error("missing required column: '{column}'")]
    MissingColumn { column: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON input must be an array of objects: {0}")]
    InvalidJsonShape(String),

    #[error("SVG error: {0}")]
    Svg(String),

    #[error("cannot allocate a {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },

    #[error("PNG encoding error: {0}")]
    PngEncode(#[from] png::EncodingError),
}

pub type Result<T> = std::result::Result<T, StatsError>;
