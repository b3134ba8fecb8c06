//! Error types for labeling operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the labeling library.
///
/// Labeling itself cannot fail on a well-formed grid; every variant here is
/// either a violated precondition or a failure of an outer collaborator
/// (configuration files, image I/O, thread pool setup).
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid grid dimensions {width}x{height}: width and height must be positive")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Grid {width}x{height} has too many cells for 32-bit labels")]
    GridTooLarge { width: usize, height: usize },

    #[error("Dimension mismatch: {width}x{height} grid needs {expected} cells, got {actual}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Row {row} has {actual} cells, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Coordinate ({x}, {y}) is outside the {width}x{height} grid")]
    CoordinateOutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("Cell {index} holds label {label}, which is not a foreground cell of the grid")]
    InvalidLabel { index: usize, label: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported configuration format for file '{}'", path.display())]
    UnsupportedConfigFormat { path: PathBuf },

    #[error("Failed to read configuration '{}': {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML configuration '{}': {source}", path.display())]
    ConfigYaml {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },

    #[error("Failed to parse JSON configuration '{}': {source}", path.display())]
    ConfigJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Image error for '{}': {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
