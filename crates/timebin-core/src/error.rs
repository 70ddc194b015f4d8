use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimebinError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("Invalid TIFF stack: {0}")]
    InvalidTiff(String),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    #[error("Unsupported stack format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("Window size must be between 1 and {max}, got {size}")]
    InvalidWindowSize { size: usize, max: usize },

    #[error("Worker count must be at least 1")]
    InvalidWorkerCount,

    #[error("No input files given")]
    NoInputs,

    #[error("Failed to decode frame {frame} of series {series} in {}: {source}", .path.display())]
    SourceDecode {
        path: PathBuf,
        series: usize,
        frame: usize,
        #[source]
        source: Box<TimebinError>,
    },

    #[error(
        "Shape mismatch in window {window} at frame {frame}: expected {}x{}, found {}x{}",
        .expected.1, .expected.0, .found.1, .found.0
    )]
    ShapeMismatch {
        window: usize,
        frame: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Worker failed while reducing window {window}: {reason}")]
    WorkerFailure { window: usize, reason: String },

    #[error("Failed to write {}: {source}", .path.display())]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("Metadata error in {}: {reason}", .path.display())]
    Metadata { path: PathBuf, reason: String },

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TimebinError>;
