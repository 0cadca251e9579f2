//! Error types for configuration, frame decoding and file I/O.

use thiserror::Error;

/// Configuration rejected before any frame is processed.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Focal length is zero, negative or not finite.
    #[error("invalid focal length: fx={fx}, fy={fy}")]
    InvalidFocalLength {
        /// Horizontal focal length in pixels.
        fx: f64,
        /// Vertical focal length in pixels.
        fy: f64,
    },

    /// Intrinsics describe an image with no pixels.
    #[error("invalid image size: {width}x{height}")]
    InvalidImageSize {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// Cell size must be positive and finite.
    #[error("invalid cell size: {0}")]
    InvalidCellSize(f64),

    /// Grid extents produce zero rows or columns.
    #[error("grid has zero dimension: {rows} rows x {cols} cols")]
    EmptyGrid {
        /// Number of forward cells.
        rows: usize,
        /// Number of lateral cells.
        cols: usize,
    },

    /// Binarization patch must be at least one cell wide.
    #[error("patch size must be non-zero")]
    ZeroPatchSize,

    /// Maximum distance of zero would discard every return.
    #[error("max distance must be non-zero")]
    ZeroMaxDistance,

    /// A named parameter is out of its valid range.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in the config file.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid parameter error.
    #[must_use]
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// A depth frame that cannot be processed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameError {
    /// Only single-channel 16-bit encodings are accepted.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Pixel buffer does not hold width x height samples.
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Row stride is shorter than one row of samples.
    #[error("row step {step} is shorter than {min} bytes")]
    InvalidStep {
        /// Declared step in bytes.
        step: usize,
        /// Minimum step for the frame width.
        min: usize,
    },

    /// Frame size differs from the configured intrinsics.
    #[error("frame is {actual:?}, intrinsics expect {expected:?}")]
    DimensionMismatch {
        /// (width, height) from the intrinsics.
        expected: (u32, u32),
        /// (width, height) of the frame.
        actual: (u32, u32),
    },

    /// Image file could not be decoded as a depth frame.
    #[error("cannot decode depth image: {0}")]
    Decode(String),
}

impl FrameError {
    /// Creates a buffer size mismatch error.
    #[must_use]
    pub const fn buffer_mismatch(expected: usize, actual: usize) -> Self {
        Self::BufferSizeMismatch { expected, actual }
    }
}

/// Failures of the file adapters around the pipeline.
#[derive(Debug, Error)]
pub enum IoError {
    /// Underlying filesystem error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Image encoding error.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// Glob pattern error.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Loaded configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
