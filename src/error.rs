//! Error types for icon conversion.

use std::io;
use thiserror::Error;

/// Errors raised while converting icons to bitmaps.
#[derive(Debug, Error)]
pub enum IconError {
    /// A required argument was missing or empty.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The icon descriptor does not provide any size variants.
    #[error("Specified icon '{icon}' doesn't provide any sizes")]
    NoSizesDefined { icon: String },

    /// An icon in a group uses a different transparency key than the first icon.
    #[error("Transparency key of the icon at index {index} doesn't match the key of the group")]
    TransparencyMismatch { index: usize },

    /// An icon in a group has a different number of size variants than the first icon.
    #[error("Icon at index {index} defines {actual} sizes, expected {expected}")]
    SizeCountMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// The offset leaves no drawable area inside the target size.
    #[error(
        "Target size of the icon '{name}' cannot be calculated due to offset constraint \
         ({width}x{height}, offset {offset})"
    )]
    ScaleComputationFailed {
        name: String,
        width: u32,
        height: u32,
        offset: u32,
    },

    /// The raster source could not be decoded or the bitmap could not be encoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The SVG source could not be parsed or rendered.
    #[error("SVG error: {0}")]
    Svg(String),

    /// IO error while reading sources or writing bitmaps.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The icon manifest is not valid JSON.
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Result type alias for icon operations.
pub type Result<T> = std::result::Result<T, IconError>;
