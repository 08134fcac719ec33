use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::canvas::PixelIndex;

/// Errors which abort a render.
///
/// None of these are recoverable for the frame in progress: a render either
/// produces a color for every pixel, or it produces nothing.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("pixel {index} lies outside the {width}x{height} frame")]
    PixelOutOfBounds {
        index: PixelIndex,
        width: usize,
        height: usize,
    },

    #[error("pixel {index} was produced more than once")]
    DuplicatePixel { index: PixelIndex },

    #[error("frame is incomplete: {missing} pixels never arrived")]
    IncompleteFrame { missing: usize },

    #[error("a render worker panicked")]
    WorkerPanicked,

    #[error("render pipeline disconnected before the frame completed")]
    Disconnected,

    #[error("render was cancelled")]
    Cancelled,
}

/// Errors produced while loading or generating a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read scene file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse scene description")]
    Json(#[from] serde_json::Error),

    #[error("sphere {index} is invalid (radius must be positive and all components finite)")]
    InvalidSphere { index: usize },
}

/// Errors produced while persisting a finished frame.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("pixel buffer holds {actual} bytes, expected {expected} for the frame size")]
    BufferSize { expected: usize, actual: usize },

    #[error("frame of {width}x{height} is too large to encode")]
    Dimensions { width: usize, height: usize },

    #[error("unsupported image format for {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}
