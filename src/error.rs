use std::path::PathBuf;

use thiserror::Error;

use crate::topology::Stage;

/// Why a single stage cannot accept the shape handed to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("expects {expected} input channels but receives {actual}")]
    ChannelMismatch { expected: usize, actual: usize },
    #[error("resamples to an empty {size}x{size} map")]
    EmptyResample { size: usize },
    #[error("cannot transform a {height}x{width} map into a non-empty output")]
    DegenerateTransform { height: usize, width: usize },
}

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("configuration field `{field}` must be positive")]
    NonPositive { field: &'static str },

    #[error("image_resolution {resolution} is too small, at least {minimum} is required")]
    ResolutionTooSmall { resolution: usize, minimum: usize },

    #[error("stage {index} ({stage}) {source}")]
    Stage {
        index: usize,
        stage: Stage,
        #[source]
        source: ShapeError,
    },

    #[error("{field} differs between generator ({generator}) and discriminator ({discriminator})")]
    IncompatiblePair {
        field: &'static str,
        generator: usize,
        discriminator: usize,
    },
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("failed to load configuration {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("failed to access model record {path}: {message}")]
    Record { path: PathBuf, message: String },

    #[error("cannot write an image with {0} channels (supported: 1, 3)")]
    UnsupportedChannels(usize),
}
