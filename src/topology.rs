//! Framework-free description of the two networks.
//!
//! A topology is an ordered list of [`Stage`]s together with the shape it
//! accepts. Nothing here owns parameters; see [`crate::model`] for the burn
//! modules built from a [`Pipeline`].

pub mod discriminator;
pub mod generator;
mod pipeline;
mod stage;

pub use discriminator::discriminator_topology;
pub use generator::generator_topology;
pub use pipeline::{Pipeline, PipelineBuilder};
pub use stage::{ActivationKind, ResampleMode, Stage, TensorShape, TransformKind};

/// Side length every topology passes through at its coarsest point.
pub const BASE_RESOLUTION: usize = 4;

/// Divisor of the stage group closest to full resolution.
pub const NEAR_SCALE_DIVISOR: f64 = 2.52;

/// Divisor of the middle stage group, roughly `NEAR_SCALE_DIVISOR` squared.
pub const FAR_SCALE_DIVISOR: f64 = 6.35;

/// Smallest image resolution whose scaled resample targets stay non-empty.
pub const MIN_IMAGE_RESOLUTION: usize = 7;

/// Resolution reached by dividing `resolution` by `divisor`.
///
/// Truncates toward zero, the same way an integer cast of the quotient does.
pub fn scaled_resolution(resolution: usize, divisor: f64) -> usize {
    (resolution as f64 / divisor) as usize
}
