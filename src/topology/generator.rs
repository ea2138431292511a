use log::debug;

use crate::{
    config::GeneratorConfig,
    error::TopologyError,
    topology::{
        scaled_resolution, Pipeline, ResampleMode, BASE_RESOLUTION, FAR_SCALE_DIVISOR,
        NEAR_SCALE_DIVISOR,
    },
};

pub const GENERATOR_LEAKY_SLOPE: f64 = 2e-3;

/// Resize-transposed-convolution generator.
///
/// Each group resamples first and then applies a stride-1 transposed
/// convolution, so resolution grows through interpolation rather than
/// strided upsampling. Targets: 4, `ir / 6.35`, `ir / 2.52`, `ir`.
pub fn generator_topology(config: &GeneratorConfig) -> Result<Pipeline, TopologyError> {
    config.validate()?;

    let fm = config.feature_map_count;
    let ir = config.image_resolution;

    let pipeline = Pipeline::builder(config.noise_shape())
        // group 1, scale 1 / 16 ~= 1 / 2.52^3
        .resample(BASE_RESOLUTION, ResampleMode::Bicubic)
        .transposed_conv(8 * fm, 3, 1, 1)
        .leaky_relu(GENERATOR_LEAKY_SLOPE)
        // group 2, scale 1 / 6.35 ~= 1 / 2.52^2
        .resample(scaled_resolution(ir, FAR_SCALE_DIVISOR), ResampleMode::Bilinear)
        .transposed_conv(4 * fm, 3, 1, 1)
        .normalize()
        .leaky_relu(GENERATOR_LEAKY_SLOPE)
        // group 3, scale 1 / 2.52
        .resample(scaled_resolution(ir, NEAR_SCALE_DIVISOR), ResampleMode::Bilinear)
        .transposed_conv(fm, 3, 1, 1)
        .normalize()
        .leaky_relu(GENERATOR_LEAKY_SLOPE)
        // group 4, output
        .resample(ir, ResampleMode::Bicubic)
        .transposed_conv(config.image_channel_count, 5, 1, 2)
        .tanh()
        .build()?;

    debug!("Built generator topology:\n{pipeline}");
    Ok(pipeline)
}
