use log::debug;

use crate::{
    config::DiscriminatorConfig,
    error::TopologyError,
    topology::{
        scaled_resolution, Pipeline, ResampleMode, BASE_RESOLUTION, FAR_SCALE_DIVISOR,
        NEAR_SCALE_DIVISOR,
    },
};

/// Steeper than the generator's slope; both values are kept as tuned.
pub const DISCRIMINATOR_LEAKY_SLOPE: f64 = 0.2;

/// Resize-convolution discriminator, the mirror of the generator: each group
/// convolves at the incoming resolution and then resamples down.
pub fn discriminator_topology(config: &DiscriminatorConfig) -> Result<Pipeline, TopologyError> {
    config.validate()?;

    let fm = config.feature_map_count;
    let ir = config.image_resolution;

    let pipeline = Pipeline::builder(config.image_shape())
        // group 1, scale 1 / 2.52
        .conv(fm, 5, 1, 2)
        .resample(scaled_resolution(ir, NEAR_SCALE_DIVISOR), ResampleMode::Bicubic)
        .normalize()
        .leaky_relu(DISCRIMINATOR_LEAKY_SLOPE)
        // group 2, scale 1 / 6.35 ~= 1 / 2.52^2
        .conv(4 * fm, 3, 1, 1)
        .resample(scaled_resolution(ir, FAR_SCALE_DIVISOR), ResampleMode::Bilinear)
        .normalize()
        .leaky_relu(DISCRIMINATOR_LEAKY_SLOPE)
        // group 3, scale 1 / 16 ~= 1 / 2.52^3
        .conv(8 * fm, 3, 1, 1)
        .resample(BASE_RESOLUTION, ResampleMode::Bilinear)
        .normalize()
        .leaky_relu(DISCRIMINATOR_LEAKY_SLOPE)
        // group 4, output
        .conv(config.label_channel_count, 3, 1, 1)
        .resample(config.label_resolution, ResampleMode::Bicubic)
        .sigmoid()
        .build()?;

    debug!("Built discriminator topology:\n{pipeline}");
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{ActivationKind, Stage, TensorShape, TransformKind};

    fn example_config() -> DiscriminatorConfig {
        DiscriminatorConfig::new()
            .with_image_resolution(64)
            .with_image_channel_count(3)
            .with_label_resolution(64)
            .with_label_channel_count(1)
            .with_feature_map_count(32)
    }

    #[test]
    fn example_topology() {
        let pipeline = discriminator_topology(&example_config()).unwrap();

        assert_eq!(pipeline.len(), 15);
        assert_eq!(pipeline.input_shape(), TensorShape::square(3, 64));
        assert_eq!(pipeline.output_shape().unwrap(), TensorShape::square(1, 64));
        assert_eq!(pipeline.output_range(), Some((0.0, 1.0)));

        let shapes = pipeline.shapes().unwrap();
        assert_eq!(shapes[1], TensorShape::square(32, 25));
        assert_eq!(shapes[5], TensorShape::square(128, 10));
        assert_eq!(shapes[9], TensorShape::square(256, 4));
    }

    #[test]
    fn convolutions_widen_then_project() {
        let pipeline = discriminator_topology(&example_config()).unwrap();
        let widths: Vec<(usize, usize, usize)> = pipeline
            .stages()
            .iter()
            .filter_map(|stage| match stage {
                Stage::SpatialTransform {
                    kind: TransformKind::Conv,
                    in_channels,
                    out_channels,
                    kernel_size,
                    ..
                } => Some((*in_channels, *out_channels, *kernel_size)),
                _ => None,
            })
            .collect();
        assert_eq!(
            widths,
            vec![(3, 32, 5), (32, 128, 3), (128, 256, 3), (256, 1, 3)]
        );
    }

    #[test]
    fn keeps_its_own_leaky_slope() {
        let pipeline = discriminator_topology(&example_config()).unwrap();
        let slopes: Vec<f64> = pipeline
            .stages()
            .iter()
            .filter_map(|stage| match stage {
                Stage::Activate {
                    kind: ActivationKind::LeakyRelu { negative_slope },
                    in_place: true,
                } => Some(*negative_slope),
                _ => None,
            })
            .collect();
        assert_eq!(slopes, vec![0.2; 3]);
    }

    #[test]
    fn scalar_label_by_default() {
        let pipeline = discriminator_topology(&DiscriminatorConfig::new()).unwrap();
        assert_eq!(pipeline.output_shape().unwrap(), TensorShape::square(1, 1));
        assert!(matches!(
            pipeline.stages()[13],
            Stage::Resample {
                size: 1,
                mode: ResampleMode::Bicubic,
                ..
            }
        ));
    }
}
