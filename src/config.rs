use burn::config::Config;

use crate::{
    error::TopologyError,
    topology::{MIN_IMAGE_RESOLUTION, TensorShape},
};

/// Geometry of the generator: noise in, image out.
#[derive(Config, Debug)]
pub struct GeneratorConfig {
    /// Side length of the input noise map.
    #[config(default = 2)]
    pub noise_resolution: usize,
    #[config(default = 32)]
    pub noise_channel_count: usize,
    /// Side length of the generated image.
    #[config(default = 64)]
    pub image_resolution: usize,
    #[config(default = 3)]
    pub image_channel_count: usize,
    /// Base channel width; intermediate stages use 1, 4 and 8 times this.
    #[config(default = 64)]
    pub feature_map_count: usize,
}

impl GeneratorConfig {
    pub fn noise_shape(&self) -> TensorShape {
        TensorShape::square(self.noise_channel_count, self.noise_resolution)
    }

    pub fn image_shape(&self) -> TensorShape {
        TensorShape::square(self.image_channel_count, self.image_resolution)
    }

    pub fn validate(&self) -> Result<(), TopologyError> {
        ensure_positive([
            ("noise_resolution", self.noise_resolution),
            ("noise_channel_count", self.noise_channel_count),
            ("image_resolution", self.image_resolution),
            ("image_channel_count", self.image_channel_count),
            ("feature_map_count", self.feature_map_count),
        ])?;
        ensure_image_resolution(self.image_resolution)
    }
}

/// Geometry of the discriminator: image in, label map out.
#[derive(Config, Debug)]
pub struct DiscriminatorConfig {
    #[config(default = 64)]
    pub image_resolution: usize,
    #[config(default = 3)]
    pub image_channel_count: usize,
    /// Side length of the output label map.
    #[config(default = 1)]
    pub label_resolution: usize,
    #[config(default = 1)]
    pub label_channel_count: usize,
    #[config(default = 64)]
    pub feature_map_count: usize,
}

impl DiscriminatorConfig {
    pub fn image_shape(&self) -> TensorShape {
        TensorShape::square(self.image_channel_count, self.image_resolution)
    }

    pub fn label_shape(&self) -> TensorShape {
        TensorShape::square(self.label_channel_count, self.label_resolution)
    }

    pub fn validate(&self) -> Result<(), TopologyError> {
        ensure_positive([
            ("image_resolution", self.image_resolution),
            ("image_channel_count", self.image_channel_count),
            ("label_resolution", self.label_resolution),
            ("label_channel_count", self.label_channel_count),
            ("feature_map_count", self.feature_map_count),
        ])?;
        ensure_image_resolution(self.image_resolution)
    }
}

fn ensure_positive<const N: usize>(fields: [(&'static str, usize); N]) -> Result<(), TopologyError> {
    match fields.iter().find(|(_, value)| *value == 0) {
        Some(&(field, _)) => Err(TopologyError::NonPositive { field }),
        None => Ok(()),
    }
}

fn ensure_image_resolution(resolution: usize) -> Result<(), TopologyError> {
    if resolution < MIN_IMAGE_RESOLUTION {
        return Err(TopologyError::ResolutionTooSmall {
            resolution,
            minimum: MIN_IMAGE_RESOLUTION,
        });
    }
    Ok(())
}
