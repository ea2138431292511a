use burn::{module::Ignored, prelude::*};

use crate::{
    config::GeneratorConfig,
    error::TopologyError,
    model::layers::Sequential,
    topology::{generator_topology, Pipeline},
};

#[derive(Module, Debug)]
pub struct Generator<B: Backend> {
    net: Sequential<B>,
    topology: Ignored<Pipeline>,
}
impl<B: Backend> Generator<B> {
    /// Maps `[batch, noise_channels, noise_res, noise_res]` noise to
    /// `[batch, image_channels, image_res, image_res]` images in [-1, 1].
    pub fn forward(&self, noise: Tensor<B, 4>) -> Tensor<B, 4> {
        self.net.forward(noise)
    }

    pub fn topology(&self) -> &Pipeline {
        &self.topology
    }
}

impl GeneratorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Generator<B>, TopologyError> {
        let topology = generator_topology(self)?;
        let net = Sequential::from_pipeline(&topology, device);

        Ok(Generator {
            net,
            topology: Ignored(topology),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{topology::TensorShape, MyBackend};
    use burn::tensor::Distribution;

    #[test]
    fn generates_images_in_tanh_range() {
        let device = Default::default();
        let config = GeneratorConfig::new()
            .with_noise_resolution(1)
            .with_noise_channel_count(8)
            .with_image_resolution(16)
            .with_image_channel_count(3)
            .with_feature_map_count(2);
        let generator = config.init::<MyBackend>(&device).unwrap();
        assert_eq!(
            generator.topology().output_shape().unwrap(),
            TensorShape::square(3, 16)
        );

        let noise = Tensor::<MyBackend, 4>::random([2, 8, 1, 1], Distribution::Normal(0.0, 1.0), &device);
        let images = generator.forward(noise);
        assert_eq!(images.dims(), [2, 3, 16, 16]);

        let values = images.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| v.is_finite() && (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn init_rejects_invalid_config() {
        let device = Default::default();
        let config = GeneratorConfig::new().with_image_resolution(4);
        assert!(config.init::<MyBackend>(&device).is_err());
    }
}
