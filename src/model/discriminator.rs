use burn::{module::Ignored, prelude::*};

use crate::{
    config::DiscriminatorConfig,
    error::TopologyError,
    model::layers::Sequential,
    topology::{discriminator_topology, Pipeline},
};

#[derive(Module, Debug)]
pub struct Discriminator<B: Backend> {
    net: Sequential<B>,
    topology: Ignored<Pipeline>,
}
impl<B: Backend> Discriminator<B> {
    /// Scores images with a `[batch, label_channels, label_res, label_res]`
    /// map of values in [0, 1].
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        self.net.forward(images)
    }

    pub fn topology(&self) -> &Pipeline {
        &self.topology
    }
}

impl DiscriminatorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Discriminator<B>, TopologyError> {
        let topology = discriminator_topology(self)?;
        let net = Sequential::from_pipeline(&topology, device);

        Ok(Discriminator {
            net,
            topology: Ignored(topology),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MyBackend;
    use burn::tensor::Distribution;

    #[test]
    fn scores_images_in_sigmoid_range() {
        let device = Default::default();
        let config = DiscriminatorConfig::new()
            .with_image_resolution(16)
            .with_image_channel_count(3)
            .with_label_resolution(3)
            .with_label_channel_count(2)
            .with_feature_map_count(2);
        let discriminator = config.init::<MyBackend>(&device).unwrap();

        let images = Tensor::<MyBackend, 4>::random(
            [2, 3, 16, 16],
            Distribution::Uniform(-1.0, 1.0),
            &device,
        );
        let labels = discriminator.forward(images);
        assert_eq!(labels.dims(), [2, 2, 3, 3]);

        let values = labels.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
    }

    #[test]
    fn single_score_per_image_by_default() {
        let device = Default::default();
        let discriminator = DiscriminatorConfig::new()
            .with_feature_map_count(1)
            .init::<MyBackend>(&device)
            .unwrap();

        let images = Tensor::<MyBackend, 4>::zeros([1, 3, 64, 64], &device);
        assert_eq!(discriminator.forward(images).dims(), [1, 1, 1, 1]);
    }
}
