pub mod discriminator;
pub mod generator;
mod layers;

pub use layers::{Layer, Sequential};

use burn::{module::Module, prelude::*};

use crate::{
    config::{DiscriminatorConfig, GeneratorConfig},
    error::TopologyError,
    model::{discriminator::Discriminator, generator::Generator},
};

#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    pub generator: Generator<B>,
    pub discriminator: Discriminator<B>,
}

#[derive(Config, Debug)]
pub struct ModelConfig {
    pub generator_config: GeneratorConfig,
    pub discriminator_config: DiscriminatorConfig,
}
impl ModelConfig {
    /// The discriminator must accept exactly what the generator produces.
    pub fn validate(&self) -> Result<(), TopologyError> {
        let generator = &self.generator_config;
        let discriminator = &self.discriminator_config;

        let pairs = [
            (
                "image_resolution",
                generator.image_resolution,
                discriminator.image_resolution,
            ),
            (
                "image_channel_count",
                generator.image_channel_count,
                discriminator.image_channel_count,
            ),
        ];
        for (field, generator, discriminator) in pairs {
            if generator != discriminator {
                return Err(TopologyError::IncompatiblePair {
                    field,
                    generator,
                    discriminator,
                });
            }
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Model<B>, TopologyError> {
        self.validate()?;
        let generator = self.generator_config.init(device)?;
        let discriminator = self.discriminator_config.init(device)?;

        Ok(Model {
            generator,
            discriminator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MyBackend;

    #[test]
    fn generated_images_fit_the_discriminator() {
        let device = Default::default();
        let config = ModelConfig::new(
            GeneratorConfig::new()
                .with_noise_resolution(2)
                .with_noise_channel_count(4)
                .with_image_resolution(12)
                .with_feature_map_count(1),
            DiscriminatorConfig::new()
                .with_image_resolution(12)
                .with_feature_map_count(1),
        );
        let model = config.init::<MyBackend>(&device).unwrap();

        let noise = Tensor::<MyBackend, 4>::zeros([3, 4, 2, 2], &device);
        let scores = model.discriminator.forward(model.generator.forward(noise));
        assert_eq!(scores.dims(), [3, 1, 1, 1]);
    }

    #[test]
    fn mismatched_pair_is_rejected() {
        let config = ModelConfig::new(
            GeneratorConfig::new().with_image_resolution(32),
            DiscriminatorConfig::new(),
        );
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            TopologyError::IncompatiblePair {
                field: "image_resolution",
                generator: 32,
                discriminator: 64,
            }
        ));
    }
}
