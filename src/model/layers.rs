use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        interpolate::{Interpolate2d, Interpolate2dConfig, InterpolateMode},
        BatchNorm, BatchNormConfig, LeakyRelu, LeakyReluConfig, PaddingConfig2d, Sigmoid, Tanh,
    },
    prelude::*,
};

use crate::topology::{ActivationKind, Pipeline, ResampleMode, Stage, TransformKind};

/// One stage of a [`Pipeline`] realised as a burn module.
#[derive(Module, Debug)]
pub enum Layer<B: Backend> {
    Resample(Interpolate2d),
    Conv(Conv2d<B>),
    ConvTranspose(ConvTranspose2d<B>),
    Norm(BatchNorm<B, 2>),
    LeakyRelu(LeakyRelu),
    Tanh(Tanh),
    Sigmoid(Sigmoid),
}

impl<B: Backend> Layer<B> {
    pub fn from_stage(stage: &Stage, device: &B::Device) -> Self {
        match *stage {
            Stage::Resample { size, mode, .. } => {
                // burn's interpolation exposes no corner-alignment switch
                let layer = Interpolate2dConfig::new()
                    .with_output_size(Some([size, size]))
                    .with_mode(interpolate_mode(mode))
                    .init();
                Layer::Resample(layer)
            }
            Stage::SpatialTransform {
                kind: TransformKind::Conv,
                in_channels,
                out_channels,
                kernel_size,
                stride,
                padding,
                bias,
            } => {
                let conv = Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
                    .with_stride([stride, stride])
                    .with_padding(PaddingConfig2d::Explicit(padding, padding))
                    .with_bias(bias)
                    .init(device);
                Layer::Conv(conv)
            }
            Stage::SpatialTransform {
                kind: TransformKind::TransposedConv,
                in_channels,
                out_channels,
                kernel_size,
                stride,
                padding,
                bias,
            } => {
                let conv = ConvTranspose2dConfig::new(
                    [in_channels, out_channels],
                    [kernel_size, kernel_size],
                )
                .with_stride([stride, stride])
                .with_padding([padding, padding])
                .with_bias(bias)
                .init(device);
                Layer::ConvTranspose(conv)
            }
            Stage::Normalize { num_features } => {
                Layer::Norm(BatchNormConfig::new(num_features).init(device))
            }
            // burn tensors are moved through forward, so in-place has nothing to toggle
            Stage::Activate { kind, .. } => match kind {
                ActivationKind::LeakyRelu { negative_slope } => Layer::LeakyRelu(
                    LeakyReluConfig::new()
                        .with_negative_slope(negative_slope)
                        .init(),
                ),
                ActivationKind::Tanh => Layer::Tanh(Tanh::new()),
                ActivationKind::Sigmoid => Layer::Sigmoid(Sigmoid::new()),
            },
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Layer::Resample(layer) => layer.forward(input),
            Layer::Conv(layer) => layer.forward(input),
            Layer::ConvTranspose(layer) => layer.forward(input),
            Layer::Norm(layer) => layer.forward(input),
            Layer::LeakyRelu(layer) => layer.forward(input),
            Layer::Tanh(layer) => layer.forward(input),
            Layer::Sigmoid(layer) => layer.forward(input),
        }
    }
}

fn interpolate_mode(mode: ResampleMode) -> InterpolateMode {
    match mode {
        ResampleMode::Bilinear => InterpolateMode::Linear,
        ResampleMode::Bicubic => InterpolateMode::Cubic,
    }
}

/// Layers applied strictly in order.
#[derive(Module, Debug)]
pub struct Sequential<B: Backend> {
    layers: Vec<Layer<B>>,
}

impl<B: Backend> Sequential<B> {
    pub fn from_pipeline(pipeline: &Pipeline, device: &B::Device) -> Self {
        let layers = pipeline
            .stages()
            .iter()
            .map(|stage| Layer::from_stage(stage, device))
            .collect();

        Self { layers }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.layers
            .iter()
            .fold(input, |output, layer| layer.forward(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{topology::TensorShape, MyBackend};

    #[test]
    fn resample_then_project() {
        let device = Default::default();

        let pipeline = Pipeline::builder(TensorShape::square(2, 3))
            .resample(6, ResampleMode::Bilinear)
            .conv(4, 3, 1, 1)
            .normalize()
            .leaky_relu(0.2)
            .resample(2, ResampleMode::Bicubic)
            .transposed_conv(1, 5, 1, 2)
            .sigmoid()
            .build()
            .unwrap();
        let net = Sequential::<MyBackend>::from_pipeline(&pipeline, &device);
        assert_eq!(net.len(), pipeline.len());

        let input = Tensor::<MyBackend, 4>::ones([5, 2, 3, 3], &device);
        let output = net.forward(input);
        assert_eq!(output.dims(), [5, 1, 2, 2]);

        let values = output.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn learned_layers_carry_parameters() {
        let device = Default::default();

        let pipeline = Pipeline::builder(TensorShape::square(3, 4))
            .conv(2, 3, 1, 1)
            .normalize()
            .tanh()
            .build()
            .unwrap();
        let net = Sequential::<MyBackend>::from_pipeline(&pipeline, &device);

        // 3 * 2 * 3 * 3 conv weights without bias; the norm counts gamma,
        // beta and its running mean and variance
        assert_eq!(net.num_params(), 54 + 4 * 2);
    }

    #[test]
    fn conv_bias_follows_the_stage() {
        let device = Default::default();
        let conv = |bias| Stage::SpatialTransform {
            kind: TransformKind::Conv,
            in_channels: 3,
            out_channels: 2,
            kernel_size: 3,
            stride: 1,
            padding: 1,
            bias,
        };

        let without = Layer::<MyBackend>::from_stage(&conv(false), &device);
        let with = Layer::<MyBackend>::from_stage(&conv(true), &device);
        assert_eq!(without.num_params(), 54);
        assert_eq!(with.num_params(), 54 + 2);
    }
}
