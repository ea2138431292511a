use std::fmt;

use serde::Serialize;

use crate::{
    error::TopologyError,
    topology::stage::{ActivationKind, ResampleMode, Stage, TensorShape, TransformKind},
};

/// Ordered stages plus the shape they accept.
///
/// Only [`PipelineBuilder::build`] creates one, so every pipeline has passed
/// shape inference.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Pipeline {
    input: TensorShape,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn builder(input: TensorShape) -> PipelineBuilder {
        PipelineBuilder::new(input)
    }

    pub fn input_shape(&self) -> TensorShape {
        self.input
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Shape after every stage, in order.
    pub fn shapes(&self) -> Result<Vec<TensorShape>, TopologyError> {
        infer_shapes(self.input, &self.stages)
    }

    pub fn output_shape(&self) -> Result<TensorShape, TopologyError> {
        Ok(self.shapes()?.last().copied().unwrap_or(self.input))
    }

    /// Bounds enforced by the final activation, if it has any.
    pub fn output_range(&self) -> Option<(f64, f64)> {
        match self.stages.last() {
            Some(Stage::Activate { kind, .. }) => kind.output_range(),
            _ => None,
        }
    }
}

fn infer_shapes(input: TensorShape, stages: &[Stage]) -> Result<Vec<TensorShape>, TopologyError> {
    let mut shape = input;
    let mut shapes = Vec::with_capacity(stages.len());
    for (index, stage) in stages.iter().enumerate() {
        shape = stage
            .output_shape(shape)
            .map_err(|source| TopologyError::Stage {
                index,
                stage: stage.clone(),
                source,
            })?;
        shapes.push(shape);
    }
    Ok(shapes)
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sequential(  # input {}", self.input)?;
        let shapes = self.shapes().ok();
        for (index, stage) in self.stages.iter().enumerate() {
            match shapes.as_ref().and_then(|shapes| shapes.get(index)) {
                Some(shape) => writeln!(f, "  ({index}): {stage}  # -> {shape}")?,
                None => writeln!(f, "  ({index}): {stage}")?,
            }
        }
        write!(f, ")")
    }
}

/// Appends stages while tracking the running channel count, so declared
/// input channels always come from the previous stage.
#[derive(Clone, Debug)]
pub struct PipelineBuilder {
    input: TensorShape,
    channels: usize,
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    pub fn new(input: TensorShape) -> Self {
        Self {
            input,
            channels: input.channels,
            stages: Vec::new(),
        }
    }

    pub fn resample(mut self, size: usize, mode: ResampleMode) -> Self {
        self.stages.push(Stage::Resample {
            size,
            mode,
            align_corners: false,
        });
        self
    }

    pub fn conv(self, out_channels: usize, kernel_size: usize, stride: usize, padding: usize) -> Self {
        self.transform(TransformKind::Conv, out_channels, kernel_size, stride, padding)
    }

    pub fn transposed_conv(
        self,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
    ) -> Self {
        self.transform(
            TransformKind::TransposedConv,
            out_channels,
            kernel_size,
            stride,
            padding,
        )
    }

    fn transform(
        mut self,
        kind: TransformKind,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
    ) -> Self {
        self.stages.push(Stage::SpatialTransform {
            kind,
            in_channels: self.channels,
            out_channels,
            kernel_size,
            stride,
            padding,
            bias: false,
        });
        self.channels = out_channels;
        self
    }

    /// Batch normalization over the current channel count.
    pub fn normalize(mut self) -> Self {
        self.stages.push(Stage::Normalize {
            num_features: self.channels,
        });
        self
    }

    pub fn leaky_relu(mut self, negative_slope: f64) -> Self {
        self.stages.push(Stage::Activate {
            kind: ActivationKind::LeakyRelu { negative_slope },
            in_place: true,
        });
        self
    }

    pub fn tanh(mut self) -> Self {
        self.stages.push(Stage::Activate {
            kind: ActivationKind::Tanh,
            in_place: false,
        });
        self
    }

    pub fn sigmoid(mut self) -> Self {
        self.stages.push(Stage::Activate {
            kind: ActivationKind::Sigmoid,
            in_place: false,
        });
        self
    }

    /// Runs shape inference over the collected stages.
    pub fn build(self) -> Result<Pipeline, TopologyError> {
        infer_shapes(self.input, &self.stages)?;
        Ok(Pipeline {
            input: self.input,
            stages: self.stages,
        })
    }
}
