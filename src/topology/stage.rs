use std::fmt;

use serde::Serialize;

use crate::error::ShapeError;

/// Shape of a single sample as `(channels, height, width)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TensorShape {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl TensorShape {
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self {
            channels,
            height,
            width,
        }
    }

    /// Square map of side `resolution`.
    pub fn square(channels: usize, resolution: usize) -> Self {
        Self::new(channels, resolution, resolution)
    }

    pub fn dims(&self) -> [usize; 3] {
        [self.channels, self.height, self.width]
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.channels, self.height, self.width)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleMode {
    Bilinear,
    Bicubic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    Conv,
    TransposedConv,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    LeakyRelu { negative_slope: f64 },
    Tanh,
    Sigmoid,
}

impl ActivationKind {
    /// Closed interval every output of this activation falls in, if bounded.
    pub fn output_range(&self) -> Option<(f64, f64)> {
        match self {
            ActivationKind::LeakyRelu { .. } => None,
            ActivationKind::Tanh => Some((-1.0, 1.0)),
            ActivationKind::Sigmoid => Some((0.0, 1.0)),
        }
    }
}

/// One atomic tensor transform.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Resample {
        size: usize,
        mode: ResampleMode,
        align_corners: bool,
    },
    SpatialTransform {
        kind: TransformKind,
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        bias: bool,
    },
    Normalize {
        num_features: usize,
    },
    Activate {
        kind: ActivationKind,
        in_place: bool,
    },
}

impl Stage {
    /// Shape produced when `input` is fed to this stage.
    pub fn output_shape(&self, input: TensorShape) -> Result<TensorShape, ShapeError> {
        match *self {
            Stage::Resample { size, .. } => {
                if size == 0 {
                    return Err(ShapeError::EmptyResample { size });
                }
                Ok(TensorShape::square(input.channels, size))
            }
            Stage::SpatialTransform {
                kind,
                in_channels,
                out_channels,
                kernel_size,
                stride,
                padding,
                ..
            } => {
                if in_channels != input.channels {
                    return Err(ShapeError::ChannelMismatch {
                        expected: in_channels,
                        actual: input.channels,
                    });
                }
                let side = |len: usize| match kind {
                    TransformKind::Conv => {
                        conv_output_len(len, kernel_size, stride, padding)
                    }
                    TransformKind::TransposedConv => {
                        conv_transpose_output_len(len, kernel_size, stride, padding)
                    }
                };
                match (side(input.height), side(input.width)) {
                    (Some(height), Some(width)) => {
                        Ok(TensorShape::new(out_channels, height, width))
                    }
                    _ => Err(ShapeError::DegenerateTransform {
                        height: input.height,
                        width: input.width,
                    }),
                }
            }
            Stage::Normalize { num_features } => {
                if num_features != input.channels {
                    return Err(ShapeError::ChannelMismatch {
                        expected: num_features,
                        actual: input.channels,
                    });
                }
                Ok(input)
            }
            Stage::Activate { .. } => Ok(input),
        }
    }

    /// Whether the stage carries learned parameters.
    pub fn is_learned(&self) -> bool {
        matches!(
            self,
            Stage::SpatialTransform { .. } | Stage::Normalize { .. }
        )
    }
}

fn conv_output_len(len: usize, kernel: usize, stride: usize, padding: usize) -> Option<usize> {
    let padded = len + 2 * padding;
    if stride == 0 || padded < kernel {
        return None;
    }
    Some((padded - kernel) / stride + 1)
}

fn conv_transpose_output_len(
    len: usize,
    kernel: usize,
    stride: usize,
    padding: usize,
) -> Option<usize> {
    if len == 0 || stride == 0 {
        return None;
    }
    let full = (len - 1) * stride + kernel;
    if full <= 2 * padding {
        return None;
    }
    Some(full - 2 * padding)
}

impl fmt::Display for ResampleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResampleMode::Bilinear => f.write_str("bilinear"),
            ResampleMode::Bicubic => f.write_str("bicubic"),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Resample {
                size,
                mode,
                align_corners,
            } => write!(
                f,
                "Upsample(size={size}, mode={mode}, align_corners={align_corners})"
            ),
            Stage::SpatialTransform {
                kind,
                in_channels,
                out_channels,
                kernel_size,
                stride,
                padding,
                bias,
            } => {
                let name = match kind {
                    TransformKind::Conv => "Conv2d",
                    TransformKind::TransposedConv => "ConvTranspose2d",
                };
                write!(
                    f,
                    "{name}({in_channels}, {out_channels}, kernel_size={kernel_size}, \
                     stride={stride}, padding={padding}, bias={bias})"
                )
            }
            Stage::Normalize { num_features } => write!(f, "BatchNorm2d({num_features})"),
            Stage::Activate { kind, in_place } => match kind {
                ActivationKind::LeakyRelu { negative_slope } => write!(
                    f,
                    "LeakyReLU(negative_slope={negative_slope}, inplace={in_place})"
                ),
                ActivationKind::Tanh => f.write_str("Tanh()"),
                ActivationKind::Sigmoid => f.write_str("Sigmoid()"),
            },
        }
    }
}
