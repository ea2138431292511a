use burn::prelude::*;
use image::{codecs::jpeg::JpegEncoder, Rgb, RgbImage};
use std::{fs::File, io::BufWriter, path::Path};

use crate::error::GenerationError;

/// Converts a `[channels, height, width]` tensor with values in [0, 1] into
/// an 8-bit RGB image. Single-channel tensors are written as grey.
pub fn tensor_to_image<B: Backend>(image: Tensor<B, 3>) -> Result<RgbImage, GenerationError> {
    let [channels, height, width] = image.dims();
    if channels != 1 && channels != 3 {
        return Err(GenerationError::UnsupportedChannels(channels));
    }

    let values = image.into_data().iter::<f32>().collect::<Vec<f32>>();
    let plane = height * width;

    // planar CHW -> interleaved RGB
    let image = RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let idx = y as usize * width + x as usize;
        Rgb(std::array::from_fn(|channel| {
            let value = values[(channel % channels) * plane + idx];
            (value.clamp(0.0, 1.0) * 255.0).round() as u8
        }))
    });

    Ok(image)
}

/// Writes `image` as a JPEG of the given quality (clamped to 1..=100).
pub fn save_jpeg<P: AsRef<Path>>(image: &RgbImage, path: P, quality: u8) -> Result<(), GenerationError> {
    let writer = BufWriter::new(File::create(path)?);
    let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
    image.write_with_encoder(encoder)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MyBackend;

    #[test]
    fn planar_channels_are_interleaved() {
        let device = Default::default();
        // 3 channels, 1 row, 2 columns
        let data = [[[1.0, 0.0]], [[0.0, 1.0]], [[0.5, 0.0]]];
        let tensor = Tensor::<MyBackend, 3>::from_data(data, &device);

        let image = tensor_to_image(tensor).unwrap();
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 128]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 255, 0]);
    }

    #[test]
    fn grey_images_repeat_their_channel() {
        let device = Default::default();
        let tensor = Tensor::<MyBackend, 3>::from_data([[[0.0, 2.0]]], &device);

        let image = tensor_to_image(tensor).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(image.get_pixel(1, 0).0, [255, 255, 255]);
    }

    #[test]
    fn two_channel_images_are_refused() {
        let device = Default::default();
        let tensor = Tensor::<MyBackend, 3>::zeros([2, 4, 4], &device);
        assert!(matches!(
            tensor_to_image(tensor),
            Err(GenerationError::UnsupportedChannels(2))
        ));
    }
}
