use burn::{prelude::*, tensor::Distribution};
use log::{debug, info, warn};
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use crate::{
    error::GenerationError,
    model::generator::Generator,
    utils::{save_jpeg, tensor_to_image},
};

/// Value written into grid padding, before the display mapping.
pub const GRID_BACKGROUND: f32 = -0.65;
/// Display mapping `(x - DISPLAY_MEAN) / DISPLAY_STD`, clamped to [0, 1].
pub const DISPLAY_MEAN: f32 = -0.75;
pub const DISPLAY_STD: f32 = 1.5;

#[derive(Config, Debug)]
pub struct GridModeConfig {
    #[config(default = true)]
    pub enabled: bool,
    #[config(default = 64)]
    pub images_per_grid: usize,
    /// Gap in pixels around and between grid cells.
    #[config(default = 2)]
    pub padding: usize,
}

#[derive(Config, Debug)]
pub struct GenerationConfig {
    /// Seed from the wall clock instead of `manual_seed`.
    #[config(default = true)]
    pub auto_seed_enabled: bool,
    #[config(default = 0)]
    pub manual_seed: u64,
    #[config(default = 256)]
    pub image_count: usize,
    #[config(default = 32)]
    pub images_per_batch: usize,
    /// JPEG quality, clamped to 0..=100.
    #[config(default = 95)]
    pub image_quality: i64,
    #[config(default = "GridModeConfig::new()")]
    pub grid_mode: GridModeConfig,
}

impl GenerationConfig {
    /// Pulls out-of-range values back to the nearest usable one.
    pub fn rectified(mut self) -> Self {
        if self.images_per_batch == 0 {
            warn!("images_per_batch must be at least 1, using 1");
            self.images_per_batch = 1;
        }
        let quality = self.image_quality.clamp(0, 100);
        if quality != self.image_quality {
            warn!(
                "image_quality {} is outside 0..=100, using {quality}",
                self.image_quality
            );
            self.image_quality = quality;
        }
        if self.grid_mode.images_per_grid == 0 {
            warn!("grid_mode.images_per_grid must be at least 1, using 1");
            self.grid_mode.images_per_grid = 1;
        }
        self
    }

    /// Size of every noise batch; only the last may be short.
    pub fn batch_sizes(&self) -> Vec<usize> {
        let per_batch = self.images_per_batch.max(1);
        let mut remaining = self.image_count;
        let mut sizes = Vec::with_capacity(self.image_count.div_ceil(per_batch));
        while remaining > 0 {
            let size = remaining.min(per_batch);
            sizes.push(size);
            remaining -= size;
        }
        sizes
    }

    pub fn grid_count(&self) -> usize {
        self.image_count
            .div_ceil(self.grid_mode.images_per_grid.max(1))
    }
}

/// Placement of square images inside a square grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    /// Images per row and per column.
    pub per_side: usize,
    pub image_resolution: usize,
    pub padding: usize,
}

impl GridLayout {
    pub fn new(images_per_grid: usize, image_resolution: usize, padding: usize) -> Self {
        let per_side = (images_per_grid as f64).sqrt().ceil() as usize;
        Self {
            per_side,
            image_resolution,
            padding,
        }
    }

    /// Side length of the whole grid in pixels.
    pub fn side(&self) -> usize {
        self.padding + self.per_side * (self.image_resolution + self.padding)
    }

    /// Top-left pixel `(y, x)` of the cell holding image `index`, row-major.
    pub fn origin(&self, index: usize) -> (usize, usize) {
        let step = self.image_resolution + self.padding;
        let (row, col) = (index / self.per_side, index % self.per_side);
        (self.padding + row * step, self.padding + col * step)
    }
}

/// Tiles `[channels, res, res]` images into one grid tensor. Images past the
/// layout's capacity are ignored.
pub fn images_to_grid<B: Backend>(
    images: &[Tensor<B, 3>],
    channels: usize,
    layout: GridLayout,
    device: &B::Device,
) -> Tensor<B, 3> {
    let side = layout.side();
    let res = layout.image_resolution;
    let capacity = layout.per_side * layout.per_side;

    let mut grid = Tensor::<B, 3>::full([channels, side, side], GRID_BACKGROUND, device);
    for (index, image) in images.iter().take(capacity).enumerate() {
        let (y, x) = layout.origin(index);
        grid = grid.slice_assign([0..channels, y..y + res, x..x + res], image.clone());
    }
    grid
}

pub fn to_display_range<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Tensor<B, D> {
    tensor.sub_scalar(DISPLAY_MEAN).div_scalar(DISPLAY_STD).clamp(0.0, 1.0)
}

#[derive(Debug)]
pub struct GenerationReport {
    pub seed: u64,
    pub image_count: usize,
    pub files: Vec<PathBuf>,
    pub elapsed: Duration,
}

/// Samples noise, runs the generator and writes the results as JPEG files.
#[derive(Debug)]
pub struct GenerationProcess {
    results_dir: PathBuf,
    config: GenerationConfig,
}

impl GenerationProcess {
    pub fn new<P: AsRef<Path>>(results_dir: P, config: GenerationConfig) -> Self {
        Self {
            results_dir: results_dir.as_ref().to_path_buf(),
            config: config.rectified(),
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn resolve_seed(&self) -> u64 {
        if self.config.auto_seed_enabled {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|since| since.as_nanos() as u64)
                .unwrap_or_default()
        } else {
            self.config.manual_seed
        }
    }

    pub fn run<B: Backend>(
        &self,
        generator: &Generator<B>,
        device: &B::Device,
    ) -> Result<GenerationReport, GenerationError> {
        let start = Instant::now();
        info!(
            "Started generation into {}",
            self.results_dir.display()
        );
        fs::create_dir_all(&self.results_dir)?;

        let seed = self.resolve_seed();
        let mode = if self.config.auto_seed_enabled {
            "auto"
        } else {
            "manual"
        };
        info!("Seed ({mode}): {seed}");
        B::seed(seed);

        let image_shape = generator.topology().output_shape()?;
        if image_shape.channels != 1 && image_shape.channels != 3 {
            return Err(GenerationError::UnsupportedChannels(image_shape.channels));
        }

        let images = self.generate_images(generator, device);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|since| since.as_secs())
            .unwrap_or_default();

        let mut files = Vec::new();
        if self.config.grid_mode.enabled {
            let grid_mode = &self.config.grid_mode;
            let layout = GridLayout::new(
                grid_mode.images_per_grid,
                image_shape.height,
                grid_mode.padding,
            );
            for (idx, chunk) in images.chunks(grid_mode.images_per_grid).enumerate() {
                let grid = images_to_grid(chunk, image_shape.channels, layout, device);
                files.push(self.save_as_image("Grid", idx, timestamp, grid)?);
            }
            info!("Saved {} grids", files.len());
        } else {
            for (idx, image) in images.iter().enumerate() {
                files.push(self.save_as_image("Image", idx, timestamp, image.clone())?);
            }
            info!("Saved {} images", files.len());
        }

        let elapsed = start.elapsed();
        info!("Completed generation in {elapsed:.2?}");

        Ok(GenerationReport {
            seed,
            image_count: images.len(),
            files,
            elapsed,
        })
    }

    fn generate_images<B: Backend>(
        &self,
        generator: &Generator<B>,
        device: &B::Device,
    ) -> Vec<Tensor<B, 3>> {
        let noise_shape = generator.topology().input_shape();
        let batch_sizes = self.config.batch_sizes();
        let batch_count = batch_sizes.len();

        let mut images = Vec::with_capacity(self.config.image_count);
        for (idx, size) in batch_sizes.into_iter().enumerate() {
            let noise = Tensor::<B, 4>::random(
                [size, noise_shape.channels, noise_shape.height, noise_shape.width],
                Distribution::Normal(0.0, 1.0),
                device,
            );
            let batch = generator.forward(noise);
            images.extend(batch.iter_dim(0).map(|image| image.squeeze::<3>(0)));

            if idx == 0 || (idx + 1) % 15 == 0 || idx + 1 == batch_count {
                debug!("Generated image batch {} / {batch_count}", idx + 1);
            }
        }
        images
    }

    fn save_as_image<B: Backend>(
        &self,
        prefix: &str,
        idx: usize,
        timestamp: u64,
        tensor: Tensor<B, 3>,
    ) -> Result<PathBuf, GenerationError> {
        let image = tensor_to_image(to_display_range(tensor))?;
        let path = self
            .results_dir
            .join(format!("{prefix}-{}-Time-{timestamp}.jpg", idx + 1));
        save_jpeg(&image, &path, self.config.image_quality.clamp(0, 100) as u8)?;
        Ok(path)
    }
}
