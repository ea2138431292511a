//! Resize-convolution GAN topologies.
//!
//! [`topology`] turns a [`config::GeneratorConfig`] or
//! [`config::DiscriminatorConfig`] into a shape-checked [`topology::Pipeline`];
//! [`model`] realises a pipeline as burn modules; [`generation`] samples
//! images from a generator and writes them to disk.

pub mod config;
pub mod error;
pub mod export;
pub mod generation;
pub mod model;
pub mod topology;
pub mod utils;

use log::LevelFilter;

#[cfg(not(feature = "wgpu"))]
pub type MyBackend = burn::backend::NdArray<f32>;
#[cfg(feature = "wgpu")]
pub type MyBackend = burn::backend::Wgpu<f32>;

/// Initialize logging once.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies.
pub fn init_logging(default_filter: LevelFilter) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );

    // a second call leaves the existing logger in place
    let _ = builder.try_init();
}
