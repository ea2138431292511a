use anyhow::{Context, Result};
use burn::tensor::Device;
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use serde::Serialize;
use std::path::PathBuf;

use rcgan::{
    config::{DiscriminatorConfig, GeneratorConfig},
    export::{load_config, ExportDir},
    generation::{GenerationConfig, GenerationProcess},
    init_logging,
    model::ModelConfig,
    topology::{discriminator_topology, generator_topology, Pipeline, TensorShape},
    MyBackend,
};

/// Build, export and sample resize-convolution GAN topologies.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print both topologies with the shape after every stage.
    Describe {
        #[command(flatten)]
        networks: NetworkArgs,
        /// Emit JSON instead of a layer listing.
        #[arg(long)]
        json: bool,
    },
    /// Write configs and freshly initialized weights into an export directory.
    Export {
        dir: PathBuf,
        #[command(flatten)]
        networks: NetworkArgs,
        /// Generation settings JSON. Defaults apply when omitted.
        #[arg(long)]
        generation_config: Option<PathBuf>,
    },
    /// Generate images with the generator stored in an export directory.
    Generate {
        dir: PathBuf,
        /// Generation settings JSON. Defaults to `<dir>/generation_config.json`.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, clap::Args)]
struct NetworkArgs {
    /// Generator config JSON. Defaults apply when omitted.
    #[arg(long)]
    generator_config: Option<PathBuf>,
    /// Discriminator config JSON. Defaults apply when omitted.
    #[arg(long)]
    discriminator_config: Option<PathBuf>,
}

impl NetworkArgs {
    fn load(&self) -> Result<(GeneratorConfig, DiscriminatorConfig)> {
        let generator = match &self.generator_config {
            Some(path) => load_config(path, GeneratorConfig::new)?,
            None => GeneratorConfig::new(),
        };
        let discriminator = match &self.discriminator_config {
            Some(path) => load_config(path, DiscriminatorConfig::new)?,
            None => DiscriminatorConfig::new(),
        };
        Ok((generator, discriminator))
    }
}

#[derive(Serialize)]
struct TopologyReport<'a> {
    pipeline: &'a Pipeline,
    shapes: Vec<TensorShape>,
}

fn describe(generator: &Pipeline, discriminator: &Pipeline, json: bool) -> Result<()> {
    if json {
        let generator = TopologyReport {
            pipeline: generator,
            shapes: generator.shapes()?,
        };
        let discriminator = TopologyReport {
            pipeline: discriminator,
            shapes: discriminator.shapes()?,
        };
        let report = serde_json::json!({
            "generator": generator,
            "discriminator": discriminator,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Generator\n{generator}\n");
        println!("Discriminator\n{discriminator}");
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging(LevelFilter::Info);
    let cli = Cli::parse();
    let device: Device<MyBackend> = Default::default();

    match cli.command {
        Command::Describe { networks, json } => {
            let (generator, discriminator) = networks.load()?;
            let generator = generator_topology(&generator).context("invalid generator config")?;
            let discriminator =
                discriminator_topology(&discriminator).context("invalid discriminator config")?;
            describe(&generator, &discriminator, json)?;
        }
        Command::Export {
            dir,
            networks,
            generation_config,
        } => {
            let (generator, discriminator) = networks.load()?;
            let generation = match &generation_config {
                Some(path) => load_config(path, GenerationConfig::new)?,
                None => GenerationConfig::new(),
            };
            let model_config = ModelConfig::new(generator, discriminator);

            ExportDir::new(&dir)
                .write::<MyBackend>(&model_config, &generation, &device)
                .with_context(|| format!("failed to export into {}", dir.display()))?;
        }
        Command::Generate { dir, config } => {
            let export = ExportDir::new(&dir);
            let generation = match &config {
                Some(path) => load_config(path, GenerationConfig::new)?,
                None => export.generation_config()?,
            };
            let generator = export
                .load_generator::<MyBackend>(&device)
                .context("failed to load generator")?;

            let report = GenerationProcess::new(export.results_dir(), generation)
                .run(&generator, &device)
                .context("generation failed")?;
            info!(
                "Wrote {} files for {} images (seed {}) in {:.2?}",
                report.files.len(),
                report.image_count,
                report.seed,
                report.elapsed
            );
        }
    }

    Ok(())
}
