//! On-disk layout shared by `export` and `generate`:
//!
//! ```text
//! <root>/generator_config.json
//! <root>/discriminator_config.json
//! <root>/generation_config.json
//! <root>/model_saves/generator.mpk
//! <root>/model_saves/discriminator.mpk
//! <root>/Generation-Results/
//! ```

use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
};
use log::{info, warn};
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    config::{DiscriminatorConfig, GeneratorConfig},
    error::GenerationError,
    generation::GenerationConfig,
    model::{generator::Generator, Model, ModelConfig},
};

pub const GENERATOR_CONFIG_NAME: &str = "generator_config.json";
pub const DISCRIMINATOR_CONFIG_NAME: &str = "discriminator_config.json";
pub const GENERATION_CONFIG_NAME: &str = "generation_config.json";
pub const MODEL_SAVES_NAME: &str = "model_saves";
pub const RESULTS_NAME: &str = "Generation-Results";

type Recorder = NamedMpkFileRecorder<FullPrecisionSettings>;

#[derive(Clone, Debug)]
pub struct ExportDir {
    root: PathBuf,
}

impl ExportDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn generator_config_path(&self) -> PathBuf {
        self.root.join(GENERATOR_CONFIG_NAME)
    }

    pub fn discriminator_config_path(&self) -> PathBuf {
        self.root.join(DISCRIMINATOR_CONFIG_NAME)
    }

    pub fn generation_config_path(&self) -> PathBuf {
        self.root.join(GENERATION_CONFIG_NAME)
    }

    pub fn results_dir(&self) -> PathBuf {
        self.root.join(RESULTS_NAME)
    }

    /// Record path without extension; the recorder appends `.mpk`.
    pub fn generator_record_path(&self) -> PathBuf {
        self.root.join(MODEL_SAVES_NAME).join("generator")
    }

    pub fn discriminator_record_path(&self) -> PathBuf {
        self.root.join(MODEL_SAVES_NAME).join("discriminator")
    }

    /// Writes every config plus freshly initialized weights for both networks.
    pub fn write<B: Backend>(
        &self,
        model_config: &ModelConfig,
        generation_config: &GenerationConfig,
        device: &B::Device,
    ) -> Result<Model<B>, GenerationError> {
        let model = model_config.init::<B>(device)?;

        fs::create_dir_all(self.root.join(MODEL_SAVES_NAME))?;
        model_config
            .generator_config
            .save(self.generator_config_path())?;
        model_config
            .discriminator_config
            .save(self.discriminator_config_path())?;
        generation_config.save(self.generation_config_path())?;

        let recorder = Recorder::new();
        let generator = save_record(model.generator, self.generator_record_path(), &recorder)?;
        let discriminator = save_record(
            model.discriminator,
            self.discriminator_record_path(),
            &recorder,
        )?;
        info!("Exported model to {}", self.root.display());

        Ok(Model {
            generator,
            discriminator,
        })
    }

    pub fn generator_config(&self) -> Result<GeneratorConfig, GenerationError> {
        load_or_default(&self.generator_config_path(), GeneratorConfig::new)
    }

    pub fn discriminator_config(&self) -> Result<DiscriminatorConfig, GenerationError> {
        load_or_default(&self.discriminator_config_path(), DiscriminatorConfig::new)
    }

    pub fn generation_config(&self) -> Result<GenerationConfig, GenerationError> {
        load_or_default(&self.generation_config_path(), GenerationConfig::new)
    }

    /// Builds the generator from the exported config and loads its weights
    /// when a record exists.
    pub fn load_generator<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<Generator<B>, GenerationError> {
        let generator = self.generator_config()?.init::<B>(device)?;

        let path = self.generator_record_path();
        if !path.with_extension("mpk").exists() {
            warn!(
                "No generator record at {}, using freshly initialized weights",
                path.display()
            );
            return Ok(generator);
        }

        let generator = generator
            .load_file(path.clone(), &Recorder::new(), device)
            .map_err(|err| GenerationError::Record {
                path: path.clone(),
                message: format!("{err:?}"),
            })?;
        info!("Loaded generator weights from {}", path.display());
        Ok(generator)
    }
}

/// Loads `path` as JSON config, or falls back to `default` when the file is absent.
pub fn load_or_default<C: Config>(
    path: &Path,
    default: impl FnOnce() -> C,
) -> Result<C, GenerationError> {
    if !path.exists() {
        warn!("{} not found, using defaults", path.display());
        return Ok(default());
    }
    load_config(path, default)
}

/// Loads `path` as JSON config. Keys the file leaves out keep the value they
/// have in `default`, nested objects included.
pub fn load_config<C: Config>(
    path: &Path,
    default: impl FnOnce() -> C,
) -> Result<C, GenerationError> {
    let config_error = |message: String| GenerationError::Config {
        path: path.to_path_buf(),
        message,
    };

    let text = fs::read_to_string(path).map_err(|err| config_error(err.to_string()))?;
    let overrides: Value =
        serde_json::from_str(&text).map_err(|err| config_error(err.to_string()))?;
    if !overrides.is_object() {
        return Err(config_error("expected a JSON object".to_string()));
    }

    let mut merged =
        serde_json::to_value(default()).map_err(|err| config_error(err.to_string()))?;
    merge_json(&mut merged, overrides);
    serde_json::from_value(merged).map_err(|err| config_error(err.to_string()))
}

fn merge_json(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, value) => *base = value,
    }
}

fn save_record<B: Backend, M: Module<B>>(
    module: M,
    path: PathBuf,
    recorder: &Recorder,
) -> Result<M, GenerationError> {
    module
        .clone()
        .save_file(path.clone(), recorder)
        .map_err(|err| GenerationError::Record {
            path,
            message: format!("{err:?}"),
        })?;
    Ok(module)
}
