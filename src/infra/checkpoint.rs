// ============================================================
// Layer 6: Checkpoint Manager
// ============================================================
// Saves and restores the trained model using Burn's
// CompactRecorder (MessagePack + gzip).
//
// Layout of the checkpoint directory after `train`:
//   checkpoints/
//     tags_to_description_model.mpk.gz  ← model weights
//     train_config.json                 ← hyperparameters
//     tokenizer.json                    ← written by TokenizerStore
//     metrics.csv                       ← written by MetricsLogger
//
// Weights are written once, after the last epoch. The config is
// needed at inference time to rebuild the same architecture
// before the weights are loaded into it.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::TagsToTextModel;

const MODEL_FILE:  &str = "tags_to_description_model";
const CONFIG_FILE: &str = "train_config.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))
    }

    /// Write model weights to `{dir}/tags_to_description_model.mpk.gz`.
    /// The recorder appends the extension.
    pub fn save_model<B: Backend>(&self, model: &TagsToTextModel<B>) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(MODEL_FILE);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save model to '{}'", path.display())
            })?;

        tracing::info!("Saved model weights to '{}'", path.display());
        Ok(())
    }

    /// Load weights into `model`, which must have been built with
    /// the same architecture as the saved one.
    pub fn load_model<B: Backend>(
        &self,
        model:  TagsToTextModel<B>,
        device: &B::Device,
    ) -> Result<TagsToTextModel<B>> {
        let path = self.dir.join(MODEL_FILE);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load model '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| {
                format!("Cannot write config to '{}'", path.display())
            })?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'describe'.",
                    path.display()
                )
            })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config '{}'", path.display()))
    }
}
