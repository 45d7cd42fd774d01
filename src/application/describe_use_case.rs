// ============================================================
// Layer 2: Describe Use Case
// ============================================================
// Loads the artifacts written by `train` and turns one tag string
// into a description:
//
//   checkpoints/tokenizer.json          → TagTokenizer
//   checkpoints/train_config.json  ┐
//   checkpoints/*.mpk.gz           ┴──→ Inferencer
//
// The input is passed to the model exactly as typed; tag order
// and spacing are left alone.

use anyhow::Result;
use std::fmt;

use crate::domain::traits::DescriptionGenerator;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::inferencer::Inferencer;

/// Input tags and the generated sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeOutput {
    pub input:       String,
    pub description: String,
}

impl fmt::Display for DescribeOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Input: {}", self.input)?;
        write!(f, "Generated description: {}", self.description)
    }
}

pub struct DescribeUseCase<G: DescriptionGenerator> {
    generator: G,
}

impl DescribeUseCase<Inferencer> {
    pub fn from_checkpoint(checkpoint_dir: impl Into<String>) -> Result<Self> {
        let checkpoint_dir = checkpoint_dir.into();
        let tokenizer  = TokenizerStore::new(checkpoint_dir.as_str()).load()?;
        let ckpt       = CheckpointManager::new(checkpoint_dir);
        let inferencer = Inferencer::from_checkpoint(&ckpt, tokenizer)?;
        Ok(Self::new(inferencer))
    }
}

impl<G: DescriptionGenerator> DescribeUseCase<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn describe(&self, input_tags: &str) -> Result<DescribeOutput> {
        let description = self.generator.describe(input_tags)?;
        Ok(DescribeOutput {
            input: input_tags.to_string(),
            description,
        })
    }
}
