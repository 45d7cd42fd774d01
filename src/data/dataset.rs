use anyhow::{Context, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::{encoding::EncodedText, example::AugmentedExample};

/// One tokenised (tags → description) training pair.
/// Input is padded to max_input_len, labels to max_target_len.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptionSample {
    pub input:  EncodedText,
    pub labels: EncodedText,
    /// The text the sample was encoded from
    pub source: AugmentedExample,
}

/// Tokenise every augmented example with the supplied encoder.
///
/// `tokenize(text, max_len)` must return an encoding of exactly
/// `max_len` positions.
pub fn encode_examples<F>(
    examples:       &[AugmentedExample],
    max_input_len:  usize,
    max_target_len: usize,
    mut tokenize:   F,
) -> Result<Vec<DescriptionSample>>
where
    F: FnMut(&str, usize) -> Result<EncodedText>,
{
    examples
        .iter()
        .enumerate()
        .map(|(i, ex)| {
            let input = tokenize(ex.input_text(), max_input_len)
                .with_context(|| format!("Cannot tokenise tags of example #{i}"))?;
            let labels = tokenize(ex.target_text(), max_target_len)
                .with_context(|| format!("Cannot tokenise description of example #{i}"))?;
            Ok(DescriptionSample { input, labels, source: ex.clone() })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct TagsDataset {
    samples: Vec<DescriptionSample>,
}

impl TagsDataset {
    pub fn new(samples: Vec<DescriptionSample>) -> Self { Self { samples } }

    pub fn samples(&self) -> &[DescriptionSample] { &self.samples }
}

impl Dataset<DescriptionSample> for TagsDataset {
    fn get(&self, index: usize) -> Option<DescriptionSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
