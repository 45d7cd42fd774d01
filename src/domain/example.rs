// ============================================================
// Layer 3: Example Domain Types
// ============================================================
// A labelled training pair: a comma-separated list of tags and
// the sentence that describes them.
//
//   tags:        "red roses, bouquet, vase, table"
//   description: "a bouquet of red roses in a vase on a table"
//
// The tags are a bag semantically, but the model reads them as
// one string, so their order matters to the encoder. That is
// what the augmentation step exploits.
//
// Reference: Rust Book §5 (Structs), §8 (Strings)

use serde::{Deserialize, Serialize};

use crate::domain::error::DatasetError;

/// Character the raw tag string is split on.
pub const TAG_DELIMITER: char = ',';

/// Separator used when tags are joined back together.
pub const TAG_SEPARATOR: &str = ", ";

/// One (tags, description) pair exactly as it appears in the corpus.
///
/// A missing field loads as an empty string, so it is reported by
/// `validate` with the entry's index instead of as a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    /// Comma-separated tags, e.g. "golden retriever, park, frisbee"
    #[serde(default)]
    pub tags: String,

    /// Ground-truth sentence. Never modified after loading.
    #[serde(default)]
    pub description: String,
}

impl Example {
    #[cfg(test)]
    pub fn new(tags: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            tags:        tags.into(),
            description: description.into(),
        }
    }

    /// Split the tag string on the delimiter.
    ///
    /// Only the delimiter is removed: "a, b" gives ["a", " b"].
    /// The leading space stays part of the second tag.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags.split(TAG_DELIMITER).collect()
    }

    /// Check the example is usable for training.
    ///
    /// `index` is the position in the corpus and is only used to
    /// make the error message point at the offending entry.
    pub fn validate(&self, index: usize) -> Result<(), DatasetError> {
        if self.tags.trim().is_empty() {
            return Err(DatasetError::malformed(index, "tags are empty"));
        }
        if self.description.trim().is_empty() {
            return Err(DatasetError::malformed(index, "description is empty"));
        }
        if let Some(pos) = self.tag_list().iter().position(|t| t.trim().is_empty()) {
            return Err(DatasetError::malformed(
                index,
                format!("tag #{} is empty after splitting on '{}'", pos + 1, TAG_DELIMITER),
            ));
        }
        Ok(())
    }
}

/// An example whose tags have been re-ordered by the augmentation step.
///
/// Same tags (as a multiset), same description, different order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentedExample {
    /// Tags joined with `TAG_SEPARATOR` in their shuffled order
    pub tags: String,

    pub description: String,
}

impl AugmentedExample {
    /// The string the model is conditioned on.
    pub fn input_text(&self) -> &str {
        &self.tags
    }

    /// The string the model is trained to produce.
    pub fn target_text(&self) -> &str {
        &self.description
    }
}
