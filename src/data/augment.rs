// ============================================================
// Layer 4: Tag Shuffle Augmentation
// ============================================================
// Re-orders the tags of every example once, before the dataset
// is built:
//
//   "red roses, bouquet, vase"  →  "vase, red roses,  bouquet"
//
// The model sees the tags as one string, so a fixed order would
// let it latch onto position instead of content. Shuffling gives
// each example an arbitrary order while keeping the same tags.
//
// Only the delimiter is removed when splitting, so whitespace
// that followed a comma stays attached to its tag and shows up
// after the ", " separator when rejoined.
//
// The shuffle is applied once per corpus load, not once per
// epoch: every epoch trains on the same shuffled strings.
//
// Uses Fisher-Yates via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use rand::{seq::SliceRandom, Rng};

use crate::domain::{
    error::DatasetError,
    example::{AugmentedExample, Example, TAG_SEPARATOR},
};

/// Shuffle the tags of a single example.
///
/// A single tag has only one permutation, so it comes back as-is.
/// Duplicate tags are treated as separate items and both survive.
pub fn shuffle_tags<R: Rng + ?Sized>(example: &Example, rng: &mut R) -> AugmentedExample {
    let mut tags = example.tag_list();
    tags.shuffle(rng);

    AugmentedExample {
        tags:        tags.join(TAG_SEPARATOR),
        description: example.description.clone(),
    }
}

/// Validate and shuffle every example in the corpus.
///
/// Fails on the first malformed entry rather than letting a
/// degenerate sample reach the training loop.
pub fn augment_corpus<R: Rng + ?Sized>(
    corpus: &[Example],
    rng:    &mut R,
) -> Result<Vec<AugmentedExample>, DatasetError> {
    if corpus.is_empty() {
        return Err(DatasetError::invalid("corpus is empty"));
    }

    corpus
        .iter()
        .enumerate()
        .map(|(i, ex)| {
            ex.validate(i)?;
            Ok(shuffle_tags(ex, rng))
        })
        .collect()
}
