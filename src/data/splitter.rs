// ============================================================
// Layer 4: Train/Validation Splitter
// ============================================================
// Randomly partitions samples into two disjoint sets:
//   - Training set:   used to update model weights
//   - Validation set: used to measure loss on unseen pairs
//
// Sizes are exact, not expected values:
//   train = floor(ratio * N)
//   val   = N - train
//
// e.g. N = 436, ratio = 0.8 → 348 train, 88 validation
//
// Implementation: Fisher-Yates shuffle of the whole Vec, then
// cut it at `train` with split_off. Every example ends up in
// exactly one half and none is copied or dropped.
//
// Reference: Rust Book §8 (Vectors)
//            rand crate documentation

use rand::{seq::SliceRandom, Rng};

use crate::domain::error::DatasetError;

/// Default fraction of the corpus used for training.
pub const DEFAULT_SPLIT_RATIO: f64 = 0.8;

/// Number of training items for a corpus of `total` items.
pub fn train_size(total: usize, ratio: f64) -> usize {
    ((total as f64) * ratio).floor() as usize
}

/// Randomly split `samples` into (train, validation).
///
/// # Errors
/// `InvalidConfiguration` when the corpus is empty, when `ratio`
/// is not strictly between 0 and 1, or when the ratio is so small
/// that the training half would be empty.
pub fn split_train_val<T, R: Rng + ?Sized>(
    mut samples: Vec<T>,
    ratio:       f64,
    rng:         &mut R,
) -> Result<(Vec<T>, Vec<T>), DatasetError> {
    let total = samples.len();

    if total == 0 {
        return Err(DatasetError::invalid("cannot split an empty corpus"));
    }
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(DatasetError::invalid(format!(
            "split ratio must be in (0, 1), got {ratio}"
        )));
    }

    let split_at = train_size(total, ratio);
    if split_at == 0 {
        return Err(DatasetError::invalid(format!(
            "split ratio {ratio} leaves no training examples out of {total}"
        )));
    }

    samples.shuffle(rng);
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    Ok((samples, val))
}
