// ============================================================
// Layer 4: Batch Iteration
// ============================================================
// Groups the samples of one subset into mini-batches with Burn's
// DataLoader.
//
// A `BatchPlan` describes HOW to batch (size, order). `.loader()`
// builds a DataLoader over a dataset; every `.iter()` on it is one
// full pass. The training loop builds its loaders once and iterates
// them once per epoch.
//
//   N = 10, batch_size = 4  →  [4, 4, 2]
//   N = 8,  batch_size = 4  →  [4, 4]
//
// Order:
//   Shuffled → indices re-permuted at the start of every pass
//              (used for training). The loader's seed is drawn
//              from the caller's rng, so a seeded run repeats.
//   Stored   → dataset order, identical on every pass
//              (used for validation)
//
// Tensors are not built here. `PassThrough` hands the raw samples
// on and the model stacks them on its own device.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

use std::{fmt::Debug, sync::Arc};

use burn::data::{
    dataloader::{batcher::Batcher, DataLoader, DataLoaderBuilder},
    dataset::Dataset,
};
use rand::Rng;

use crate::domain::error::DatasetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOrder {
    Stored,
    Shuffled,
}

/// Batcher that leaves the items as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl<I: Send + Sync> Batcher<I, Vec<I>> for PassThrough {
    fn batch(&self, items: Vec<I>) -> Vec<I> {
        items
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BatchPlan {
    batch_size: usize,
    order:      BatchOrder,
}

impl BatchPlan {
    /// # Errors
    /// `InvalidConfiguration` if `batch_size` is zero.
    pub fn new(batch_size: usize, order: BatchOrder) -> Result<Self, DatasetError> {
        if batch_size == 0 {
            return Err(DatasetError::invalid("batch_size must be greater than 0"));
        }
        Ok(Self { batch_size, order })
    }

    /// ceil(len / batch_size)
    pub fn num_batches(&self, len: usize) -> usize {
        len.div_ceil(self.batch_size)
    }

    /// Build a loader over `dataset` that yields `Vec<I>` batches.
    ///
    /// `rng` is only drawn from when the order is `Shuffled`.
    pub fn loader<D, I, R>(&self, dataset: D, rng: &mut R) -> Arc<dyn DataLoader<Vec<I>>>
    where
        D: Dataset<I> + 'static,
        I: Send + Sync + Clone + Debug + 'static,
        R: Rng + ?Sized,
    {
        let builder = DataLoaderBuilder::new(PassThrough).batch_size(self.batch_size);

        match self.order {
            BatchOrder::Shuffled => builder.shuffle(rng.gen()).build(dataset),
            BatchOrder::Stored   => builder.build(dataset),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::data::dataset::InMemDataset;
    use rand::{rngs::StdRng, SeedableRng};

    fn numbers(n: usize) -> InMemDataset<usize> {
        InMemDataset::new((0..n).collect())
    }

    fn one_pass(loader: &Arc<dyn DataLoader<Vec<usize>>>) -> Vec<Vec<usize>> {
        loader.iter().collect()
    }

    #[test]
    fn test_batch_sizes_with_remainder() {
        let plan   = BatchPlan::new(4, BatchOrder::Stored).unwrap();
        let loader = plan.loader(numbers(10), &mut StdRng::seed_from_u64(0));
        let sizes: Vec<usize> = one_pass(&loader).iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn test_batch_sizes_exact_multiple() {
        let plan   = BatchPlan::new(4, BatchOrder::Stored).unwrap();
        let loader = plan.loader(numbers(8), &mut StdRng::seed_from_u64(0));
        let sizes: Vec<usize> = one_pass(&loader).iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4]);
    }

    #[test]
    fn test_batch_count_and_total() {
        let mut rng = StdRng::seed_from_u64(9);
        for n in [1usize, 5, 12, 29] {
            for bs in [1usize, 3, 4, 8] {
                let plan    = BatchPlan::new(bs, BatchOrder::Shuffled).unwrap();
                let batches = one_pass(&plan.loader(numbers(n), &mut rng));
                assert_eq!(batches.len(), n.div_ceil(bs));
                assert_eq!(batches.len(), plan.num_batches(n));
                assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), n);
            }
        }
    }

    #[test]
    fn test_every_item_once_per_pass() {
        let plan   = BatchPlan::new(3, BatchOrder::Shuffled).unwrap();
        let loader = plan.loader(numbers(17), &mut StdRng::seed_from_u64(1));
        for _ in 0..3 {
            let mut seen: Vec<usize> = one_pass(&loader).into_iter().flatten().collect();
            seen.sort();
            assert_eq!(seen, (0..17).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_stored_order_is_stable() {
        let plan   = BatchPlan::new(3, BatchOrder::Stored).unwrap();
        let loader = plan.loader(numbers(7), &mut StdRng::seed_from_u64(4));
        let first  = one_pass(&loader);
        let second = one_pass(&loader);
        assert_eq!(first, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_stored_order_leaves_rng_untouched() {
        let plan      = BatchPlan::new(3, BatchOrder::Stored).unwrap();
        let mut used  = StdRng::seed_from_u64(6);
        let mut fresh = StdRng::seed_from_u64(6);
        plan.loader(numbers(7), &mut used);
        assert_eq!(used.gen::<u64>(), fresh.gen::<u64>());
    }

    #[test]
    fn test_same_seed_gives_same_shuffle() {
        let plan  = BatchPlan::new(5, BatchOrder::Shuffled).unwrap();
        let first = one_pass(&plan.loader(numbers(40), &mut StdRng::seed_from_u64(8)));
        let again = one_pass(&plan.loader(numbers(40), &mut StdRng::seed_from_u64(8)));
        assert_eq!(first, again);
        assert_ne!(first.concat(), (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_dataset_yields_nothing() {
        let plan   = BatchPlan::new(4, BatchOrder::Shuffled).unwrap();
        let loader = plan.loader(numbers(0), &mut StdRng::seed_from_u64(0));
        assert!(one_pass(&loader).is_empty());
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        assert!(matches!(
            BatchPlan::new(0, BatchOrder::Stored),
            Err(DatasetError::InvalidConfiguration(_))
        ));
    }
}
