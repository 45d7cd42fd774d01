// ============================================================
// Layer 5: Training Loop
// ============================================================
// Epoch loop over any Seq2SeqModel:
//
//   build loaders once (train shuffled, val in stored order)
//   for each epoch:
//     train pass  → shuffled batches, one train_step per batch
//     val pass    → stored-order batches, evaluate_step only
//     report      → stdout line + metrics.csv row
//
// Batches are processed strictly one after another; parameters
// change in place between them. Weights are not written here,
// the caller saves them once the last epoch is done.
//
// Reference: Burn Book §5 (Custom Training Loop)

use anyhow::{Context, Result};
use rand::Rng;

use crate::data::{
    batches::{BatchOrder, BatchPlan},
    dataset::TagsDataset,
};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::seq2seq::Seq2SeqModel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSettings {
    pub epochs:     usize,
    pub batch_size: usize,
}

/// Train `model` for `settings.epochs` epochs and return the
/// per-epoch average losses.
pub fn run_training<M, R>(
    model:    &mut M,
    train:    &TagsDataset,
    val:      &TagsDataset,
    settings: LoopSettings,
    metrics:  Option<&MetricsLogger>,
    rng:      &mut R,
) -> Result<Vec<EpochMetrics>>
where
    M: Seq2SeqModel,
    R: Rng + ?Sized,
{
    let train_plan = BatchPlan::new(settings.batch_size, BatchOrder::Shuffled)?;
    let val_plan   = BatchPlan::new(settings.batch_size, BatchOrder::Stored)?;

    let train_loader = train_plan.loader(train.clone(), &mut *rng);
    let val_loader   = val_plan.loader(val.clone(), &mut *rng);

    tracing::info!(
        "Training on {} examples ({} batches/epoch), validating on {}",
        train.samples().len(),
        train_plan.num_batches(train.samples().len()),
        val.samples().len(),
    );
    if let Some(logger) = metrics {
        tracing::info!("Logging epoch losses to '{}'", logger.csv_path().display());
    }

    let mut history  = Vec::with_capacity(settings.epochs);
    let mut best_val = f64::INFINITY;

    for epoch in 1..=settings.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for (step, batch) in train_loader.iter().enumerate() {
            let loss = model
                .train_step(batch)
                .with_context(|| format!("Training step {step} of epoch {epoch} failed"))?;
            tracing::debug!("epoch {epoch} step {step}: loss={loss:.4}");

            train_loss_sum += loss;
            train_batches  += 1;
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;

        for batch in val_loader.iter() {
            val_loss_sum += model.evaluate_step(batch)?;
            val_batches  += 1;
        }

        let avg_train_loss = if train_batches > 0 { train_loss_sum / train_batches as f64 } else { f64::NAN };
        let avg_val_loss   = if val_batches   > 0 { val_loss_sum   / val_batches   as f64 } else { f64::NAN };

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4}",
            epoch, settings.epochs, avg_train_loss, avg_val_loss,
        );

        let row = EpochMetrics::new(epoch, avg_train_loss, avg_val_loss);
        if row.is_improvement(best_val) {
            best_val = row.val_loss;
            tracing::debug!("New best val_loss at epoch {epoch}");
        }
        if let Some(logger) = metrics {
            logger.log(&row)?;
        }
        history.push(row);
    }

    tracing::info!("Training complete! Best val_loss={:.4}", best_val);
    Ok(history)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    use crate::data::dataset::DescriptionSample;
    use crate::domain::{encoding::EncodedText, example::AugmentedExample};

    /// Returns the batch size as its loss and counts calls.
    #[derive(Default)]
    struct StubModel {
        train_calls: usize,
        seen:        Vec<String>,
    }

    impl Seq2SeqModel for StubModel {
        fn tokenize(&self, _text: &str, max_len: usize) -> Result<EncodedText> {
            Ok(EncodedText::fixed_length(Vec::new(), max_len, 0))
        }

        fn train_step(&mut self, batch: Vec<DescriptionSample>) -> Result<f64> {
            self.train_calls += 1;
            self.seen.extend(batch.iter().map(|s| s.source.description.clone()));
            Ok(batch.len() as f64)
        }

        fn evaluate_step(&self, batch: Vec<DescriptionSample>) -> Result<f64> {
            Ok(batch.len() as f64 * 10.0)
        }

        fn generate(&self, _: &EncodedText, _: usize, _: usize) -> Result<String> {
            Ok(String::new())
        }
    }

    fn dataset(n: usize) -> TagsDataset {
        TagsDataset::new(
            (0..n)
                .map(|i| DescriptionSample {
                    input:  EncodedText::fixed_length(vec![4], 2, 0),
                    labels: EncodedText::fixed_length(vec![5], 2, 0),
                    source: AugmentedExample { tags: format!("t{i}"), description: format!("d{i}") },
                })
                .collect(),
        )
    }

    #[test]
    fn test_train_step_called_ceil_n_over_b_per_epoch() {
        let mut model = StubModel::default();
        let mut rng   = StdRng::seed_from_u64(1);
        let settings  = LoopSettings { epochs: 3, batch_size: 4 };

        run_training(&mut model, &dataset(10), &dataset(3), settings, None, &mut rng).unwrap();

        // ceil(10 / 4) = 3 batches × 3 epochs
        assert_eq!(model.train_calls, 9);
        // every training example seen once per epoch
        assert_eq!(model.seen.len(), 30);
    }

    #[test]
    fn test_same_seed_replays_batch_order() {
        let settings = LoopSettings { epochs: 2, batch_size: 3 };
        let mut seen = Vec::new();
        for _ in 0..2 {
            let mut model = StubModel::default();
            let mut rng   = StdRng::seed_from_u64(11);
            run_training(&mut model, &dataset(10), &dataset(3), settings, None, &mut rng).unwrap();
            seen.push(model.seen);
        }
        assert_eq!(seen[0], seen[1]);
    }

    #[test]
    fn test_losses_are_averaged_over_batches() {
        let mut model = StubModel::default();
        let mut rng   = StdRng::seed_from_u64(2);
        let settings  = LoopSettings { epochs: 1, batch_size: 4 };

        let history = run_training(&mut model, &dataset(10), &dataset(5), settings, None, &mut rng)
            .unwrap();

        // train batches 4, 4, 2 → mean 10/3; val batches 40, 10 → mean 25
        assert_eq!(history.len(), 1);
        assert!((history[0].train_loss - 10.0 / 3.0).abs() < 1e-9);
        assert!((history[0].val_loss - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_metrics_rows_are_written() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path().to_string_lossy()).unwrap();
        let mut model = StubModel::default();
        let mut rng   = StdRng::seed_from_u64(3);
        let settings  = LoopSettings { epochs: 2, batch_size: 8 };

        run_training(&mut model, &dataset(4), &dataset(2), settings, Some(&logger), &mut rng)
            .unwrap();

        let csv = std::fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let mut model = StubModel::default();
        let mut rng   = StdRng::seed_from_u64(4);
        let settings  = LoopSettings { epochs: 1, batch_size: 0 };

        assert!(run_training(&mut model, &dataset(2), &dataset(1), settings, None, &mut rng).is_err());
        assert_eq!(model.train_calls, 0);
    }
}
