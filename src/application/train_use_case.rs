// ============================================================
// Layer 2: TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Seed the random generator
//   Step 2: Load the corpus             (Layer 4 - data)
//   Step 3: Shuffle tag order, once     (Layer 4 - data)
//   Step 4: Split train/validation      (Layer 4 - data)
//   Step 5: Build tokenizer             (Layer 6 - infra)
//   Step 6: Build model + AdamW         (Layer 5 - ml)
//   Step 7: Tokenise both halves        (Layer 4 - data)
//   Step 8: Run training loop           (Layer 5 - ml)
//   Step 9: Save weights, config and tokenizer (Layer 6 - infra)
//   Step 10: Smoke-test one generation
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::Result;
use burn::optim::AdamWConfig;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::application::describe_use_case::DescribeOutput;
use crate::data::{
    augment::augment_corpus,
    dataset::{encode_examples, TagsDataset},
    loader::JsonCorpusLoader,
    splitter::{split_train_val, DEFAULT_SPLIT_RATIO},
};
use crate::domain::{example::AugmentedExample, traits::CorpusSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    decoding::DEFAULT_BEAM_WIDTH,
    model::{TagsToTextConfig, TagsToTextModel},
    seq2seq::{BurnSeq2Seq, Seq2SeqModel},
    trainer::{run_training, LoopSettings},
};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved next to the weights so `describe` can rebuild the same model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// None = the corpus bundled with the binary
    pub corpus_path:    Option<String>,
    pub checkpoint_dir: String,
    pub max_input_len:  usize,
    pub max_output_len: usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub weight_decay:   f32,
    pub split_ratio:    f64,
    pub beam_size:      usize,
    /// None = seed from OS entropy
    pub seed:           Option<u64>,
    pub d_model:        usize,
    pub num_heads:      usize,
    pub num_layers:     usize,
    pub d_ff:           usize,
    pub dropout:        f64,
    /// Upper bound; the built tokenizer may be smaller
    pub vocab_size:     usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus_path:    None,
            checkpoint_dir: "checkpoints".to_string(),
            max_input_len:  128,
            max_output_len: 64,
            batch_size:     32,
            epochs:         25,
            lr:             8e-5,
            weight_decay:   0.01,
            split_ratio:    DEFAULT_SPLIT_RATIO,
            beam_size:      DEFAULT_BEAM_WIDTH,
            seed:           None,
            d_model:        256,
            num_heads:      8,
            num_layers:     3,
            d_ff:           1024,
            dropout:        0.1,
            vocab_size:     8000,
        }
    }
}

/// What a finished run reports back to the CLI.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub history: Vec<EpochMetrics>,
    /// One generation on a held-out example
    pub sample:  Option<DescribeOutput>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;

        // ── Step 1: Random generator ──────────────────────────────────────────
        // Every random choice below (tag order, split, batch order)
        // draws from this one generator.
        let mut rng = match cfg.seed {
            Some(seed) => {
                tracing::info!("Using seed {seed}");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        // ── Step 2: Load the corpus ───────────────────────────────────────────
        let loader = match &cfg.corpus_path {
            Some(path) => JsonCorpusLoader::from_path(path),
            None       => JsonCorpusLoader::bundled(),
        };
        let corpus = loader.load_all()?;

        // ── Step 3: Tag-order augmentation ────────────────────────────────────
        let augmented = augment_corpus(&corpus, &mut rng)?;

        // ── Step 4: Train / validation split ──────────────────────────────────
        let (train_examples, val_examples) =
            split_train_val(augmented, cfg.split_ratio, &mut rng)?;
        tracing::info!(
            "Split: {} train, {} validation",
            train_examples.len(),
            val_examples.len()
        );

        // ── Step 5: Tokenizer from the training half only ─────────────────────
        // Validation words the model never trains on stay [UNK], so
        // val_loss measures generalisation to unseen pairs.
        let texts = vocabulary_texts(&train_examples);
        let tok_store = TokenizerStore::new(&cfg.checkpoint_dir);
        let tokenizer = tok_store.build(&texts, cfg.vocab_size)?;

        // ── Step 6: Model + AdamW ─────────────────────────────────────────────
        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);

        let model_cfg = TagsToTextConfig::from_train_config(cfg, tokenizer.vocab_size());
        let model: TagsToTextModel<MyBackend> = model_cfg.init(&device);
        let optim = AdamWConfig::new()
            .with_weight_decay(cfg.weight_decay)
            .init();
        tracing::info!(
            "Model ready: {} layers, d_model={}, vocab={}",
            cfg.num_layers, cfg.d_model, model_cfg.vocab_size
        );

        let mut seq2seq = BurnSeq2Seq::new(
            model, optim, cfg.lr, tokenizer.clone(), cfg.max_output_len, device,
        );

        // ── Step 7: Tokenise ──────────────────────────────────────────────────
        let train_dataset = self.encode(&seq2seq, &train_examples)?;
        let val_dataset   = self.encode(&seq2seq, &val_examples)?;

        // ── Step 8: Training loop ─────────────────────────────────────────────
        let metrics  = MetricsLogger::new(&cfg.checkpoint_dir)?;
        let settings = LoopSettings { epochs: cfg.epochs, batch_size: cfg.batch_size };
        let history  = run_training(
            &mut seq2seq, &train_dataset, &val_dataset, settings, Some(&metrics), &mut rng,
        )?;

        // ── Step 9: Persist everything `describe` needs ───────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_model(seq2seq.model())?;
        ckpt_manager.save_config(cfg)?;
        tok_store.save(&tokenizer)?;
        tracing::info!("Artifacts written to '{}'", ckpt_manager.dir().display());

        // ── Step 10: Smoke test on a held-out example ─────────────────────────
        let sample = match val_dataset.samples().first() {
            Some(held_out) => {
                let description = seq2seq.generate(&held_out.input, cfg.beam_size, cfg.max_output_len)?;
                Some(DescribeOutput {
                    input: held_out.source.tags.clone(),
                    description,
                })
            }
            None => None,
        };

        Ok(TrainSummary { history, sample })
    }

    fn encode<M: Seq2SeqModel>(&self, model: &M, examples: &[AugmentedExample]) -> Result<TagsDataset> {
        let samples = encode_examples(
            examples,
            self.config.max_input_len,
            self.config.max_output_len,
            |text, max_len| model.tokenize(text, max_len),
        )?;
        Ok(TagsDataset::new(samples))
    }
}

/// Tags and descriptions the tokenizer vocabulary is counted from.
fn vocabulary_texts(train_examples: &[AugmentedExample]) -> Vec<&str> {
    train_examples
        .iter()
        .flat_map(|ex| [ex.input_text(), ex.target_text()])
        .collect()
}
