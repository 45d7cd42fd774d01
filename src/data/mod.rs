// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// Everything between the raw corpus and tensor batches:
//
//   corpus.json
//       │
//       ▼
//   JsonCorpusLoader  → reads (tags, description) pairs
//       │
//       ▼
//   augment           → shuffles each example's tags once
//       │
//       ▼
//   splitter          → random train / validation partition
//       │
//       ▼
//   TagsDataset       → tokenised samples, Burn's Dataset trait
//       │
//       ▼
//   BatchPlan         → one lazy pass of mini-batches per epoch
//       │
//       ▼
//   Seq2SeqBatcher    → stacks a mini-batch into tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads the corpus from JSON (bundled or on disk)
pub mod loader;

/// Tag-order shuffling applied once per corpus load
pub mod augment;

/// Tokenised samples and Burn's Dataset trait
pub mod dataset;

/// Random train/validation partition
pub mod splitter;

/// Restartable mini-batch iteration
pub mod batches;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
