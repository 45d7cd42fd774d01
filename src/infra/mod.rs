// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Persistence shared by training and inference:
//
//   checkpoint.rs      - model weights (Burn CompactRecorder) and
//                        TrainConfig as JSON, so inference can
//                        rebuild the exact architecture.
//
//   tokenizer_store.rs - builds the word-level tokenizer from the
//                        corpus, saves it next to the weights and
//                        loads it back for inference.
//
//   metrics.rs         - per-epoch loss rows in a CSV file.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
