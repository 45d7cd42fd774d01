// ============================================================
// Layer 5: ML / Model Layer (Burn)
// ============================================================
// All of the tensor code lives here. The data layer only sees
// Burn through its Dataset and Batcher traits.
//
// What's in this layer:
//
//   model.rs      - encoder-decoder transformer:
//                   • shared token embedding
//                   • learned positional embeddings
//                   • TransformerEncoder / TransformerDecoder
//                   • linear head over the vocabulary
//
//   decoding.rs   - beam search over next-token log-probs,
//                   independent of any backend
//
//   seq2seq.rs    - the Seq2SeqModel trait the training loop
//                   drives, and its Burn + AdamW implementation
//
//   trainer.rs    - epoch loop: train pass, validation pass,
//                   per-epoch loss report
//
//   inferencer.rs - rebuilds the model from a checkpoint and
//                   generates descriptions
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Encoder-decoder transformer architecture
pub mod model;

/// Beam search decoding
pub mod decoding;

/// Model seam used by the training loop
pub mod seq2seq;

/// Training loop with per-epoch validation
pub mod trainer;

/// Inference engine: loads a checkpoint and generates descriptions
pub mod inferencer;
