// ============================================================
// Layer 3: Core Traits (Abstractions)
// ============================================================
// The application layer talks to these traits, never to the
// concrete loader or model, so each side can be swapped (or
// stubbed in tests) without touching the workflow code.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::example::Example;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Anything that can produce the labelled (tags, description) corpus.
///
/// Implementations:
///   - JsonCorpusLoader → a JSON file on disk, or the bundled default
pub trait CorpusSource {
    /// Load every example, in corpus order.
    fn load_all(&self) -> Result<Vec<Example>>;
}

// ─── DescriptionGenerator ─────────────────────────────────────────────────────
/// Anything that can turn a tag string into a sentence.
///
/// Implementations:
///   - Inferencer → beam search over a trained checkpoint
pub trait DescriptionGenerator {
    fn describe(&self, tags: &str) -> Result<String>;
}
