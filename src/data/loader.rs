// ============================================================
// Layer 4: Corpus Loader
// ============================================================
// Loads the (tags, description) corpus from JSON:
//
//   [
//     { "tags": "red roses, bouquet, vase, table",
//       "description": "a bouquet of red roses in a vase on a table" },
//     ...
//   ]
//
// With no path, the corpus bundled into the binary at compile
// time (resources/corpus.json) is used. Passing --corpus swaps
// in another file without touching the code.
//
// Reference: serde_json crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::example::Example;
use crate::domain::traits::CorpusSource;

const BUNDLED_CORPUS: &str = include_str!("../../resources/corpus.json");

pub struct JsonCorpusLoader {
    /// `None` means the bundled corpus
    path: Option<PathBuf>,
}

impl JsonCorpusLoader {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: Some(path.into()) }
    }

    pub fn bundled() -> Self {
        Self { path: None }
    }
}

impl CorpusSource for JsonCorpusLoader {
    fn load_all(&self) -> Result<Vec<Example>> {
        let examples: Vec<Example> = match &self.path {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("Cannot read corpus '{}'", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("Cannot parse corpus '{}'", path.display()))?
            }
            None => serde_json::from_str(BUNDLED_CORPUS)
                .context("Bundled corpus is not valid JSON")?,
        };

        tracing::info!(
            "Loaded {} examples from {}",
            examples.len(),
            self.path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "bundled corpus".to_string()),
        );
        Ok(examples)
    }
}
