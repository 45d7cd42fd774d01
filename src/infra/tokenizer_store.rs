// ============================================================
// Layer 6: Tokenizer Store
// ============================================================
// Builds, saves and loads the word-level tokenizer.
//
// The vocabulary is built from the corpus itself (tags and
// descriptions), written in HuggingFace tokenizer JSON and loaded
// back through `tokenizers::Tokenizer`, so training and
// inference always use the same ids.
//
// Special tokens have fixed ids:
//   [PAD] = 0   [UNK] = 1   [BOS] = 2   [EOS] = 3
//
// Vocabulary counting runs the same BertNormalizer and Whitespace
// pre-tokenizer that get saved in the JSON, so "Pokémon" is counted
// as "pokemon", the form encoding will look up.
// "red roses, vase" → red | roses | , | vase
//
// Reference: tokenizers crate documentation

use anyhow::{Context, Result};
use std::{collections::HashMap, path::PathBuf, str::FromStr};
use tokenizers::{
    normalizers::bert::BertNormalizer,
    pre_tokenizers::whitespace::Whitespace,
    NormalizedString, Normalizer, OffsetReferential, OffsetType,
    PreTokenizedString, PreTokenizer, Tokenizer,
};

use crate::domain::encoding::EncodedText;

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;
pub const BOS_ID: u32 = 2;
pub const EOS_ID: u32 = 3;

const SPECIAL_TOKENS: [(&str, u32); 4] = [
    ("[PAD]", PAD_ID),
    ("[UNK]", UNK_ID),
    ("[BOS]", BOS_ID),
    ("[EOS]", EOS_ID),
];

const TOKENIZER_FILE: &str = "tokenizer.json";

// ─── TagTokenizer ─────────────────────────────────────────────────────────────
/// A loaded tokenizer plus the fixed-length encoding rules the
/// model expects.
#[derive(Clone)]
pub struct TagTokenizer {
    inner: Tokenizer,
}

impl TagTokenizer {
    pub fn new(inner: Tokenizer) -> Self {
        Self { inner }
    }

    /// Encode to exactly `max_len` ids: tokens, then [EOS], then
    /// [PAD]s. Long inputs are cut so that [EOS] always fits.
    pub fn encode_fixed(&self, text: &str, max_len: usize) -> Result<EncodedText> {
        let enc = self.inner
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;

        let mut ids = enc.get_ids().to_vec();
        ids.truncate(max_len.saturating_sub(1));
        ids.push(EOS_ID);

        Ok(EncodedText::fixed_length(ids, max_len, PAD_ID))
    }

    /// Turn ids back into text, dropping special tokens.
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        self.inner
            .decode(ids, true)
            .map_err(|e| anyhow::anyhow!("Decode error: {e}"))
    }

    /// One past the largest id, i.e. the embedding table size.
    pub fn vocab_size(&self) -> usize {
        self.inner
            .get_vocab(true)
            .values()
            .max()
            .map(|&id| id as usize + 1)
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub fn inner(&self) -> &Tokenizer {
        &self.inner
    }
}

// ─── TokenizerStore ───────────────────────────────────────────────────────────
pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Load a previously saved tokenizer from JSON file
    pub fn load(&self) -> Result<TagTokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path)
            .map(TagTokenizer::new)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}. Have you run 'train' first?",
                path.display(), e
            ))
    }

    pub fn save(&self, tokenizer: &TagTokenizer) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.path();
        tokenizer.inner
            .save(&path, true)
            .map_err(|e| anyhow::anyhow!("Cannot write tokenizer to '{}': {e}", path.display()))?;
        tracing::debug!("Saved tokenizer to '{}'", path.display());
        Ok(())
    }

    /// Build a word-level tokenizer from the given texts.
    ///
    /// Keeps the `vocab_size - 4` most frequent tokens; anything
    /// rarer maps to [UNK]. Nothing is written to disk.
    pub fn build(&self, texts: &[&str], vocab_size: usize) -> Result<TagTokenizer> {
        // ── Step 1: Count token frequencies ──────────────────────────────────
        let normalizer = normalizer();
        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for token in pre_tokenize(&normalizer, text)? {
                *freq.entry(token).or_insert(0) += 1;
            }
        }

        // Most frequent first, ties broken alphabetically so the
        // same corpus always yields the same ids
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(vocab_size.saturating_sub(SPECIAL_TOKENS.len()));

        // ── Step 2: Build vocab JSON ─────────────────────────────────────────
        let mut vocab = serde_json::Map::new();
        for (token, id) in SPECIAL_TOKENS {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        let mut next_id = SPECIAL_TOKENS.len();
        for (word, _) in &words {
            if !vocab.contains_key(word) {
                vocab.insert(word.clone(), serde_json::json!(next_id));
                next_id += 1;
            }
        }

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .map(|(content, id)| serde_json::json!({
                "id": id, "content": content,
                "single_word": false, "lstrip": false, "rstrip": false,
                "normalized": false, "special": true
            }))
            .collect();

        // ── Step 3: Assemble tokenizer JSON in HuggingFace format ────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": serde_json::to_value(&normalizer)?,
            "pre_tokenizer": serde_json::to_value(Whitespace::default())?,
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        tracing::info!("Tokenizer built with {} tokens", next_id);

        let inner = Tokenizer::from_str(&tokenizer_json.to_string())
            .map_err(|e| anyhow::anyhow!("Cannot build tokenizer: {e}"))?;
        Ok(TagTokenizer::new(inner))
    }
}

/// The normalizer written into tokenizer.json. Vocabulary counting
/// must see text exactly as encoding will.
fn normalizer() -> BertNormalizer {
    BertNormalizer::new(true, true, None, true)
}

/// Normalise then split `text` the way the saved tokenizer does:
/// lowercased, accents stripped, CJK characters on their own, then
/// word runs and punctuation runs as separate tokens.
fn pre_tokenize(normalizer: &BertNormalizer, text: &str) -> Result<Vec<String>> {
    let mut normalized = NormalizedString::from(text);
    normalizer
        .normalize(&mut normalized)
        .map_err(|e| anyhow::anyhow!("Cannot normalise '{text}': {e}"))?;

    let mut pre = PreTokenizedString::from(normalized);
    Whitespace::default()
        .pre_tokenize(&mut pre)
        .map_err(|e| anyhow::anyhow!("Cannot pre-tokenise '{text}': {e}"))?;

    Ok(pre
        .get_splits(OffsetReferential::Original, OffsetType::Byte)
        .into_iter()
        .map(|(token, _, _)| token.to_string())
        .collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> TagTokenizer {
        let store = TokenizerStore::new("unused");
        store
            .build(&["red roses, bouquet", "a bouquet of red roses."], 100)
            .unwrap()
    }

    #[test]
    fn test_pre_tokenize_splits_punctuation() {
        assert_eq!(
            pre_tokenize(&normalizer(), "Red roses, vase!!").unwrap(),
            vec!["red", "roses", ",", "vase", "!!"]
        );
    }

    #[test]
    fn test_pre_tokenize_strips_accents_and_splits_cjk() {
        assert_eq!(
            pre_tokenize(&normalizer(), "Pokémon, café 猫耳").unwrap(),
            vec!["pokemon", ",", "cafe", "猫", "耳"]
        );
    }

    #[test]
    fn test_accented_and_cjk_words_are_known() {
        let tok = TokenizerStore::new("unused")
            .build(&["pokémon, café", "猫耳"], 100)
            .unwrap();

        for text in ["pokémon", "café", "猫耳", "Pokémon, Café"] {
            let enc = tok.encode_fixed(text, 8).unwrap();
            assert!(
                !enc.ids.contains(&UNK_ID),
                "'{text}' encoded to {:?}",
                enc.ids
            );
        }
    }

    #[test]
    fn test_special_ids_are_fixed() {
        let tok   = build();
        let vocab = tok.inner().get_vocab(true);
        assert_eq!(vocab["[PAD]"], PAD_ID);
        assert_eq!(vocab["[UNK]"], UNK_ID);
        assert_eq!(vocab["[BOS]"], BOS_ID);
        assert_eq!(vocab["[EOS]"], EOS_ID);
        assert!(vocab.contains_key(","));
    }

    #[test]
    fn test_encode_fixed_appends_eos_and_pads() {
        let tok = build();
        let enc = tok.encode_fixed("red roses", 5).unwrap();
        assert_eq!(enc.len(), 5);
        assert_eq!(enc.real_len(), 3);
        assert_eq!(enc.ids[2], EOS_ID);
        assert_eq!(&enc.ids[3..], &[PAD_ID, PAD_ID]);
    }

    #[test]
    fn test_encode_fixed_truncates_but_keeps_eos() {
        let tok = build();
        let enc = tok.encode_fixed("a bouquet of red roses", 3).unwrap();
        assert_eq!(enc.len(), 3);
        assert_eq!(enc.ids[2], EOS_ID);
    }

    #[test]
    fn test_unknown_word_maps_to_unk() {
        let tok = build();
        let enc = tok.encode_fixed("zeppelin", 3).unwrap();
        assert_eq!(enc.ids[0], UNK_ID);
    }

    #[test]
    fn test_vocab_size_cap() {
        let store = TokenizerStore::new("unused");
        let tok   = store.build(&["a b c d e f g h"], 6).unwrap();
        // 4 special tokens + 2 words
        assert_eq!(tok.vocab_size(), 6);
    }

    #[test]
    fn test_decode_skips_special_tokens() {
        let tok  = build();
        let enc  = tok.encode_fixed("red roses", 6).unwrap();
        let text = tok.decode(&enc.ids).unwrap();
        assert_eq!(text, "red roses");
    }

    #[test]
    fn test_save_then_load() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().to_string_lossy());
        let tok   = store.build(&["snowman, scarf, carrot nose"], 50).unwrap();
        store.save(&tok).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(
            loaded.encode_fixed("carrot nose", 8).unwrap(),
            tok.encode_fixed("carrot nose", 8).unwrap()
        );
    }

    #[test]
    fn test_load_missing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TokenizerStore::new(dir.path().to_string_lossy()).load().is_err());
    }
}
