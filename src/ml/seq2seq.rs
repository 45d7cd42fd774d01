// ============================================================
// Layer 5: Sequence Model Seam
// ============================================================
// The training loop only needs four things from a model:
//
//   tokenize       text → fixed-length EncodedText
//   train_step     one optimiser update on a batch, returns loss
//   evaluate_step  loss on a batch, no update, no dropout
//   generate       beam-search a description for one input
//
// `Seq2SeqModel` captures exactly that, so the loop can be driven
// by a stub in tests. `BurnSeq2Seq` is the real implementation:
// a TagsToTextModel on an autodiff backend plus its optimiser.
//
// Key Burn insight:
//   - Training runs on B (Autodiff<Wgpu>) so loss.backward() works
//   - model.valid() returns the model on B::InnerBackend, which has
//     no autodiff graph and turns dropout off
//   - Evaluation and generation therefore batch on B::InnerBackend

use anyhow::{bail, Result};
use burn::{
    data::dataloader::batcher::Batcher,
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{batcher::Seq2SeqBatcher, dataset::DescriptionSample};
use crate::domain::encoding::EncodedText;
use crate::infra::tokenizer_store::{TagTokenizer, BOS_ID};
use crate::ml::decoding::DecodeSettings;
use crate::ml::model::TagsToTextModel;

pub trait Seq2SeqModel {
    fn tokenize(&self, text: &str, max_len: usize) -> Result<EncodedText>;

    /// Forward, backward and one optimiser step. Returns the batch loss.
    fn train_step(&mut self, batch: Vec<DescriptionSample>) -> Result<f64>;

    /// Batch loss without touching the parameters.
    fn evaluate_step(&self, batch: Vec<DescriptionSample>) -> Result<f64>;

    fn generate(&self, input: &EncodedText, beam_width: usize, max_len: usize) -> Result<String>;
}

pub struct BurnSeq2Seq<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<TagsToTextModel<B>, B>,
{
    model:          TagsToTextModel<B>,
    optim:          O,
    lr:             f64,
    tokenizer:      TagTokenizer,
    max_target_len: usize,
    device:         B::Device,
}

impl<B, O> BurnSeq2Seq<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<TagsToTextModel<B>, B>,
{
    pub fn new(
        model:          TagsToTextModel<B>,
        optim:          O,
        lr:             f64,
        tokenizer:      TagTokenizer,
        max_target_len: usize,
        device:         B::Device,
    ) -> Self {
        Self { model, optim, lr, tokenizer, max_target_len, device }
    }

    pub fn model(&self) -> &TagsToTextModel<B> {
        &self.model
    }
}

impl<B, O> Seq2SeqModel for BurnSeq2Seq<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<TagsToTextModel<B>, B>,
{
    fn tokenize(&self, text: &str, max_len: usize) -> Result<EncodedText> {
        self.tokenizer.encode_fixed(text, max_len)
    }

    fn train_step(&mut self, batch: Vec<DescriptionSample>) -> Result<f64> {
        if batch.is_empty() {
            bail!("cannot train on an empty batch");
        }
        let batcher = Seq2SeqBatcher::<B>::new(self.device.clone(), BOS_ID);
        let loss    = self.model.forward_loss(batcher.batch(batch));

        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

        // Backward pass + AdamW update
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self.optim.step(self.lr, self.model.clone(), grads);

        Ok(loss_val)
    }

    fn evaluate_step(&self, batch: Vec<DescriptionSample>) -> Result<f64> {
        if batch.is_empty() {
            bail!("cannot evaluate an empty batch");
        }
        let model   = self.model.valid();
        let batcher = Seq2SeqBatcher::<B::InnerBackend>::new(self.device.clone(), BOS_ID);
        let loss    = model.forward_loss(batcher.batch(batch));
        Ok(loss.into_scalar().elem::<f64>())
    }

    fn generate(&self, input: &EncodedText, beam_width: usize, max_len: usize) -> Result<String> {
        let settings = DecodeSettings {
            beam_width,
            max_len: max_len.min(self.max_target_len),
            ..DecodeSettings::default()
        };
        let ids = self.model.valid().generate_ids(input, &settings, &self.device)?;
        self.tokenizer.decode(&ids)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::{Autodiff, NdArray},
        optim::AdamWConfig,
    };

    use crate::data::dataset::encode_examples;
    use crate::domain::example::AugmentedExample;
    use crate::infra::tokenizer_store::{TokenizerStore, PAD_ID};
    use crate::ml::model::TagsToTextConfig;

    type TestBackend = Autodiff<NdArray>;

    fn samples(tok: &TagTokenizer) -> Vec<DescriptionSample> {
        let examples = vec![
            AugmentedExample { tags: "snow, scarf".into(), description: "a snowman with a scarf".into() },
            AugmentedExample { tags: "red, roses".into(),  description: "red roses in a vase".into() },
        ];
        encode_examples(&examples, 6, 8, |t, n| tok.encode_fixed(t, n)).unwrap()
    }

    #[test]
    fn test_train_step_returns_finite_loss_and_generates() {
        let tok = TokenizerStore::new("unused")
            .build(&["snow, scarf", "a snowman with a scarf", "red, roses", "red roses in a vase"], 64)
            .unwrap();
        let device = Default::default();
        let model: TagsToTextModel<TestBackend> =
            TagsToTextConfig::new(tok.vocab_size(), 6, 8, 16, 2, 1, 32, PAD_ID as usize)
                .with_dropout(0.0)
                .init(&device);
        let optim = AdamWConfig::new().init();

        let mut s2s = BurnSeq2Seq::new(model, optim, 1e-3, tok.clone(), 8, device);
        let batch   = samples(&tok);

        let train_loss = s2s.train_step(batch.clone()).unwrap();
        let val_loss   = s2s.evaluate_step(batch.clone()).unwrap();
        assert!(train_loss.is_finite() && train_loss > 0.0);
        assert!(val_loss.is_finite());

        let text = s2s.generate(&batch[0].input, 2, 5).unwrap();
        assert!(text.split_whitespace().count() <= 5);
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        let tok = TokenizerStore::new("unused").build(&["a b"], 16).unwrap();
        let device = Default::default();
        let model: TagsToTextModel<TestBackend> =
            TagsToTextConfig::new(tok.vocab_size(), 4, 4, 8, 2, 1, 16, 0)
                .with_dropout(0.0)
                .init(&device);
        let mut s2s = BurnSeq2Seq::new(model, AdamWConfig::new().init(), 1e-3, tok, 4, device);

        assert!(s2s.train_step(Vec::new()).is_err());
        assert!(s2s.evaluate_step(Vec::new()).is_err());
    }
}
