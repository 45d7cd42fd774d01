use anyhow::Result;
use burn::{
    nn::{
        attention::generate_autoregressive_mask,
        loss::CrossEntropyLossConfig,
        transformer::{
            TransformerDecoder, TransformerDecoderConfig, TransformerDecoderInput,
            TransformerEncoder, TransformerEncoderConfig, TransformerEncoderInput,
        },
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::batcher::Seq2SeqBatch;
use crate::domain::encoding::EncodedText;
use crate::infra::tokenizer_store::PAD_ID;
use crate::ml::decoding::{beam_search, DecodeSettings};

// #[derive(Config)] already generates Clone and Serialize/Deserialize;
// deriving them again gives conflicting impls.
#[derive(Config, Debug)]
pub struct TagsToTextConfig {
    pub vocab_size:     usize,
    pub max_input_len:  usize,
    pub max_target_len: usize,
    pub d_model:        usize,
    pub num_heads:      usize,
    pub num_layers:     usize,
    pub d_ff:           usize,
    pub pad_id:         usize,
    #[config(default = 0.1)]
    pub dropout:        f64,
}

impl TagsToTextConfig {
    /// Architecture for a training run. `vocab_size` comes from the
    /// built tokenizer, not the requested cap.
    pub fn from_train_config(cfg: &TrainConfig, vocab_size: usize) -> Self {
        Self::new(
            vocab_size, cfg.max_input_len, cfg.max_output_len,
            cfg.d_model, cfg.num_heads, cfg.num_layers, cfg.d_ff,
            PAD_ID as usize,
        )
        .with_dropout(cfg.dropout)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> TagsToTextModel<B> {
        let token_embedding   = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let encoder_positions = EmbeddingConfig::new(self.max_input_len, self.d_model).init(device);
        let decoder_positions = EmbeddingConfig::new(self.max_target_len, self.d_model).init(device);

        let encoder = TransformerEncoderConfig::new(
            self.d_model, self.d_ff, self.num_heads, self.num_layers,
        )
        .with_dropout(self.dropout)
        .init(device);

        let decoder = TransformerDecoderConfig::new(
            self.d_model, self.d_ff, self.num_heads, self.num_layers,
        )
        .with_dropout(self.dropout)
        .init(device);

        let lm_head = LinearConfig::new(self.d_model, self.vocab_size).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();

        TagsToTextModel {
            token_embedding, encoder_positions, decoder_positions,
            encoder, decoder, lm_head, dropout,
            pad_id: self.pad_id,
        }
    }
}

/// Encoder-decoder transformer: tags in, description out.
/// The token embedding table is shared by both sides.
#[derive(Module, Debug)]
pub struct TagsToTextModel<B: Backend> {
    pub token_embedding:   Embedding<B>,
    pub encoder_positions: Embedding<B>,
    pub decoder_positions: Embedding<B>,
    pub encoder:           TransformerEncoder<B>,
    pub decoder:           TransformerDecoder<B>,
    pub lm_head:           Linear<B>,
    pub dropout:           Dropout,
    pub pad_id:            usize,
}

impl<B: Backend> TagsToTextModel<B> {
    fn embed(&self, ids: Tensor<B, 2, Int>, positions: &Embedding<B>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = ids.dims();
        let tok_emb = self.token_embedding.forward(ids);

        // Attention is order-blind, so positions are added explicitly.
        let pos_ids = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = positions.forward(pos_ids);

        self.dropout.forward(tok_emb + pos_emb)
    }

    /// input_ids, pad_mask: [batch, src_len] → memory: [batch, src_len, d_model]
    pub fn encode(&self, input_ids: Tensor<B, 2, Int>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let x = self.embed(input_ids, &self.encoder_positions);
        self.encoder.forward(TransformerEncoderInput::new(x).mask_pad(pad_mask))
    }

    /// decoder_input_ids: [batch, tgt_len] → logits: [batch, tgt_len, vocab]
    pub fn decode(
        &self,
        decoder_input_ids: Tensor<B, 2, Int>,
        memory:            Tensor<B, 3>,
        memory_pad_mask:   Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let [batch_size, tgt_len] = decoder_input_ids.dims();
        let device = decoder_input_ids.device();

        let target_pad = decoder_input_ids.clone().equal_elem(self.pad_id as i32);
        let causal     = generate_autoregressive_mask::<B>(batch_size, tgt_len, &device);

        let x = self.embed(decoder_input_ids, &self.decoder_positions);
        let input = TransformerDecoderInput::new(x, memory)
            .target_mask_attn(causal)
            .target_mask_pad(target_pad)
            .memory_mask_pad(memory_pad_mask);

        self.lm_head.forward(self.decoder.forward(input))
    }

    /// Mean token-level cross entropy, ignoring [PAD] labels.
    pub fn forward_loss(&self, batch: Seq2SeqBatch<B>) -> Tensor<B, 1> {
        let memory = self.encode(batch.input_ids, batch.input_pad_mask.clone());
        let logits = self.decode(batch.decoder_input_ids, memory, batch.input_pad_mask);

        let [batch_size, tgt_len, vocab] = logits.dims();
        let ce = CrossEntropyLossConfig::new()
            .with_pad_tokens(Some(vec![self.pad_id]))
            .init(&logits.device());

        ce.forward(
            logits.reshape([batch_size * tgt_len, vocab]),
            batch.labels.reshape([batch_size * tgt_len]),
        )
    }

    /// Log-probabilities of the next token for each prefix.
    ///
    /// All prefixes must have the same length; `memory` and
    /// `memory_pad_mask` are for a single input and are repeated
    /// across the prefixes.
    pub fn next_token_log_probs(
        &self,
        memory:          &Tensor<B, 3>,
        memory_pad_mask: &Tensor<B, 2, Bool>,
        prefixes:        &[Vec<u32>],
    ) -> Result<Vec<Vec<f32>>> {
        let n   = prefixes.len();
        let len = prefixes.first().map(Vec::len).unwrap_or(0);
        if n == 0 || len == 0 {
            return Ok(Vec::new());
        }
        let device = memory.device();

        let flat: Vec<i32> = prefixes.iter().flatten().map(|&x| x as i32).collect();
        let ids = Tensor::<B, 2, Int>::from_data(TensorData::new(flat, [n, len]), &device);

        let memory   = Tensor::cat(vec![memory.clone(); n], 0);
        let pad_mask = Tensor::cat(vec![memory_pad_mask.clone(); n], 0);

        let logits = self.decode(ids, memory, pad_mask);
        let [_, _, vocab] = logits.dims();
        let last = logits
            .slice([0..n, len - 1..len, 0..vocab])
            .reshape([n, vocab]);

        let values: Vec<f32> = burn::tensor::activation::log_softmax(last, 1)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read logits: {e:?}"))?;

        Ok(values.chunks(vocab).map(<[f32]>::to_vec).collect())
    }

    /// Encode one input and beam-search a description for it.
    /// Returns generated ids without [BOS] and [EOS].
    pub fn generate_ids(
        &self,
        input:    &EncodedText,
        settings: &DecodeSettings,
        device:   &B::Device,
    ) -> Result<Vec<u32>> {
        let src_len = input.len();
        let ids: Vec<i32>  = input.ids.iter().map(|&x| x as i32).collect();
        let mask: Vec<i32> = input.attention_mask.iter().map(|&x| x as i32).collect();

        let input_ids = Tensor::<B, 2, Int>::from_data(TensorData::new(ids, [1, src_len]), device);
        let pad_mask  = Tensor::<B, 2, Int>::from_data(TensorData::new(mask, [1, src_len]), device)
            .equal_elem(0);

        let memory = self.encode(input_ids, pad_mask.clone());

        beam_search(settings, |prefixes| {
            self.next_token_log_probs(&memory, &pad_mask, prefixes)
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny() -> TagsToTextModel<TestBackend> {
        TagsToTextConfig::new(12, 6, 5, 8, 2, 1, 16, 0)
            .with_dropout(0.0)
            .init(&Default::default())
    }

    #[test]
    fn test_next_token_log_probs_shape() {
        let model  = tiny();
        let device = Default::default();
        let input  = Tensor::<TestBackend, 2, Int>::from_data(
            TensorData::new(vec![4i32, 5, 6, 3, 0, 0], [1, 6]), &device,
        );
        let mask   = input.clone().equal_elem(0);
        let memory = model.encode(input, mask.clone());

        let out = model
            .next_token_log_probs(&memory, &mask, &[vec![2, 7], vec![2, 8]])
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), 12);

        // log-softmax rows sum to 1 in probability space
        let total: f32 = out[0].iter().map(|lp| lp.exp()).sum();
        assert!((total - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_generate_respects_length_cap() {
        let model    = tiny();
        let input    = EncodedText::fixed_length(vec![4, 5, 3], 6, 0);
        let settings = DecodeSettings { beam_width: 2, max_len: 4, ..DecodeSettings::default() };

        let ids = model.generate_ids(&input, &settings, &Default::default()).unwrap();
        assert!(ids.len() <= 4);
    }
}
