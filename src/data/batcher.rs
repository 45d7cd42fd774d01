// ============================================================
// Layer 4: Seq2Seq Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<DescriptionSample>
// into tensors for one encoder-decoder forward pass.
//
// Shapes (N samples, S = max input len, T = max target len):
//   input_ids          [N, S]
//   input_pad_mask     [N, S]   true where the input is padding
//   decoder_input_ids  [N, T]   labels shifted right behind [BOS]
//   labels             [N, T]
//
// Teacher forcing: at position t the decoder sees the true
// tokens 0..t-1 and is trained to predict token t.
//
//   labels:            a    dog  in   park [EOS] [PAD]
//   decoder_input_ids: [BOS] a   dog  in   park  [EOS]
//
// All samples are pre-padded to the same length, so stacking is
// a flatten followed by a reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::DescriptionSample;

#[derive(Debug, Clone)]
pub struct Seq2SeqBatch<B: Backend> {
    pub input_ids:         Tensor<B, 2, Int>,
    pub input_pad_mask:    Tensor<B, 2, Bool>,
    pub decoder_input_ids: Tensor<B, 2, Int>,
    pub labels:            Tensor<B, 2, Int>,
}

#[derive(Clone, Debug)]
pub struct Seq2SeqBatcher<B: Backend> {
    pub device: B::Device,
    /// Token that starts every decoder input
    pub bos_id: u32,
}

impl<B: Backend> Seq2SeqBatcher<B> {
    pub fn new(device: B::Device, bos_id: u32) -> Self {
        Self { device, bos_id }
    }

    fn stack(&self, rows: Vec<Vec<i32>>, width: usize) -> Tensor<B, 2, Int> {
        let height = rows.len();
        let flat: Vec<i32> = rows.into_iter().flatten().collect();
        Tensor::<B, 2, Int>::from_data(TensorData::new(flat, [height, width]), &self.device)
    }
}

/// `[bos] + labels[..len-1]`
pub fn shift_right(labels: &[u32], bos_id: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(labels.len());
    if labels.is_empty() {
        return out;
    }
    out.push(bos_id);
    out.extend_from_slice(&labels[..labels.len() - 1]);
    out
}

impl<B: Backend> Batcher<DescriptionSample, Seq2SeqBatch<B>> for Seq2SeqBatcher<B> {
    fn batch(&self, items: Vec<DescriptionSample>) -> Seq2SeqBatch<B> {
        let src_len = items.first().map(|s| s.input.len()).unwrap_or(0);
        let tgt_len = items.first().map(|s| s.labels.len()).unwrap_or(0);

        let as_i32 = |ids: &[u32]| ids.iter().map(|&x| x as i32).collect::<Vec<i32>>();

        let input_rows   = items.iter().map(|s| as_i32(&s.input.ids)).collect();
        let mask_rows    = items.iter().map(|s| as_i32(&s.input.attention_mask)).collect();
        let decoder_rows = items
            .iter()
            .map(|s| as_i32(&shift_right(&s.labels.ids, self.bos_id)))
            .collect();
        let label_rows   = items.iter().map(|s| as_i32(&s.labels.ids)).collect();

        Seq2SeqBatch {
            input_ids:         self.stack(input_rows, src_len),
            // attention_mask is 1 for real tokens, so padding is where it equals 0
            input_pad_mask:    self.stack(mask_rows, src_len).equal_elem(0),
            decoder_input_ids: self.stack(decoder_rows, tgt_len),
            labels:            self.stack(label_rows, tgt_len),
        }
    }
}
