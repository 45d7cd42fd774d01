// ============================================================
// Layer 3: Encoded Text
// ============================================================
// A tokenised string, padded or truncated to a fixed length.
//
//   "red roses, vase" (max_len = 8)
//     ids:            [17, 42, 5, 63, 3, 0, 0, 0]
//     attention_mask: [ 1,  1, 1,  1, 1, 0, 0, 0]
//
// Fixed lengths mean every sample in a batch already has the
// same shape, so the batcher can stack them without re-padding.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedText {
    pub ids:            Vec<u32>,
    /// 1 = real token, 0 = padding
    pub attention_mask: Vec<u32>,
}

impl EncodedText {
    /// Truncate `ids` to `max_len` then pad with `pad_id` up to `max_len`.
    pub fn fixed_length(mut ids: Vec<u32>, max_len: usize, pad_id: u32) -> Self {
        ids.truncate(max_len);
        let real = ids.len();
        let mut attention_mask = vec![1u32; real];

        ids.resize(max_len, pad_id);
        attention_mask.resize(max_len, 0);

        Self { ids, attention_mask }
    }

    /// Number of non-padding positions.
    pub fn real_len(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
