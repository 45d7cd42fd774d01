// ============================================================
// Layer 5: Beam Search
// ============================================================
// Backend-free beam search over a "next token log-probs" callback.
//
// Each step the callback receives the live prefixes (all the same
// length, all starting with [BOS]) and returns one row of
// log-probabilities over the vocabulary per prefix.
//
//   width = 1  → greedy decoding
//   width = k  → keep the k best partial descriptions per step
//
// A hypothesis is finished when [EOS] is among the top `width`
// candidates of a step. Search stops once `width` hypotheses are
// finished, no live beam remains, or `max_len` tokens have been
// generated. Hypotheses are ranked by their summed log-prob divided
// by their length, so short outputs are not favoured just for being
// short.

use anyhow::{bail, Result};

use crate::infra::tokenizer_store::{BOS_ID, EOS_ID, PAD_ID, UNK_ID};

pub const DEFAULT_BEAM_WIDTH: usize = 8;
pub const DEFAULT_MAX_LEN:    usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeSettings {
    pub beam_width: usize,
    /// Upper bound on generated tokens, [EOS] included
    pub max_len:    usize,
    pub bos_id:     u32,
    pub eos_id:     u32,
    /// Tokens that may never be generated
    pub banned:     Vec<u32>,
}

impl Default for DecodeSettings {
    fn default() -> Self {
        Self {
            beam_width: DEFAULT_BEAM_WIDTH,
            max_len:    DEFAULT_MAX_LEN,
            bos_id:     BOS_ID,
            eos_id:     EOS_ID,
            banned:     vec![PAD_ID, UNK_ID, BOS_ID],
        }
    }
}

#[derive(Debug, Clone)]
struct Hypothesis {
    /// [BOS] followed by generated tokens, never [EOS]
    ids:   Vec<u32>,
    score: f32,
    ended: bool,
}

impl Hypothesis {
    fn generated_len(&self) -> usize {
        self.ids.len() - 1 + usize::from(self.ended)
    }

    fn normalised_score(&self) -> f32 {
        self.score / self.generated_len().max(1) as f32
    }
}

/// Run beam search and return the best token ids, without [BOS] or [EOS].
pub fn beam_search<F>(settings: &DecodeSettings, mut step: F) -> Result<Vec<u32>>
where
    F: FnMut(&[Vec<u32>]) -> Result<Vec<Vec<f32>>>,
{
    if settings.beam_width == 0 {
        bail!("beam width must be at least 1");
    }
    let width = settings.beam_width;

    let mut live = vec![Hypothesis { ids: vec![settings.bos_id], score: 0.0, ended: false }];
    let mut finished: Vec<Hypothesis> = Vec::new();

    for _ in 0..settings.max_len {
        let prefixes: Vec<Vec<u32>> = live.iter().map(|h| h.ids.clone()).collect();
        let rows = step(&prefixes)?;
        if rows.len() != live.len() {
            bail!("expected {} rows of log-probs, got {}", live.len(), rows.len());
        }

        // ── Score every (beam, token) extension ──────────────────────────────
        let mut candidates: Vec<(f32, usize, u32)> = Vec::new();
        for (beam, row) in rows.iter().enumerate() {
            for (token, &lp) in row.iter().enumerate() {
                let token = token as u32;
                if !lp.is_finite() || settings.banned.contains(&token) {
                    continue;
                }
                candidates.push((live[beam].score + lp, beam, token));
            }
        }
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

        // ── Keep the best `width` live beams ─────────────────────────────────
        let mut next_live = Vec::with_capacity(width);
        for (rank, &(score, beam, token)) in candidates.iter().enumerate() {
            if token == settings.eos_id {
                if rank < width {
                    finished.push(Hypothesis { ids: live[beam].ids.clone(), score, ended: true });
                }
                continue;
            }
            let mut ids = live[beam].ids.clone();
            ids.push(token);
            next_live.push(Hypothesis { ids, score, ended: false });
            if next_live.len() == width {
                break;
            }
        }
        live = next_live;

        if finished.len() >= width || live.is_empty() {
            break;
        }
    }

    // Ran out of length before enough beams ended
    if finished.len() < width {
        finished.extend(live);
    }

    let best = finished
        .into_iter()
        .max_by(|a, b| a.normalised_score().total_cmp(&b.normalised_score()));

    Ok(best.map(|h| h.ids[1..].to_vec()).unwrap_or_default())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const BOS: u32 = 0;
    const EOS: u32 = 1;

    fn settings(beam_width: usize, max_len: usize) -> DecodeSettings {
        DecodeSettings { beam_width, max_len, bos_id: BOS, eos_id: EOS, banned: vec![BOS] }
    }

    fn ln(p: f32) -> f32 {
        if p == 0.0 { f32::NEG_INFINITY } else { p.ln() }
    }

    // Vocabulary: 0 = BOS, 1 = EOS, 2 and 3 are words.
    // Token 2 looks best first, but 3 is followed by EOS far more
    // confidently, so the whole sequence [3] is the better one.
    fn toy_model(prefixes: &[Vec<u32>]) -> Result<Vec<Vec<f32>>> {
        Ok(prefixes
            .iter()
            .map(|p| match p.last() {
                Some(&2) => vec![ln(0.0), ln(0.4), ln(0.3), ln(0.3)],
                Some(&3) => vec![ln(0.0), ln(0.9), ln(0.05), ln(0.05)],
                _        => vec![ln(0.0), ln(0.0), ln(0.6), ln(0.4)],
            })
            .collect())
    }

    #[test]
    fn test_greedy_takes_locally_best_token() {
        let ids = beam_search(&settings(1, 10), toy_model).unwrap();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_beam_finds_better_sequence() {
        let ids = beam_search(&settings(2, 10), toy_model).unwrap();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn test_stops_at_max_len() {
        let never_ends = |p: &[Vec<u32>]| -> Result<Vec<Vec<f32>>> {
            Ok(p.iter().map(|_| vec![ln(0.0), ln(0.0), ln(1.0), ln(0.0)]).collect())
        };
        let ids = beam_search(&settings(3, 4), never_ends).unwrap();
        assert_eq!(ids, vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_banned_tokens_never_appear() {
        let mut s = settings(2, 3);
        s.banned.push(2);
        let ids = beam_search(&s, toy_model).unwrap();
        assert!(!ids.contains(&2));
    }

    #[test]
    fn test_prefixes_start_with_bos_and_share_length() {
        let mut seen = Vec::new();
        beam_search(&settings(2, 3), |p: &[Vec<u32>]| {
            seen.push(p.to_vec());
            toy_model(p)
        })
        .unwrap();

        for prefixes in seen {
            let len = prefixes[0].len();
            assert!(prefixes.iter().all(|p| p[0] == BOS && p.len() == len));
        }
    }

    #[test]
    fn test_zero_width_is_an_error() {
        assert!(beam_search(&settings(0, 3), toy_model).is_err());
    }

    #[test]
    fn test_row_count_mismatch_is_an_error() {
        let broken = |_: &[Vec<u32>]| -> Result<Vec<Vec<f32>>> { Ok(Vec::new()) };
        assert!(beam_search(&settings(1, 3), broken).is_err());
    }
}
