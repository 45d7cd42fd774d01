// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `describe`, and
// all their configurable flags.
//
// clap's derive macros generate the --help text, the errors for
// missing arguments and the string → number conversions.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the tags → description model on the corpus
    Train(TrainArgs),

    /// Generate a description for a comma-separated tag string
    Describe(DescribeArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSON corpus of {"tags", "description"} objects.
    /// The bundled corpus is used when omitted.
    #[arg(long)]
    pub corpus: Option<String>,

    /// Where weights, tokenizer, config and metrics are written
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Token budget for the tag string, [EOS] included
    #[arg(long, default_value_t = 128)]
    pub max_input_len: usize,

    /// Token budget for the description, [EOS] included
    #[arg(long, default_value_t = 64)]
    pub max_output_len: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 25)]
    pub epochs: usize,

    /// AdamW learning rate
    #[arg(long, default_value_t = 8e-5)]
    pub lr: f64,

    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f32,

    /// Fraction of examples used for training, in (0, 1)
    #[arg(long, default_value_t = 0.8)]
    pub split_ratio: f64,

    /// Beams used when generating; 1 = greedy
    #[arg(long, default_value_t = 8)]
    pub beam_size: usize,

    /// Seed for tag shuffling, the split and batch order.
    /// Runs are not reproducible without it.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Hidden dimension of the transformer.
    /// Must be divisible by num_heads.
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    /// Layers in each of the encoder and the decoder
    #[arg(long, default_value_t = 3)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward blocks
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Largest vocabulary the tokenizer may build
    #[arg(long, default_value_t = 8000)]
    pub vocab_size: usize,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            corpus_path:    a.corpus,
            checkpoint_dir: a.checkpoint_dir,
            max_input_len:  a.max_input_len,
            max_output_len: a.max_output_len,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            weight_decay:   a.weight_decay,
            split_ratio:    a.split_ratio,
            beam_size:      a.beam_size,
            seed:           a.seed,
            d_model:        a.d_model,
            num_heads:      a.num_heads,
            num_layers:     a.num_layers,
            d_ff:           a.d_ff,
            dropout:        a.dropout,
            vocab_size:     a.vocab_size,
        }
    }
}

/// All arguments for the `describe` command
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Comma-separated tags, e.g. "red roses, bouquet, vase"
    pub input_tags: String,

    /// Directory written by `train`
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}
