// ============================================================
// Layer 5: Inferencer
// ============================================================
use anyhow::Result;

use crate::application::train_use_case::TrainConfig;
use crate::domain::traits::DescriptionGenerator;
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::TagTokenizer,
};
use crate::ml::decoding::DecodeSettings;
use crate::ml::model::{TagsToTextConfig, TagsToTextModel};

type InferBackend = burn::backend::Wgpu;

pub struct Inferencer {
    model:     TagsToTextModel<InferBackend>,
    tokenizer: TagTokenizer,
    cfg:       TrainConfig,
    device:    burn::backend::wgpu::WgpuDevice,
}

impl Inferencer {
    pub fn from_checkpoint(
        ckpt_manager: &CheckpointManager,
        tokenizer:    TagTokenizer,
    ) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        let cfg    = ckpt_manager.load_config()?;

        // Dropout off: inference is deterministic
        let model_cfg = TagsToTextConfig::from_train_config(&cfg, tokenizer.vocab_size())
            .with_dropout(0.0);
        let model: TagsToTextModel<InferBackend> = model_cfg.init(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from '{}'", ckpt_manager.dir().display());

        Ok(Self { model, tokenizer, cfg, device })
    }

    fn settings(&self) -> DecodeSettings {
        DecodeSettings {
            beam_width: self.cfg.beam_size,
            max_len:    self.cfg.max_output_len,
            ..DecodeSettings::default()
        }
    }
}

impl DescriptionGenerator for Inferencer {
    fn describe(&self, tags: &str) -> Result<String> {
        let input = self.tokenizer.encode_fixed(tags, self.cfg.max_input_len)?;
        let ids   = self.model.generate_ids(&input, &self.settings(), &self.device)?;
        let text  = self.tokenizer.decode(&ids)?;

        tracing::debug!("Generated {} tokens for '{}'", ids.len(), tags);
        Ok(text)
    }
}
