use nr_model::{ScoringModel, Tokenizer};
use nr_sampler::DistSelector;
use tracing::{debug, warn};

use crate::config::{EngineConfig, GenerationRequest, SamplingConfig};
use crate::decode::SequenceSampler;
use crate::error::{EngineError, Result};
use crate::postprocess::truncate_at_stop_text;
use crate::truncate::truncate_multiple_sequences;

/// Produces the raw continuation text for a list of prompt segments.
///
/// This is the seam between the retry controller and the token-level
/// machinery; the controller only ever sees text.
pub trait RawGenerator {
    fn generate_raw(&mut self, prompt: &[String], settings: &SamplingConfig) -> Result<String>;
}

/// Generates text with a scoring model and its tokenizer.
///
/// Owns the model exclusively, so at most one generation per model instance
/// is in flight at a time.
pub struct ModelGenerator<M: ScoringModel, T: Tokenizer> {
    model: M,
    tokenizer: T,
    context_window: usize,
    dist: DistSelector,
}

impl<M: ScoringModel, T: Tokenizer> ModelGenerator<M, T> {
    pub fn new(model: M, tokenizer: T, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        if model.vocab_size() < tokenizer.vocab_size() {
            return Err(EngineError::InvalidConfig(format!(
                "model scores {} tokens but the tokenizer has {}",
                model.vocab_size(),
                tokenizer.vocab_size()
            )));
        }

        let dist = match config.seed {
            Some(seed) => DistSelector::seeded(seed),
            None => DistSelector::from_entropy(),
        };

        Ok(Self {
            model,
            tokenizer,
            context_window: config.context_window,
            dist,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Token ids for the stop sequences that are single vocabulary tokens.
    pub fn stop_tokens(&self, stop_sequences: &[String]) -> Vec<u32> {
        let mut ids = Vec::with_capacity(stop_sequences.len());
        for stop in stop_sequences {
            if let Some(id) = self.tokenizer.token_id(stop) {
                ids.push(id);
                continue;
            }
            match self.tokenizer.encode(stop).as_deref() {
                Ok([id]) => ids.push(*id),
                _ => warn!(stop = %stop, "stop sequence is not a single token; only cuts decoded text"),
            }
        }
        ids
    }

    /// Encode each segment, fit them jointly into `max_history` tokens and
    /// join them in order.
    pub fn encode_prompt(&self, prompt: &[String], max_history: usize) -> Result<Vec<u32>> {
        let mut segments = prompt
            .iter()
            .map(|segment| self.tokenizer.encode_truncated(segment, max_history))
            .collect::<nr_model::Result<Vec<_>>>()?;
        truncate_multiple_sequences(&mut segments, max_history);
        Ok(segments.concat())
    }
}

impl<M: ScoringModel, T: Tokenizer> RawGenerator for ModelGenerator<M, T> {
    fn generate_raw(&mut self, prompt: &[String], settings: &SamplingConfig) -> Result<String> {
        if settings.generate_num >= self.context_window {
            return Err(EngineError::InvalidConfig(format!(
                "generate_num ({}) must be smaller than context_window ({})",
                settings.generate_num, self.context_window
            )));
        }
        let max_history = self.context_window - settings.generate_num;
        let mut context = self.encode_prompt(prompt, max_history)?;
        if context.is_empty() {
            context.push(self.tokenizer.eos_id());
        }
        debug!(
            tokens = context.len(),
            text = %self.tokenizer.decode(&context, true)?,
            "text passing into model"
        );

        let request =
            GenerationRequest::from_sampling(settings, self.stop_tokens(&settings.stop_sequences));
        let sequence = SequenceSampler::new(&mut self.model, &mut self.dist).sample(&context, &request)?;

        let text = self.tokenizer.decode(&sequence[context.len()..], true)?;
        Ok(truncate_at_stop_text(&text, &settings.stop_sequences).to_string())
    }
}
