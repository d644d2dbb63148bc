//! Incremental decode loop.

use nr_model::ScoringModel;
use nr_sampler::{
    DistSelector, DistributionFilter, GreedySelector, RepetitionPenaltySampler, SamplerChain,
    ScoreVector, Selector, TemperatureSampler,
};
use tracing::{info, trace};

use crate::config::GenerationRequest;
use crate::error::{EngineError, Result};

/// Runs the token-by-token generation loop against a scoring model.
///
/// The model's cache is created on the first step, moved through every
/// following step and dropped when [`SequenceSampler::sample`] returns.
pub struct SequenceSampler<'a, M: ScoringModel> {
    model: &'a mut M,
    dist: &'a mut DistSelector,
}

impl<'a, M: ScoringModel> SequenceSampler<'a, M> {
    /// `dist` is used whenever the request's temperature is above zero.
    pub fn new(model: &'a mut M, dist: &'a mut DistSelector) -> Self {
        Self { model, dist }
    }

    /// Generate up to `request.max_new_tokens` tokens after `context`.
    ///
    /// Returns the context followed by the generated tokens. Decoding stops
    /// early when a stop token is selected after more than
    /// `request.min_stop_steps` steps; that token is the last one returned.
    pub fn sample(&mut self, context: &[u32], request: &GenerationRequest) -> Result<Vec<u32>> {
        if context.is_empty() {
            return Err(EngineError::EmptyContext);
        }

        let vocab_size = self.model.vocab_size();
        let stages = SamplerChain::new()
            .with(Box::new(TemperatureSampler::new(request.temperature)))
            .with(Box::new(RepetitionPenaltySampler::new(request.repetition_penalty)))
            .with(Box::new(DistributionFilter::new(request.top_k, request.top_p)));
        let greedy = request.temperature <= 0.0;

        let mut sequence = context.to_vec();
        let mut cache: Option<M::Cache> = None;

        for step in 0..request.max_new_tokens {
            let input = if cache.is_some() {
                &sequence[sequence.len() - 1..]
            } else {
                &sequence[..]
            };
            let (raw, next_cache) = self.model.score(input, cache.take())?;
            cache = Some(next_cache);

            if raw.len() != vocab_size {
                return Err(EngineError::ScoreLength {
                    expected: vocab_size,
                    got: raw.len(),
                });
            }
            // -inf is a valid mask; NaN and +inf break ranking and softmax.
            if let Some((token, &score)) = raw
                .iter()
                .enumerate()
                .find(|(_, s)| s.is_nan() || **s == f32::INFINITY)
            {
                return Err(EngineError::InvalidScore { step, token, score });
            }

            let scores = stages.process(ScoreVector::new(raw), &sequence);
            let selected = if greedy {
                GreedySelector::new().select(&scores)
            } else {
                self.dist.select(&scores)
            };
            let token = selected.ok_or(EngineError::NoCandidate { step })?;
            sequence.push(token);
            trace!(step, token, "selected token");

            if !request.stop_tokens.is_empty()
                && step > request.min_stop_steps
                && request.stop_tokens.contains(&token)
            {
                info!(
                    step,
                    token,
                    stop_tokens = ?request.stop_tokens,
                    "stopping generation on stop token"
                );
                break;
            }
        }

        Ok(sequence)
    }
}
