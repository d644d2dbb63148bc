use crate::score::ScoreVector;

/// A stage that reshapes a score vector before a token is selected.
///
/// Stages consume the vector and return the adjusted one, so no two stages
/// ever hold the same buffer.
pub trait Sampler: Send + Sync {
    /// Returns the name of this sampler.
    fn name(&self) -> &str;

    /// Adjust `scores` given the tokens of the sequence so far.
    fn apply(&self, scores: ScoreVector, generated: &[u32]) -> ScoreVector;
}

/// Composes multiple samplers into a pipeline, applied in insertion order.
pub struct SamplerChain {
    samplers: Vec<Box<dyn Sampler>>,
}

impl SamplerChain {
    /// Create a new empty sampler chain.
    pub fn new() -> Self {
        Self {
            samplers: Vec::new(),
        }
    }

    /// Add a sampler to the end of the chain. Returns self for builder-style usage.
    pub fn with(mut self, sampler: Box<dyn Sampler>) -> Self {
        self.samplers.push(sampler);
        self
    }

    /// Names of the stages, in application order.
    pub fn names(&self) -> Vec<&str> {
        self.samplers.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order over `scores`.
    pub fn process(&self, scores: ScoreVector, generated: &[u32]) -> ScoreVector {
        self.samplers
            .iter()
            .fold(scores, |scores, sampler| sampler.apply(scores, generated))
    }
}

impl Default for SamplerChain {
    fn default() -> Self {
        Self::new()
    }
}
