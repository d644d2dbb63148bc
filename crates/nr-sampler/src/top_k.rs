use crate::sampler::Sampler;
use crate::score::ScoreVector;

/// Keeps only the top K tokens by score, masking the rest.
pub struct TopKSampler {
    k: usize,
}

impl TopKSampler {
    /// Create a new top-K sampler that retains the `k` highest-scoring tokens.
    /// `k == 0` disables the filter.
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl Sampler for TopKSampler {
    fn name(&self) -> &str {
        "top_k"
    }

    fn apply(&self, mut scores: ScoreVector, _generated: &[u32]) -> ScoreVector {
        if self.k == 0 {
            return scores;
        }

        let ranked = scores.ranked();
        if self.k >= ranked.len() {
            return scores;
        }

        for &token_id in &ranked[self.k..] {
            scores.mask(token_id);
        }
        scores
    }
}
