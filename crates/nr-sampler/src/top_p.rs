use crate::sampler::Sampler;
use crate::score::ScoreVector;

/// Nucleus sampling: keeps the smallest set of tokens whose cumulative
/// probability exceeds the threshold `p`.
///
/// The token that crosses the threshold is kept, so at least one token
/// always survives.
pub struct TopPSampler {
    p: f32,
}

impl TopPSampler {
    /// Create a new top-p (nucleus) sampler with the given probability threshold.
    /// `p <= 0.0` disables the filter and `p >= 1.0` keeps every token.
    pub fn new(p: f32) -> Self {
        Self { p }
    }
}

impl Sampler for TopPSampler {
    fn name(&self) -> &str {
        "top_p"
    }

    fn apply(&self, mut scores: ScoreVector, _generated: &[u32]) -> ScoreVector {
        if self.p <= 0.0 || self.p >= 1.0 {
            return scores;
        }

        let ranked = scores.ranked();
        if ranked.is_empty() {
            return scores;
        }
        let probs = scores.probabilities();

        // Find the cutoff index: keep tokens until cumulative probability exceeds p.
        let mut cumulative = 0.0f32;
        let mut cutoff = ranked.len();
        for (i, &token_id) in ranked.iter().enumerate() {
            cumulative += probs[token_id];
            if cumulative > self.p {
                cutoff = i + 1;
                break;
            }
        }

        for &token_id in &ranked[cutoff..] {
            scores.mask(token_id);
        }
        scores
    }
}
