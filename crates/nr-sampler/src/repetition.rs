use std::collections::HashSet;

use crate::sampler::Sampler;
use crate::score::ScoreVector;

/// Applies a repetition penalty to tokens that already occur in the sequence.
///
/// Every distinct token of the sequence has its score divided by `penalty`
/// once, however often it appears. A penalty above 1.0 dampens repeats
/// without excluding them; 1.0 leaves the scores untouched.
pub struct RepetitionPenaltySampler {
    penalty: f32,
}

impl RepetitionPenaltySampler {
    /// Create a new repetition penalty sampler (1.0 = no penalty).
    pub fn new(penalty: f32) -> Self {
        Self { penalty }
    }
}

impl Sampler for RepetitionPenaltySampler {
    fn name(&self) -> &str {
        "repetition_penalty"
    }

    fn apply(&self, scores: ScoreVector, generated: &[u32]) -> ScoreVector {
        apply_repetition_penalty(scores, generated, self.penalty)
    }
}

/// Divide the score of each distinct token in `generated` by `penalty`.
/// Ids outside the vocabulary are ignored.
pub fn apply_repetition_penalty(
    mut scores: ScoreVector,
    generated: &[u32],
    penalty: f32,
) -> ScoreVector {
    if penalty == 1.0 {
        return scores;
    }

    let mut seen = HashSet::with_capacity(generated.len());
    let values = scores.values_mut();
    for &token_id in generated {
        if !seen.insert(token_id) {
            continue;
        }
        if let Some(score) = values.get_mut(token_id as usize) {
            *score /= penalty;
        }
    }
    scores
}
