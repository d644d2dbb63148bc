use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::score::ScoreVector;

/// Picks the next token from a filtered score vector.
pub trait Selector {
    /// Returns the name of this selector.
    fn name(&self) -> &str;

    /// Select a token, or `None` when every entry is masked.
    fn select(&mut self, scores: &ScoreVector) -> Option<u32>;
}

/// Greedy selector: takes the single token with the highest score.
pub struct GreedySelector;

impl GreedySelector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GreedySelector {
    fn default() -> Self {
        Self::new()
    }
}

impl Selector for GreedySelector {
    fn name(&self) -> &str {
        "greedy"
    }

    fn select(&mut self, scores: &ScoreVector) -> Option<u32> {
        scores.argmax()
    }
}

/// Distribution-based selector: converts scores to probabilities via
/// softmax, then samples from the resulting distribution.
///
/// The RNG lives as long as the selector, so consecutive calls draw
/// different samples while a fixed seed keeps whole runs reproducible.
pub struct DistSelector {
    rng: StdRng,
}

impl DistSelector {
    /// Create a new distribution selector with the given seed for reproducibility.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a distribution selector seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Selector for DistSelector {
    fn name(&self) -> &str {
        "dist"
    }

    fn select(&mut self, scores: &ScoreVector) -> Option<u32> {
        let probs = scores.probabilities();
        match WeightedIndex::new(&probs) {
            Ok(dist) => Some(dist.sample(&mut self.rng) as u32),
            // Weights are all zero or not finite; fall back to the best score.
            Err(_) => scores.argmax(),
        }
    }
}
