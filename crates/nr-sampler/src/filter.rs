use crate::sampler::Sampler;
use crate::score::ScoreVector;
use crate::top_k::TopKSampler;
use crate::top_p::TopPSampler;

/// Top-k followed by nucleus filtering over a dense score vector.
pub struct DistributionFilter {
    top_k: TopKSampler,
    top_p: TopPSampler,
}

impl DistributionFilter {
    pub fn new(top_k: usize, top_p: f32) -> Self {
        Self {
            top_k: TopKSampler::new(top_k),
            top_p: TopPSampler::new(top_p),
        }
    }
}

impl Sampler for DistributionFilter {
    fn name(&self) -> &str {
        "top_k_top_p"
    }

    fn apply(&self, scores: ScoreVector, generated: &[u32]) -> ScoreVector {
        let scores = self.top_k.apply(scores, generated);
        self.top_p.apply(scores, generated)
    }
}

/// Mask every token outside the top-k / top-p candidate set.
pub fn filter(scores: ScoreVector, top_k: usize, top_p: f32) -> ScoreVector {
    DistributionFilter::new(top_k, top_p).apply(scores, &[])
}
