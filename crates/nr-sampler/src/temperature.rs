use crate::sampler::Sampler;
use crate::score::ScoreVector;

/// Scales all scores by dividing by a temperature value.
///
/// Higher temperatures produce more uniform distributions (more random),
/// while lower temperatures sharpen the distribution (more deterministic).
/// A temperature of zero or below leaves the scores untouched; selection is
/// then greedy and scaling would not change the arg-max.
pub struct TemperatureSampler {
    temperature: f32,
}

impl TemperatureSampler {
    /// Create a new temperature sampler with the given temperature.
    pub fn new(temperature: f32) -> Self {
        Self { temperature }
    }
}

impl Sampler for TemperatureSampler {
    fn name(&self) -> &str {
        "temperature"
    }

    fn apply(&self, mut scores: ScoreVector, _generated: &[u32]) -> ScoreVector {
        if self.temperature <= 0.0 {
            return scores;
        }

        for score in scores.values_mut() {
            *score /= self.temperature;
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scales_by_inverse_temperature() {
        let out = TemperatureSampler::new(0.5).apply(ScoreVector::new(vec![1.0, -2.0]), &[]);
        assert_relative_eq!(out[0], 2.0);
        assert_relative_eq!(out[1], -4.0);
    }

    #[test]
    fn test_zero_temperature_is_identity() {
        let scores = ScoreVector::new(vec![1.5, 0.25]);
        assert_eq!(TemperatureSampler::new(0.0).apply(scores.clone(), &[]), scores);
    }

    #[test]
    fn test_masked_stays_masked() {
        let mut scores = ScoreVector::new(vec![1.0, 1.0]);
        scores.mask(1);
        let out = TemperatureSampler::new(0.7).apply(scores, &[]);
        assert!(out.is_masked(1));
    }
}
