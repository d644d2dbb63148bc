use std::ops::Index;

/// Dense next-token scores, one entry per vocabulary token.
///
/// Filtering never removes entries: a disallowed token keeps its slot and
/// holds [`ScoreVector::MASKED`], so token ids always equal indices.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreVector(Vec<f32>);

impl ScoreVector {
    /// Sentinel for a token that can never be selected.
    pub const MASKED: f32 = f32::NEG_INFINITY;

    pub fn new(scores: Vec<f32>) -> Self {
        Self(scores)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f32] {
        &mut self.0
    }

    /// Make `token_id` unselectable. Out-of-range ids are ignored.
    pub fn mask(&mut self, token_id: usize) {
        if let Some(score) = self.0.get_mut(token_id) {
            *score = Self::MASKED;
        }
    }

    pub fn is_masked(&self, token_id: usize) -> bool {
        self.0
            .get(token_id)
            .map_or(true, |&score| score == Self::MASKED)
    }

    /// Number of tokens that are still selectable.
    pub fn unmasked_count(&self) -> usize {
        self.0.iter().filter(|&&score| score != Self::MASKED).count()
    }

    /// Indices of unmasked tokens ordered by descending score. NaN entries
    /// are never ranked.
    ///
    /// The sort is stable, so equal scores keep ascending token-id order.
    pub fn ranked(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = (0..self.0.len())
            .filter(|&i| self.0[i] != Self::MASKED && !self.0[i].is_nan())
            .collect();
        ids.sort_by(|&a, &b| self.0[b].total_cmp(&self.0[a]));
        ids
    }

    /// Softmax over the unmasked entries. Masked entries get probability 0.
    ///
    /// Returns all zeros when nothing is selectable.
    pub fn probabilities(&self) -> Vec<f32> {
        let max_score = self
            .0
            .iter()
            .copied()
            .filter(|s| s.is_finite())
            .fold(f32::NEG_INFINITY, f32::max);

        if !max_score.is_finite() {
            return vec![0.0; self.0.len()];
        }

        let exps: Vec<f32> = self
            .0
            .iter()
            .map(|&s| if s.is_finite() { (s - max_score).exp() } else { 0.0 })
            .collect();
        let sum: f32 = exps.iter().sum();
        exps.iter().map(|e| e / sum).collect()
    }

    /// Highest-scoring unmasked token. The lowest id wins a tie.
    pub fn argmax(&self) -> Option<u32> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &score) in self.0.iter().enumerate() {
            if score == Self::MASKED || score.is_nan() {
                continue;
            }
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((i, score)),
            }
        }
        best.map(|(i, _)| i as u32)
    }
}

impl From<Vec<f32>> for ScoreVector {
    fn from(scores: Vec<f32>) -> Self {
        Self::new(scores)
    }
}

impl Index<usize> for ScoreVector {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ranked_is_stable_on_ties() {
        let scores = ScoreVector::new(vec![1.0, 3.0, 1.0, 3.0]);
        assert_eq!(scores.ranked(), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_ranked_skips_nan() {
        let raw: Vec<f32> = (0..64)
            .map(|i| if i % 5 == 0 { f32::NAN } else { (i % 7) as f32 })
            .collect();
        let ranked = ScoreVector::new(raw.clone()).ranked();
        assert_eq!(ranked.len(), 64 - 13);
        assert!(ranked.iter().all(|&i| !raw[i].is_nan()));
        assert!(ranked.windows(2).all(|w| raw[w[0]] >= raw[w[1]]));
    }

    #[test]
    fn test_ranked_skips_masked() {
        let mut scores = ScoreVector::new(vec![1.0, 3.0, 2.0]);
        scores.mask(1);
        assert_eq!(scores.ranked(), vec![2, 0]);
        assert_eq!(scores.unmasked_count(), 2);
    }

    #[test]
    fn test_probabilities_ignore_masked() {
        let mut scores = ScoreVector::new(vec![0.0, 0.0, 5.0]);
        scores.mask(2);
        let probs = scores.probabilities();
        assert_relative_eq!(probs[0], 0.5, epsilon = 1e-6);
        assert_relative_eq!(probs[1], 0.5, epsilon = 1e-6);
        assert_eq!(probs[2], 0.0);
    }

    #[test]
    fn test_probabilities_all_masked() {
        let scores = ScoreVector::new(vec![ScoreVector::MASKED; 3]);
        assert_eq!(scores.probabilities(), vec![0.0; 3]);
        assert_eq!(scores.argmax(), None);
    }

    #[test]
    fn test_argmax_prefers_lowest_id_on_tie() {
        let scores = ScoreVector::new(vec![0.5, 2.0, 2.0, -1.0]);
        assert_eq!(scores.argmax(), Some(1));
    }

    #[test]
    fn test_mask_out_of_range_is_ignored() {
        let mut scores = ScoreVector::new(vec![1.0]);
        scores.mask(5);
        assert_eq!(scores.as_slice(), &[1.0]);
        assert!(scores.is_masked(5));
    }
}
