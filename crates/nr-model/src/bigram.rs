use std::collections::HashMap;

use crate::architecture::ScoringModel;
use crate::error::{ModelError, Result};

/// Add-k smoothed bigram scorer.
///
/// Small enough to train from a handful of token sequences, which makes it
/// useful as a reference model and for exercising the decode loop end to end.
/// Scores are log-probabilities of the next token given the last one.
pub struct BigramModel {
    vocab_size: usize,
    max_seq_len: usize,
    smoothing: f32,
    /// counts[prev][next]
    counts: HashMap<u32, HashMap<u32, u32>>,
    /// Row sums of `counts`.
    totals: HashMap<u32, u32>,
}

/// Incremental state for [`BigramModel`]: how many tokens have been scored.
#[derive(Debug, Clone)]
pub struct BigramCache {
    len: usize,
}

impl BigramModel {
    /// Create an untrained model. Until sequences are observed every token
    /// scores the same.
    pub fn new(vocab_size: usize, max_seq_len: usize) -> Self {
        Self {
            vocab_size,
            max_seq_len,
            smoothing: 1.0,
            counts: HashMap::new(),
            totals: HashMap::new(),
        }
    }

    /// Set the add-k smoothing constant. Zero makes unseen bigrams unselectable.
    pub fn with_smoothing(mut self, smoothing: f32) -> Result<Self> {
        if !(smoothing >= 0.0 && smoothing.is_finite()) {
            return Err(ModelError::Other(format!(
                "smoothing must be finite and non-negative, got {}",
                smoothing
            )));
        }
        self.smoothing = smoothing;
        Ok(self)
    }

    /// Build a model from a corpus of token sequences.
    pub fn train<'a, I>(vocab_size: usize, max_seq_len: usize, corpus: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [u32]>,
    {
        let mut model = Self::new(vocab_size, max_seq_len);
        for sequence in corpus {
            model.observe(sequence)?;
        }
        Ok(model)
    }

    /// Count every adjacent pair of `sequence`.
    pub fn observe(&mut self, sequence: &[u32]) -> Result<()> {
        self.check_tokens(sequence)?;
        for pair in sequence.windows(2) {
            *self
                .counts
                .entry(pair[0])
                .or_default()
                .entry(pair[1])
                .or_insert(0) += 1;
            *self.totals.entry(pair[0]).or_insert(0) += 1;
        }
        Ok(())
    }

    fn check_tokens(&self, tokens: &[u32]) -> Result<()> {
        match tokens.iter().find(|&&t| t as usize >= self.vocab_size) {
            Some(&token) => Err(ModelError::TokenOutOfRange {
                token,
                vocab_size: self.vocab_size,
            }),
            None => Ok(()),
        }
    }

    fn scores_after(&self, prev: u32) -> Vec<f32> {
        let total = self.totals.get(&prev).copied().unwrap_or(0) as f32;
        let denom = total + self.smoothing * self.vocab_size as f32;
        if denom <= 0.0 {
            return vec![0.0; self.vocab_size];
        }

        let row = self.counts.get(&prev);
        (0..self.vocab_size as u32)
            .map(|next| {
                let count = row.and_then(|r| r.get(&next)).copied().unwrap_or(0) as f32;
                ((count + self.smoothing) / denom).ln()
            })
            .collect()
    }
}

impl ScoringModel for BigramModel {
    type Cache = BigramCache;

    fn score(
        &mut self,
        tokens: &[u32],
        cache: Option<BigramCache>,
    ) -> Result<(Vec<f32>, BigramCache)> {
        let last = *tokens.last().ok_or(ModelError::EmptyInput)?;
        self.check_tokens(tokens)?;

        let len = cache.map_or(0, |c| c.len) + tokens.len();
        if len > self.max_seq_len {
            return Err(ModelError::ContextOverflow {
                len,
                max: self.max_seq_len,
            });
        }

        Ok((self.scores_after(last), BigramCache { len }))
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }
}
