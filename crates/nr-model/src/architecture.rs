/// A model that scores every vocabulary token as the continuation of a
/// token sequence.
///
/// Scoring is incremental. The first call receives the whole context and no
/// cache; every later call receives only the tokens appended since the
/// previous call together with the cache that call returned. The cache is
/// opaque to callers: they move it forward or drop it, never inspect it.
pub trait ScoringModel {
    /// Model-owned incremental state, e.g. attention keys and values.
    type Cache;

    /// Score the next token.
    ///
    /// Returns one score per vocabulary token (pre-softmax logits) and the
    /// cache covering everything scored so far.
    ///
    /// - `tokens`: the full context when `cache` is `None`, otherwise only the
    ///   newly appended tokens.
    /// - `cache`: state returned by the previous call of this generation.
    fn score(
        &mut self,
        tokens: &[u32],
        cache: Option<Self::Cache>,
    ) -> crate::Result<(Vec<f32>, Self::Cache)>;

    /// Returns the vocabulary size (number of output scores).
    fn vocab_size(&self) -> usize;
}
