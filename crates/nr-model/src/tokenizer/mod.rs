pub mod bpe;

pub use bpe::BpeTokenizer;

use crate::error::Result;

/// Text form of the end-of-text control token.
pub const END_OF_TEXT: &str = "<|endoftext|>";

/// Converts between text and token ids.
pub trait Tokenizer {
    /// Encode text into token ids. Special-token literals found in the text
    /// map to their ids.
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    /// Encode text, keeping at most the last `max_len` tokens.
    fn encode_truncated(&self, text: &str, max_len: usize) -> Result<Vec<u32>> {
        let mut ids = self.encode(text)?;
        if ids.len() > max_len {
            ids.drain(..ids.len() - max_len);
        }
        Ok(ids)
    }

    /// Decode token ids into text. With `skip_special`, control tokens such
    /// as end-of-text produce no output.
    fn decode(&self, tokens: &[u32], skip_special: bool) -> Result<String>;

    /// Id of the vocabulary entry `token`, in the vocabulary's own spelling.
    fn token_id(&self, token: &str) -> Option<u32>;

    /// Returns the end-of-text token ID.
    fn eos_id(&self) -> u32;

    /// Number of tokens in the vocabulary.
    fn vocab_size(&self) -> usize;
}

/// Remove the spaces a word-piece decode leaves before punctuation and
/// English contractions.
pub fn clean_up_tokenization(text: &str) -> String {
    text.replace(" .", ".")
        .replace(" ?", "?")
        .replace(" !", "!")
        .replace(" ,", ",")
        .replace(" ' ", "'")
        .replace(" n't", "n't")
        .replace(" 'm", "'m")
        .replace(" 's", "'s")
        .replace(" 've", "'ve")
        .replace(" 're", "'re")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_up_tokenization() {
        assert_eq!(
            clean_up_tokenization("I do n't know , he 's here ."),
            "I don't know, he's here."
        );
    }
}
