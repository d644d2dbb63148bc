use std::collections::HashMap;
use std::path::Path;

use serde_json::json;
use tokenizers::Tokenizer as HfTokenizer;

use crate::error::{ModelError, Result};
use super::{clean_up_tokenization, Tokenizer, END_OF_TEXT};

/// Byte-level Byte-Pair Encoding tokenizer (GPT-2 family), backed by the
/// `tokenizers` crate.
pub struct BpeTokenizer {
    inner: HfTokenizer,
    eos_id: u32,
    vocab_size: usize,
    clean_up_spaces: bool,
}

impl BpeTokenizer {
    /// Load a `tokenizer.json`.
    pub fn from_file(path: &Path) -> Result<BpeTokenizer> {
        if !path.exists() {
            return Err(ModelError::MissingArtifact(path.to_path_buf()));
        }
        let inner = HfTokenizer::from_file(path).map_err(tokenizer_error)?;
        BpeTokenizer::from_hf(inner)
    }

    /// Load `vocab.json` and `merges.txt`.
    ///
    /// Both files must exist; a missing one is reported as
    /// [`ModelError::MissingArtifact`].
    pub fn from_files(vocab_path: &Path, merges_path: &Path) -> Result<BpeTokenizer> {
        for path in [vocab_path, merges_path] {
            if !path.exists() {
                return Err(ModelError::MissingArtifact(path.to_path_buf()));
            }
        }
        let vocab: HashMap<String, u32> =
            serde_json::from_str(&std::fs::read_to_string(vocab_path)?)?;
        let merges = parse_merges(&std::fs::read_to_string(merges_path)?)?;
        BpeTokenizer::from_vocab_and_merges(vocab, merges)
    }

    /// Load a model directory: `tokenizer.json` when present, otherwise
    /// `vocab.json` + `merges.txt`.
    pub fn from_dir(dir: &Path) -> Result<BpeTokenizer> {
        if !dir.is_dir() {
            return Err(ModelError::MissingArtifact(dir.to_path_buf()));
        }
        let tokenizer_json = dir.join("tokenizer.json");
        if tokenizer_json.exists() {
            return Self::from_file(&tokenizer_json);
        }
        Self::from_files(&dir.join("vocab.json"), &dir.join("merges.txt"))
    }

    /// Build a GPT-2 style tokenizer from a vocabulary and ordered merge
    /// rules. Earlier merges have higher priority. The vocabulary must
    /// contain the end-of-text token.
    pub fn from_vocab_and_merges(
        vocab: HashMap<String, u32>,
        merges: Vec<(String, String)>,
    ) -> Result<BpeTokenizer> {
        let eos_id = *vocab
            .get(END_OF_TEXT)
            .ok_or_else(|| ModelError::MissingToken(END_OF_TEXT.to_string()))?;

        let byte_level = json!({
            "type": "ByteLevel",
            "add_prefix_space": false,
            "trim_offsets": true,
            "use_regex": true,
        });
        let merges: Vec<String> = merges
            .into_iter()
            .map(|(left, right)| format!("{left} {right}"))
            .collect();
        let document = json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [{
                "id": eos_id,
                "content": END_OF_TEXT,
                "single_word": false,
                "lstrip": false,
                "rstrip": false,
                "normalized": false,
                "special": true,
            }],
            "normalizer": null,
            "pre_tokenizer": byte_level,
            "post_processor": null,
            "decoder": byte_level,
            "model": {
                "type": "BPE",
                "dropout": null,
                "unk_token": null,
                "continuing_subword_prefix": null,
                "end_of_word_suffix": null,
                "fuse_unk": false,
                "byte_fallback": false,
                "vocab": vocab,
                "merges": merges,
            },
        });

        let inner = HfTokenizer::from_bytes(serde_json::to_vec(&document)?)
            .map_err(tokenizer_error)?;
        BpeTokenizer::from_hf(inner)
    }

    /// The 256 byte-level base tokens (token ID == byte value) followed by
    /// the end-of-text token at ID 256, with no merges.
    pub fn byte_level() -> Result<BpeTokenizer> {
        let mut vocab: HashMap<String, u32> = bytes_to_unicode()
            .iter()
            .enumerate()
            .map(|(byte, ch)| (ch.to_string(), byte as u32))
            .collect();
        vocab.insert(END_OF_TEXT.to_string(), 256);
        BpeTokenizer::from_vocab_and_merges(vocab, Vec::new())
    }

    fn from_hf(inner: HfTokenizer) -> Result<BpeTokenizer> {
        let eos_id = inner
            .token_to_id(END_OF_TEXT)
            .ok_or_else(|| ModelError::MissingToken(END_OF_TEXT.to_string()))?;
        let vocab_size = inner
            .get_vocab(true)
            .values()
            .max()
            .map_or(0, |&id| id as usize + 1);

        Ok(BpeTokenizer {
            inner,
            eos_id,
            vocab_size,
            clean_up_spaces: true,
        })
    }

    /// Toggle removal of spaces before punctuation on decode (on by default).
    pub fn with_clean_up_spaces(mut self, clean_up_spaces: bool) -> Self {
        self.clean_up_spaces = clean_up_spaces;
        self
    }
}

fn tokenizer_error(err: tokenizers::Error) -> ModelError {
    ModelError::TokenizerError(err.to_string())
}

/// The byte to character table used by GPT-2 style vocabularies: printable
/// Latin-1 bytes map to themselves, every other byte to a code point from
/// U+0100 upwards in byte order.
fn bytes_to_unicode() -> [char; 256] {
    let mut table = ['\0'; 256];
    let mut shifted = 0u32;
    for byte in 0..=255u8 {
        let printable = matches!(byte, b'!'..=b'~' | 0xA1..=0xAC | 0xAE..=0xFF);
        table[byte as usize] = if printable {
            char::from(byte)
        } else {
            let ch = char::from_u32(256 + shifted).unwrap_or(char::REPLACEMENT_CHARACTER);
            shifted += 1;
            ch
        };
    }
    table
}

/// Parse `merges.txt`: one `left right` pair per line. Blank lines and
/// `#version` headers are skipped.
pub fn parse_merges(text: &str) -> Result<Vec<(String, String)>> {
    let mut merges = Vec::new();
    for line in text.lines() {
        if line.is_empty() || line.starts_with("#version") {
            continue;
        }
        let mut parts = line.splitn(2, ' ');
        match (parts.next(), parts.next()) {
            (Some(left), Some(right)) if !left.is_empty() && !right.is_empty() => {
                merges.push((left.to_string(), right.to_string()));
            }
            _ => {
                return Err(ModelError::TokenizerError(format!(
                    "invalid merge entry: {:?}",
                    line
                )))
            }
        }
    }
    Ok(merges)
}

impl Tokenizer for BpeTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self.inner.encode(text, false).map_err(tokenizer_error)?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, tokens: &[u32], skip_special: bool) -> Result<String> {
        let text = self
            .inner
            .decode(tokens, skip_special)
            .map_err(tokenizer_error)?;
        if self.clean_up_spaces {
            Ok(clean_up_tokenization(&text))
        } else {
            Ok(text)
        }
    }

    fn token_id(&self, token: &str) -> Option<u32> {
        self.inner.token_to_id(token)
    }

    fn eos_id(&self) -> u32 {
        self.eos_id
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }
}
