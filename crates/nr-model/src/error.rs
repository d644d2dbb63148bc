use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing model artifact: {}", .0.display())]
    MissingArtifact(PathBuf),
    #[error("missing special token: {0}")]
    MissingToken(String),
    #[error("tokenizer error: {0}")]
    TokenizerError(String),
    #[error("no tokens to score")]
    EmptyInput,
    #[error("token {token} out of range for vocabulary of {vocab_size}")]
    TokenOutOfRange { token: u32, vocab_size: usize },
    #[error("context length {len} exceeds maximum {max}")]
    ContextOverflow { len: usize, max: usize },
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
