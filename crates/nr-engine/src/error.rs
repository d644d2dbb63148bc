use nr_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("cannot sample from an empty context")]
    EmptyContext,
    #[error("score vector has {got} entries, expected {expected}")]
    ScoreLength { expected: usize, got: usize },
    #[error("score for token {token} at step {step} is {score}")]
    InvalidScore { step: usize, token: usize, score: f32 },
    #[error("no selectable token at step {step}")]
    NoCandidate { step: usize },
}

pub type Result<T> = std::result::Result<T, EngineError>;
