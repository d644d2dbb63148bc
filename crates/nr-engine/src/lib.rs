pub mod config;
pub mod controller;
pub mod decode;
pub mod error;
pub mod generator;
pub mod postprocess;
pub mod truncate;

pub use config::{EngineConfig, GenerationOverrides, GenerationRequest, RetryConfig, SamplingConfig};
pub use controller::{Engine, GenerationController};
pub use decode::SequenceSampler;
pub use error::{EngineError, Result};
pub use generator::{ModelGenerator, RawGenerator};
pub use postprocess::{cut_trailing_sentence, prompt_replace, result_replace, truncate_at_stop_text};
pub use truncate::truncate_multiple_sequences;
