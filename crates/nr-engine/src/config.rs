//! Engine configuration and per-call overrides.
//!
//! `EngineConfig` is loaded once (from TOML or built in code) and handed to
//! the engine at construction. `GenerationOverrides` carries per-call
//! changes; unset fields keep the configured defaults.

use std::path::Path;

use nr_model::END_OF_TEXT;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default sampling parameters for every call.
    pub sampling: SamplingConfig,

    /// Empty-output retry policy.
    pub retry: RetryConfig,

    /// Total tokens the model can attend to. The history budget of a call is
    /// this minus the number of tokens to generate.
    pub context_window: usize,

    /// Seed for the sampling RNG. `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            retry: RetryConfig::default(),
            context_window: 1024,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.sampling.validate()?;
        if self.sampling.generate_num >= self.context_window {
            return Err(EngineError::InvalidConfig(format!(
                "generate_num ({}) must be smaller than context_window ({})",
                self.sampling.generate_num, self.context_window
            )));
        }
        Ok(())
    }

    /// Tokens of prompt history that fit next to `generate_num` new tokens.
    pub fn max_history_tokens(&self, generate_num: usize) -> usize {
        self.context_window.saturating_sub(generate_num)
    }
}

/// Text-level sampling settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Maximum number of new tokens per call.
    pub generate_num: usize,

    /// Sampling temperature (0.0 = greedy).
    pub temperature: f32,

    /// Keep only the K highest-scoring tokens (0 = disabled).
    pub top_k: usize,

    /// Nucleus threshold (0.0 = disabled).
    pub top_p: f32,

    /// Divisor for scores of tokens already in the sequence (1.0 = none).
    pub repetition_penalty: f32,

    /// Texts that end generation. Each must be a single vocabulary token to
    /// stop decoding; all of them also cut the decoded text.
    pub stop_sequences: Vec<String>,

    /// Stop tokens only count once more than this many steps have run.
    pub min_stop_steps: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            generate_num: 60,
            temperature: 0.4,
            top_k: 40,
            top_p: 0.9,
            repetition_penalty: 1.0,
            stop_sequences: vec![END_OF_TEXT.to_string(), ">".to_string()],
            min_stop_steps: 4,
        }
    }
}

impl SamplingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.generate_num == 0 {
            return Err(EngineError::InvalidConfig(
                "generate_num must be at least 1".to_string(),
            ));
        }
        if !(self.temperature.is_finite() && self.temperature >= 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "temperature must be finite and non-negative, got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(EngineError::InvalidConfig(format!(
                "top_p must be within [0, 1], got {}",
                self.top_p
            )));
        }
        if !(self.repetition_penalty.is_finite() && self.repetition_penalty > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "repetition_penalty must be finite and positive, got {}",
                self.repetition_penalty
            )));
        }
        Ok(())
    }

    /// These settings with every field set in `overrides` replaced.
    pub fn with_overrides(&self, overrides: &GenerationOverrides) -> SamplingConfig {
        SamplingConfig {
            generate_num: overrides.generate_num.unwrap_or(self.generate_num),
            temperature: overrides.temperature.unwrap_or(self.temperature),
            top_k: overrides.top_k.unwrap_or(self.top_k),
            top_p: overrides.top_p.unwrap_or(self.top_p),
            repetition_penalty: overrides
                .repetition_penalty
                .unwrap_or(self.repetition_penalty),
            stop_sequences: overrides
                .stop_sequences
                .clone()
                .unwrap_or_else(|| self.stop_sequences.clone()),
            min_stop_steps: overrides.min_stop_steps.unwrap_or(self.min_stop_steps),
        }
    }
}

/// Bounds of the empty-output retry loop.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt before giving up with empty output.
    pub max_depth: usize,

    /// Past this depth, text ending at an action marker is accepted.
    pub allow_action_after: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_depth: 20,
            allow_action_after: 6,
        }
    }
}

/// Per-call overrides for text generation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GenerationOverrides {
    pub generate_num: Option<usize>,
    pub temperature: Option<f32>,
    pub top_k: Option<usize>,
    pub top_p: Option<f32>,
    pub repetition_penalty: Option<f32>,
    pub stop_sequences: Option<Vec<String>>,
    pub min_stop_steps: Option<usize>,
}

impl GenerationOverrides {
    /// Overrides for deterministic arg-max decoding.
    pub fn greedy() -> Self {
        Self {
            temperature: Some(0.0),
            ..Default::default()
        }
    }

    /// Check if any overrides are set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Token-level parameters of one decode call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub max_new_tokens: usize,
    pub temperature: f32,
    pub top_k: usize,
    pub top_p: f32,
    pub repetition_penalty: f32,
    pub stop_tokens: Vec<u32>,
    pub min_stop_steps: usize,
}

impl GenerationRequest {
    pub fn from_sampling(sampling: &SamplingConfig, stop_tokens: Vec<u32>) -> Self {
        Self {
            max_new_tokens: sampling.generate_num,
            temperature: sampling.temperature,
            top_k: sampling.top_k,
            top_p: sampling.top_p,
            repetition_penalty: sampling.repetition_penalty,
            stop_tokens,
            min_stop_steps: sampling.min_stop_steps,
        }
    }
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self::from_sampling(&SamplingConfig::default(), Vec::new())
    }
}
