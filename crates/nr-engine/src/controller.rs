use nr_model::{ScoringModel, Tokenizer};
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, GenerationOverrides};
use crate::error::Result;
use crate::generator::{ModelGenerator, RawGenerator};
use crate::postprocess::{prompt_replace, result_replace};

/// Story text generation backed by a scoring model.
pub type Engine<M, T> = GenerationController<ModelGenerator<M, T>>;

impl<M: ScoringModel, T: Tokenizer> Engine<M, T> {
    pub fn with_model(model: M, tokenizer: T, config: EngineConfig) -> Result<Self> {
        let generator = ModelGenerator::new(model, tokenizer, &config)?;
        GenerationController::new(generator, config)
    }
}

/// Turns prompts into cleaned story text, retrying when a raw continuation
/// cleans up to nothing.
pub struct GenerationController<G: RawGenerator> {
    generator: G,
    config: EngineConfig,
}

impl<G: RawGenerator> GenerationController<G> {
    pub fn new(generator: G, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { generator, config })
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Generate a continuation of `prompt`.
    ///
    /// Each empty result is retried with a depth marker appended to the
    /// prompt. Past `retry.allow_action_after` retries, text cut at an action
    /// marker is accepted. After `retry.max_depth` retries the result is an
    /// empty string.
    pub fn generate(&mut self, prompt: &[String], overrides: &GenerationOverrides) -> Result<String> {
        let settings = self.config.sampling.with_overrides(overrides);
        settings.validate()?;

        let mut prompt: Vec<String> = prompt.iter().map(|segment| prompt_replace(segment)).collect();
        let retry = &self.config.retry;
        let mut depth = 0;

        loop {
            let raw = self.generator.generate_raw(&prompt, &settings)?;
            debug!(depth, raw = %raw, "raw generation");

            let mut result = result_replace(&raw, false);
            if result.is_empty() && depth > retry.allow_action_after {
                info!(depth, "accepting text that ends at an action marker");
                result = result_replace(&raw, true);
            }

            if !result.is_empty() {
                debug!(depth, result = %result, "processed generation");
                return Ok(result);
            }
            if depth >= retry.max_depth {
                warn!(depth, "giving up after repeated empty generations");
                return Ok(String::new());
            }

            info!(depth, "empty generation, retrying");
            prompt.push(format!(" {depth}"));
            depth += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingConfig;
    use crate::error::EngineError;
    use crate::generator::tests::{byte_tokenizer, FavoriteModel};
    use nr_model::ModelError;

    /// Replays canned raw outputs and records what it was asked.
    struct StubGenerator {
        outputs: Vec<String>,
        prompts: Vec<Vec<String>>,
        settings: Vec<SamplingConfig>,
    }

    impl StubGenerator {
        fn new(outputs: &[&str]) -> Self {
            Self {
                outputs: outputs.iter().map(|s| s.to_string()).collect(),
                prompts: Vec::new(),
                settings: Vec::new(),
            }
        }
    }

    impl RawGenerator for StubGenerator {
        fn generate_raw(&mut self, prompt: &[String], settings: &SamplingConfig) -> Result<String> {
            self.prompts.push(prompt.to_vec());
            self.settings.push(settings.clone());
            let i = (self.prompts.len() - 1).min(self.outputs.len() - 1);
            Ok(self.outputs[i].clone())
        }
    }

    struct BrokenGenerator;

    impl RawGenerator for BrokenGenerator {
        fn generate_raw(&mut self, _: &[String], _: &SamplingConfig) -> Result<String> {
            Err(ModelError::Other("out of memory".to_string()).into())
        }
    }

    fn segments(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    fn controller(outputs: &[&str]) -> GenerationController<StubGenerator> {
        GenerationController::new(StubGenerator::new(outputs), EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_first_non_empty_result_is_returned() {
        let mut ctrl = controller(&[" The door creaks open. Something"]);
        let text = ctrl
            .generate(&segments(&["You push the door. "]), &GenerationOverrides::default())
            .unwrap();
        assert_eq!(text, " The door creaks open.");
        assert_eq!(ctrl.generator().prompts, vec![segments(&["You push the door."])]);
    }

    #[test]
    fn test_exhausted_retries_return_empty() {
        let mut ctrl = controller(&[""]);
        let text = ctrl
            .generate(&segments(&["Silence."]), &GenerationOverrides::default())
            .unwrap();
        assert_eq!(text, "");

        let prompts = &ctrl.generator().prompts;
        assert_eq!(prompts.len(), 21);
        assert_eq!(prompts[0], segments(&["Silence."]));
        let last = prompts.last().unwrap();
        assert_eq!(last.len(), 21);
        assert_eq!(last[1], " 0");
        assert_eq!(last[20], " 19");
    }

    #[test]
    fn test_action_text_accepted_after_threshold() {
        let mut ctrl = controller(&["> You open the door."]);
        let text = ctrl
            .generate(&segments(&["A door."]), &GenerationOverrides::default())
            .unwrap();
        assert_eq!(text, "> You open the door.");
        // Depths 0..=6 reject the action; depth 7 accepts it.
        assert_eq!(ctrl.generator().prompts.len(), 8);
    }

    #[test]
    fn test_retry_recovers_on_later_output() {
        let mut ctrl = controller(&["", "  ", " A bat flies past."]);
        let text = ctrl
            .generate(&segments(&["A cave."]), &GenerationOverrides::default())
            .unwrap();
        assert_eq!(text, " A bat flies past.");
        assert_eq!(
            ctrl.generator().prompts[2],
            segments(&["A cave.", " 0", " 1"])
        );
    }

    #[test]
    fn test_custom_retry_bounds() {
        let mut config = EngineConfig::default();
        config.retry.max_depth = 2;
        let mut ctrl = GenerationController::new(StubGenerator::new(&[""]), config).unwrap();
        assert_eq!(ctrl.generate(&[], &GenerationOverrides::default()).unwrap(), "");
        assert_eq!(ctrl.generator().prompts.len(), 3);
    }

    #[test]
    fn test_overrides_reach_generator() {
        let mut ctrl = controller(&["It is late."]);
        let overrides = GenerationOverrides {
            generate_num: Some(10),
            ..GenerationOverrides::greedy()
        };
        ctrl.generate(&segments(&["Night."]), &overrides).unwrap();
        let used = &ctrl.generator().settings[0];
        assert_eq!(used.generate_num, 10);
        assert_eq!(used.temperature, 0.0);
        assert_eq!(used.top_k, 40);
    }

    #[test]
    fn test_invalid_overrides_rejected_before_generation() {
        let mut ctrl = controller(&["x."]);
        let overrides = GenerationOverrides {
            top_p: Some(2.0),
            ..Default::default()
        };
        let err = ctrl.generate(&segments(&["x"]), &overrides).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
        assert!(ctrl.generator().prompts.is_empty());
    }

    #[test]
    fn test_generator_errors_propagate() {
        let mut ctrl = GenerationController::new(BrokenGenerator, EngineConfig::default()).unwrap();
        let err = ctrl
            .generate(&segments(&["x"]), &GenerationOverrides::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::Model(ModelError::Other(_))));
    }

    #[test]
    fn test_engine_greedy_scenario() {
        let mut engine =
            Engine::with_model(FavoriteModel::new(b'a'), byte_tokenizer(), EngineConfig::default())
                .unwrap();
        let overrides = GenerationOverrides {
            generate_num: Some(10),
            ..GenerationOverrides::greedy()
        };
        let prompt = segments(&["The castle was dark.", "You enter the hall."]);

        // No sentence ending, so the text survives whole.
        let text = engine.generate(&prompt, &overrides).unwrap();
        assert_eq!(text, "aaaaaaaaaa");
    }

    #[test]
    fn test_engine_exhausts_on_action_only_output() {
        let mut engine =
            Engine::with_model(FavoriteModel::new(b'>'), byte_tokenizer(), EngineConfig::default())
                .unwrap();
        let text = engine
            .generate(&segments(&["You wait."]), &GenerationOverrides::greedy())
            .unwrap();
        assert_eq!(text, "");
        assert_eq!(engine.generator().model().contexts.len(), 21);
    }
}
