// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Ordered checklist the judge is asked about. Order matters: the judge
    /// response is interpreted positionally by counting, never by parsing.
    #[serde(default = "default_criteria")]
    pub criteria: Vec<CriterionConfig>,
}

// Hand-written so the no-config-file path gets the built-in criteria too;
// a derived Default would leave the checklist empty.
impl Default for Config {
    fn default() -> Self {
        Self {
            models: ModelsConfig::default(),
            search: SearchConfig::default(),
            scoring: ScoringConfig::default(),
            criteria: default_criteria(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub execution_endpoint: String,
    pub reflection_endpoint: String,
    pub execution_model: String,
    pub reflection_model: String,
    pub temperature_execution: f32,
    pub temperature_reflection: f32,
    pub max_output_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            execution_endpoint: "http://localhost:11434".into(),
            reflection_endpoint: "http://localhost:11434".into(),
            execution_model: "llama3.1".into(),
            reflection_model: "llama3.1".into(),
            temperature_execution: 0.1,
            temperature_reflection: 0.1,
            max_output_tokens: 1000,
            request_timeout_secs: 120,
        }
    }
}

impl ModelsConfig {
    /// Environment variables override the file, matching deployment practice
    /// where the backend URL is injected by the runtime.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("PROMPTTUNE_EXECUTION_URL") {
            self.execution_endpoint = url;
        }
        if let Ok(url) = std::env::var("PROMPTTUNE_REFLECTION_URL") {
            self.reflection_endpoint = url;
        }
        if let Ok(model) = std::env::var("PROMPTTUNE_EXECUTION_MODEL") {
            self.execution_model = model;
        }
        if let Ok(model) = std::env::var("PROMPTTUNE_REFLECTION_MODEL") {
            self.reflection_model = model;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Hard ceiling on expensive calls (generator + judge + reflection).
    pub calls_budget: u32,
    /// Concurrent evaluations within one EVALUATE step. Default 1 to protect
    /// a shared, possibly resource-constrained backend.
    pub parallelism: usize,
    /// Reflect after this many evaluated examples.
    pub reflect_every: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            calls_budget: 10,
            parallelism: 1,
            reflect_every: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Judge answers are counted by occurrences of this token, lowercased.
    pub affirmative_token: String,
    /// Outputs shorter than this score 0.0 without a judge call.
    pub min_output_length: usize,
    /// Word-count range that earns the full length modifier.
    pub target_word_range: [usize; 2],
    /// Wider band that earns `near_penalty` instead of `far_penalty`.
    pub soft_word_range: [usize; 2],
    pub near_penalty: f32,
    pub far_penalty: f32,
    pub required_paragraph_count: usize,
    pub paragraph_penalty: f32,
    /// Blank-line segments at or below this length are ignored when counting
    /// paragraphs (filters stray newlines).
    pub min_paragraph_chars: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            affirmative_token: "ja".into(),
            min_output_length: 10,
            target_word_range: [60, 200],
            soft_word_range: [30, 300],
            near_penalty: 0.4,
            far_penalty: 0.1,
            required_paragraph_count: 4,
            paragraph_penalty: 0.4,
            min_paragraph_chars: 3,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), crate::infra::errors::PromptTuneError> {
        use crate::infra::errors::PromptTuneError;
        let [tmin, tmax] = self.target_word_range;
        let [smin, smax] = self.soft_word_range;
        if tmin > tmax {
            return Err(PromptTuneError::Config(format!(
                "target_word_range min {tmin} exceeds max {tmax}"
            )));
        }
        if smin > tmin || smax < tmax {
            return Err(PromptTuneError::Config(
                "soft_word_range must enclose target_word_range".into(),
            ));
        }
        if self.affirmative_token.trim().is_empty() {
            return Err(PromptTuneError::Config("affirmative_token is empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionConfig {
    pub question: String,
}

fn default_criteria() -> Vec<CriterionConfig> {
    // The built-in German story task: four yes/no checks.
    [
        "Ist der Text auf Deutsch?",
        "Hat der Text exakt vier Absätze?",
        "Ist der Text als Markdown formatiert (benutzt ###)?",
        "Endet der Text mit einer Frage?",
    ]
    .into_iter()
    .map(|q| CriterionConfig { question: q.into() })
    .collect()
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.models.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.search.calls_budget, 10);
        assert_eq!(c.search.parallelism, 1);
        assert_eq!(c.scoring.min_output_length, 10);
        assert!((c.scoring.near_penalty - 0.4).abs() < 0.001);
        assert!((c.scoring.far_penalty - 0.1).abs() < 0.001);
        assert_eq!(c.criteria.len(), 4);
        assert!((c.models.temperature_execution - 0.1).abs() < 0.001);
        assert_eq!(c.models.max_output_tokens, 1000);
    }

    #[test]
    fn test_default_scoring_validates() {
        assert!(ScoringConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_target_range_rejected() {
        let s = ScoringConfig {
            target_word_range: [200, 60],
            ..ScoringConfig::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_soft_range_must_enclose_target() {
        let s = ScoringConfig {
            target_word_range: [60, 200],
            soft_word_range: [100, 300],
            ..ScoringConfig::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.search.calls_budget, 10);
        assert_eq!(config.criteria.len(), 4);
    }

    #[test]
    fn test_default_matches_empty_toml() {
        // Running without a config file must yield the same checklist as an
        // empty config file, not an inert scorer with zero criteria.
        let from_code = Config::default();
        let from_toml: Config = toml::from_str("").unwrap();
        assert!(!from_code.criteria.is_empty());
        assert_eq!(from_code.criteria.len(), from_toml.criteria.len());
        for (a, b) in from_code.criteria.iter().zip(&from_toml.criteria) {
            assert_eq!(a.question, b.question);
        }
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[models]
execution_endpoint = "http://gpu-box:11434"
reflection_endpoint = "http://gpu-box:11434"
execution_model = "qwen2.5"
reflection_model = "llama3.3"
temperature_execution = 0.2
temperature_reflection = 0.7
max_output_tokens = 2000
request_timeout_secs = 60

[search]
calls_budget = 40
parallelism = 4
reflect_every = 3

[scoring]
affirmative_token = "yes"
min_output_length = 25
target_word_range = [600, 850]
soft_word_range = [500, 1000]
near_penalty = 0.4
far_penalty = 0.1
required_paragraph_count = 6
paragraph_penalty = 0.3
min_paragraph_chars = 5

[[criteria]]
question = "Is the text in English?"

[[criteria]]
question = "Does the text end with a question?"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.models.execution_model, "qwen2.5");
        assert_eq!(config.search.calls_budget, 40);
        assert_eq!(config.search.parallelism, 4);
        assert_eq!(config.scoring.affirmative_token, "yes");
        assert_eq!(config.scoring.target_word_range, [600, 850]);
        assert_eq!(config.scoring.required_paragraph_count, 6);
        assert_eq!(config.criteria.len(), 2);
        assert!(config.scoring.validate().is_ok());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.search.calls_budget, config.search.calls_budget);
        assert_eq!(deserialized.criteria.len(), config.criteria.len());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }
}
