//! Engine configuration: fusion weights, risk thresholds, the crisis
//! keyword list and language-model endpoint settings.
//!
//! Loaded from a JSON file when one exists, otherwise defaults are used.
//! Weight validation is fatal at startup: a weight pair that does not sum
//! to 1.0 would silently bias every risk decision.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::types::Severity;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("voice_weight ({voice}) + text_weight ({text}) must sum to 1.0")]
    InvalidWeights { voice: f32, text: f32 },
    #[error("history_window must be at least 1")]
    EmptyHistoryWindow,
}

/// A crisis keyword or phrase with its configured severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisKeyword {
    pub term: String,
    pub severity: Severity,
}

impl CrisisKeyword {
    fn high(term: &str) -> Self {
        Self {
            term: term.to_string(),
            severity: Severity::High,
        }
    }

    fn low(term: &str) -> Self {
        Self {
            term: term.to_string(),
            severity: Severity::Low,
        }
    }
}

/// Risk decision-table thresholds, tunable per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Rule 2: low-severity keyword + hopeless/sad at this confidence → high.
    pub keyword_corroboration: f32,
    /// Rule 3: hopeless/anxious/sad at this confidence → high.
    pub strong_emotion: f32,
    /// Rule 5: anxious/sad/angry at this confidence → medium.
    pub moderate_emotion: f32,
    /// Rule 6: any non-benign label at this confidence → low.
    pub minimum_signal: f32,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            keyword_corroboration: 0.6,
            strong_emotion: 0.8,
            moderate_emotion: 0.5,
            minimum_signal: 0.3,
        }
    }
}

/// Ollama endpoint settings for the production language-model client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            model: "gemma3n:e4b".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub schema_version: u32,

    // Fusion weights; must sum to 1.0
    pub voice_weight: f32,
    pub text_weight: f32,
    /// Confidence penalty applied when the modalities disagree on the label.
    pub disagreement_penalty: f32,

    /// How many recent turns the risk assessor inspects for escalation.
    pub history_window: usize,

    pub risk_thresholds: RiskThresholds,
    pub crisis_keywords: Vec<CrisisKeyword>,
    pub ollama: OllamaConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            voice_weight: 0.4,
            text_weight: 0.6,
            disagreement_penalty: 0.1,
            history_window: 5,
            risk_thresholds: RiskThresholds::default(),
            crisis_keywords: default_crisis_keywords(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// Default crisis lexicon. Direct self-harm phrasing is high severity;
/// diffuse distress vocabulary is low severity.
fn default_crisis_keywords() -> Vec<CrisisKeyword> {
    vec![
        // Suicidal ideation / self-harm: any match forces critical.
        CrisisKeyword::high("suicide"),
        CrisisKeyword::high("kill myself"),
        CrisisKeyword::high("end it all"),
        CrisisKeyword::high("end my life"),
        CrisisKeyword::high("want to die"),
        CrisisKeyword::high("better off dead"),
        CrisisKeyword::high("better off without me"),
        CrisisKeyword::high("not worth living"),
        CrisisKeyword::high("hurt myself"),
        CrisisKeyword::high("cut myself"),
        CrisisKeyword::high("harm myself"),
        CrisisKeyword::high("self harm"),
        CrisisKeyword::high("overdose"),
        // Distress vocabulary: escalates only with a corroborating emotion.
        CrisisKeyword::low("hopeless"),
        CrisisKeyword::low("worthless"),
        CrisisKeyword::low("no point"),
        CrisisKeyword::low("pointless"),
        CrisisKeyword::low("can't go on"),
        CrisisKeyword::low("can't take this"),
        CrisisKeyword::low("can't breathe"),
        CrisisKeyword::low("burden"),
        CrisisKeyword::low("empty"),
        CrisisKeyword::low("numb"),
    ]
}

impl EngineConfig {
    /// Load config from file, or fall back to defaults. The result is
    /// validated either way.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Save config to file (pretty-printed JSON).
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Startup validation. Weight mismatch is fatal by design.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if (self.voice_weight + self.text_weight - 1.0).abs() > 1e-6 {
            return Err(ConfigError::InvalidWeights {
                voice: self.voice_weight,
                text: self.text_weight,
            });
        }
        if self.history_window == 0 {
            return Err(ConfigError::EmptyHistoryWindow);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.voice_weight, 0.4);
        assert_eq!(config.text_weight, 0.6);
        assert_eq!(config.history_window, 5);
    }

    #[test]
    fn test_default_lexicon_severities() {
        let config = EngineConfig::default();
        let find = |term: &str| {
            config
                .crisis_keywords
                .iter()
                .find(|k| k.term == term)
                .map(|k| k.severity)
        };
        assert_eq!(find("suicide"), Some(Severity::High));
        assert_eq!(find("better off without me"), Some(Severity::High));
        assert_eq!(find("hopeless"), Some(Severity::Low));
        assert_eq!(find("can't breathe"), Some(Severity::Low));
    }

    #[test]
    fn test_weight_mismatch_is_fatal() {
        let config = EngineConfig {
            voice_weight: 0.5,
            text_weight: 0.6,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWeights { .. })
        ));
    }

    #[test]
    fn test_zero_history_window_rejected() {
        let config = EngineConfig {
            history_window: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyHistoryWindow)
        ));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let path = std::path::Path::new("/nonexistent/mindful-core.json");
        let config = EngineConfig::load(path).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = EngineConfig::default();
        config.voice_weight = 0.3;
        config.text_weight = 0.7;
        config.history_window = 8;
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_weights_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = EngineConfig::default();
        config.voice_weight = 0.9;
        config.save(&path).unwrap();

        assert!(EngineConfig::load(&path).is_err());
    }
}
