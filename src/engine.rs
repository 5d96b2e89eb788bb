//! Per-turn analysis pipeline.
//!
//! `SupportEngine` wires the stages together: keyword screen and text
//! classification, optional voice estimation, fusion, risk assessment,
//! and technique selection. It holds no conversation state; callers pass
//! the history window in and decide what to retain afterwards.

use chrono::Utc;
use tracing::{debug, info};

use crate::classifier::TextClassifier;
use crate::config::EngineConfig;
use crate::fusion;
use crate::llm_client::LanguageModel;
use crate::risk;
use crate::techniques::TechniqueCatalog;
use crate::types::{ConversationTurn, TurnAnalysis, VoiceFeatures};
use crate::voice;

pub struct SupportEngine {
    config: EngineConfig,
    classifier: TextClassifier,
    catalog: TechniqueCatalog,
}

impl SupportEngine {
    pub fn new(config: EngineConfig) -> Self {
        let classifier = TextClassifier::new(&config);
        Self {
            config,
            classifier,
            catalog: TechniqueCatalog::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// How many prior turns the risk assessor looks at. Callers use this
    /// to size the history window they pass to [`analyze_turn`].
    ///
    /// [`analyze_turn`]: SupportEngine::analyze_turn
    pub fn history_window(&self) -> usize {
        self.config.history_window
    }

    /// Run one turn through the full pipeline.
    ///
    /// Deterministic apart from the model call: re-running with the same
    /// inputs and the same model reply produces the same analysis.
    pub async fn analyze_turn(
        &self,
        model: &dyn LanguageModel,
        text: &str,
        voice_features: Option<&VoiceFeatures>,
        history: &[ConversationTurn],
    ) -> TurnAnalysis {
        let text_analysis = self.classifier.classify(model, text, history).await;

        let voice_estimate = voice_features.map(voice::estimate_emotion);
        if let Some(ref v) = voice_estimate {
            debug!(
                "Voice estimate: {} ({:.2})",
                v.label.as_str(),
                v.confidence
            );
        }

        let fused = fusion::fuse(&self.config, text_analysis.estimate, voice_estimate);
        let risk = risk::assess(&self.config, &fused, &text_analysis.crisis, history);
        let technique = self.catalog.recommend(fused.estimate.label, risk.level);

        if risk.crisis {
            info!(
                "Crisis signal raised: level {}, terms {:?}",
                risk.level.as_str(),
                text_analysis.crisis.matched_terms
            );
        } else {
            debug!(
                "Turn analyzed: {} ({:.2}), risk {}, technique {}",
                fused.estimate.label.as_str(),
                fused.estimate.confidence,
                risk.level.as_str(),
                technique.technique_id
            );
        }

        TurnAnalysis {
            emotion: fused.estimate,
            crisis_signal: text_analysis.crisis,
            risk,
            technique,
        }
    }

    /// Build the history record for an analyzed turn.
    pub fn to_turn(
        &self,
        text: &str,
        voice_features: Option<&VoiceFeatures>,
        analysis: &TurnAnalysis,
    ) -> ConversationTurn {
        ConversationTurn {
            timestamp: Utc::now(),
            text: text.to_string(),
            voice_features: voice_features.cloned(),
            emotion: analysis.emotion.clone(),
            risk: analysis.risk.clone(),
        }
    }
}
