//! Multimodal emotion fusion.
//!
//! Combines the text estimate with the (optional) voice estimate under
//! configured weights. Pure and deterministic: no I/O, no randomness.
//!
//! - One modality only → passed through unchanged.
//! - Agreement → same label, weighted-average confidence (always between
//!   the two inputs because the weights sum to 1).
//! - Disagreement → the label with the higher confidence×weight wins; fused
//!   confidence is the winning weighted confidence, reduced by a fixed
//!   penalty so the risk assessor treats disagreement as mild uncertainty.

use crate::config::EngineConfig;
use crate::types::{EmotionEstimate, EstimateSource};

/// Fusion result: the fused estimate plus enough context for explainability.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedEmotion {
    pub estimate: EmotionEstimate,
    /// True when both modalities were present and disagreed on the label.
    pub modalities_disagreed: bool,
    /// Human-readable account of how the estimate was formed.
    pub rationale: Vec<String>,
}

pub fn fuse(
    config: &EngineConfig,
    text: EmotionEstimate,
    voice: Option<EmotionEstimate>,
) -> FusedEmotion {
    let voice = match voice {
        Some(v) => v,
        None => {
            return FusedEmotion {
                estimate: EmotionEstimate::new(text.label, text.confidence, EstimateSource::Fused),
                modalities_disagreed: false,
                rationale: vec!["text modality only".to_string()],
            };
        }
    };

    let wv = config.voice_weight;
    let wt = config.text_weight;

    if voice.label == text.label {
        let confidence = voice.confidence * wv + text.confidence * wt;
        return FusedEmotion {
            estimate: EmotionEstimate::new(text.label, confidence, EstimateSource::Fused),
            modalities_disagreed: false,
            rationale: vec![format!(
                "modalities agree on {} (voice {:.2}, text {:.2})",
                text.label.as_str(),
                voice.confidence,
                text.confidence
            )],
        };
    }

    // Disagreement: winner by weighted confidence. Weights sum to 1, so the
    // winning weighted confidence is already normalized.
    let voice_score = voice.confidence * wv;
    let text_score = text.confidence * wt;
    let (winner, winner_score) = if voice_score > text_score {
        (voice, voice_score)
    } else {
        (text, text_score)
    };

    let confidence = (winner_score - config.disagreement_penalty).max(0.0);

    FusedEmotion {
        estimate: EmotionEstimate::new(winner.label, confidence, EstimateSource::Fused),
        modalities_disagreed: true,
        rationale: vec![format!(
            "modalities disagree: voice {} ({:.2}) vs text {} ({:.2}); {} wins on weighted confidence",
            voice.label.as_str(),
            voice.confidence,
            text.label.as_str(),
            text.confidence,
            winner.label.as_str()
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Emotion;
    use proptest::prelude::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn text(label: Emotion, confidence: f32) -> EmotionEstimate {
        EmotionEstimate::new(label, confidence, EstimateSource::Text)
    }

    fn voice(label: Emotion, confidence: f32) -> EmotionEstimate {
        EmotionEstimate::new(label, confidence, EstimateSource::Voice)
    }

    #[test]
    fn test_text_only_passes_through() {
        let fused = fuse(&config(), text(Emotion::Sad, 0.7), None);
        assert_eq!(fused.estimate.label, Emotion::Sad);
        assert!((fused.estimate.confidence - 0.7).abs() < 1e-6);
        assert_eq!(fused.estimate.source, EstimateSource::Fused);
        assert!(!fused.modalities_disagreed);
    }

    #[test]
    fn test_agreement_weighted_average() {
        let fused = fuse(
            &config(),
            text(Emotion::Anxious, 0.9),
            Some(voice(Emotion::Anxious, 0.6)),
        );
        assert_eq!(fused.estimate.label, Emotion::Anxious);
        // 0.6*0.4 + 0.9*0.6 = 0.78
        assert!((fused.estimate.confidence - 0.78).abs() < 1e-6);
        assert!(!fused.modalities_disagreed);
    }

    #[test]
    fn test_disagreement_text_wins_on_weight() {
        // text 0.8*0.6 = 0.48 beats voice 0.9*0.4 = 0.36
        let fused = fuse(
            &config(),
            text(Emotion::Anxious, 0.8),
            Some(voice(Emotion::Angry, 0.9)),
        );
        assert_eq!(fused.estimate.label, Emotion::Anxious);
        assert!(fused.modalities_disagreed);
        // 0.48 minus the 0.1 disagreement penalty
        assert!((fused.estimate.confidence - 0.38).abs() < 1e-6);
    }

    #[test]
    fn test_disagreement_voice_can_win() {
        // voice 0.95*0.4 = 0.38 beats text 0.5*0.6 = 0.30
        let fused = fuse(
            &config(),
            text(Emotion::Neutral, 0.5),
            Some(voice(Emotion::Sad, 0.95)),
        );
        assert_eq!(fused.estimate.label, Emotion::Sad);
        assert!(fused.modalities_disagreed);
    }

    #[test]
    fn test_disagreement_penalty_floors_at_zero() {
        let fused = fuse(
            &config(),
            text(Emotion::Sad, 0.1),
            Some(voice(Emotion::Calm, 0.05)),
        );
        assert_eq!(fused.estimate.confidence, 0.0);
    }

    #[test]
    fn test_rationale_records_disagreement() {
        let fused = fuse(
            &config(),
            text(Emotion::Anxious, 0.8),
            Some(voice(Emotion::Sad, 0.7)),
        );
        assert!(fused.rationale[0].contains("disagree"));
    }

    proptest! {
        #[test]
        fn prop_fused_confidence_in_unit_interval(
            text_conf in 0.0f32..=1.0,
            voice_conf in 0.0f32..=1.0,
        ) {
            let fused = fuse(
                &config(),
                text(Emotion::Anxious, text_conf),
                Some(voice(Emotion::Sad, voice_conf)),
            );
            prop_assert!((0.0..=1.0).contains(&fused.estimate.confidence));
        }

        #[test]
        fn prop_agreement_confidence_between_inputs(
            text_conf in 0.0f32..=1.0,
            voice_conf in 0.0f32..=1.0,
        ) {
            let fused = fuse(
                &config(),
                text(Emotion::Sad, text_conf),
                Some(voice(Emotion::Sad, voice_conf)),
            );
            let lo = text_conf.min(voice_conf) - 1e-6;
            let hi = text_conf.max(voice_conf) + 1e-6;
            prop_assert!(fused.estimate.confidence >= lo);
            prop_assert!(fused.estimate.confidence <= hi);
        }
    }
}
