//! Risk assessment decision table.
//!
//! Rules are evaluated top to bottom; the first of rules 1-3 to match wins
//! outright. Otherwise the emotion bands (rules 5-7) pick a base level and
//! the escalation-trend rule bumps it one step when the recent window shows
//! repeated medium-or-worse turns. The bump caps at high: only a
//! high-severity keyword match can produce critical.
//!
//! The crisis flag is keyword-driven (rules 1 and 2 only). A high-severity
//! keyword match always dominates classifier confidence; false negatives
//! are the failure mode this table is shaped to avoid.

use crate::config::EngineConfig;
use crate::fusion::FusedEmotion;
use crate::types::{
    ConversationTurn, CrisisSignal, Emotion, RiskAssessment, RiskLevel, Severity,
};

pub fn assess(
    config: &EngineConfig,
    fused: &FusedEmotion,
    crisis: &CrisisSignal,
    history: &[ConversationTurn],
) -> RiskAssessment {
    let t = &config.risk_thresholds;
    let label = fused.estimate.label;
    let confidence = fused.estimate.confidence;
    let mut rationale = Vec::new();

    if fused.modalities_disagreed {
        rationale.push("modalities disagreed; fused confidence already penalized".to_string());
    }

    // Rule 1: direct crisis language ends the evaluation immediately.
    if crisis.matched && crisis.severity_hint == Severity::High {
        rationale.push(format!(
            "rule 1: high-severity crisis keyword(s) {:?}",
            crisis.matched_terms
        ));
        return RiskAssessment {
            level: RiskLevel::Critical,
            crisis: true,
            rationale,
        };
    }

    // Rule 2: milder crisis vocabulary corroborated by a despondent reading.
    if crisis.matched
        && matches!(label, Emotion::Hopeless | Emotion::Sad)
        && confidence >= t.keyword_corroboration
    {
        rationale.push(format!(
            "rule 2: low-severity keyword(s) {:?} with {} at {:.2}",
            crisis.matched_terms,
            label.as_str(),
            confidence
        ));
        return RiskAssessment {
            level: RiskLevel::High,
            crisis: true,
            rationale,
        };
    }

    // Rule 3: strong distress reading without keyword support.
    if matches!(label, Emotion::Hopeless | Emotion::Anxious | Emotion::Sad)
        && confidence >= t.strong_emotion
    {
        rationale.push(format!(
            "rule 3: {} at {:.2} (>= {:.2})",
            label.as_str(),
            confidence,
            t.strong_emotion
        ));
        return RiskAssessment {
            level: RiskLevel::High,
            crisis: false,
            rationale,
        };
    }

    // Rules 5-7: band by emotion and confidence.
    let base = if matches!(label, Emotion::Anxious | Emotion::Sad | Emotion::Angry)
        && confidence >= t.moderate_emotion
    {
        rationale.push(format!(
            "rule 5: {} at {:.2} (>= {:.2})",
            label.as_str(),
            confidence,
            t.moderate_emotion
        ));
        RiskLevel::Medium
    } else if confidence >= t.minimum_signal && !label.is_benign() {
        rationale.push(format!(
            "rule 6: non-benign {} at {:.2} (>= {:.2})",
            label.as_str(),
            confidence,
            t.minimum_signal
        ));
        RiskLevel::Low
    } else {
        rationale.push("rule 7: no meaningful distress signal".to_string());
        RiskLevel::None
    };

    // Rule 4: escalation trend bumps the banded level one step.
    let window = recent_window(history, config.history_window);
    let elevated = window
        .iter()
        .filter(|turn| turn.risk.level >= RiskLevel::Medium)
        .count();
    let level = if elevated >= 2 {
        rationale.push(format!(
            "rule 4: escalation trend ({} of last {} turns at medium or above)",
            elevated,
            window.len()
        ));
        base.bumped()
    } else {
        base
    };

    RiskAssessment {
        level,
        crisis: false,
        rationale,
    }
}

fn recent_window(history: &[ConversationTurn], window: usize) -> &[ConversationTurn] {
    let start = history.len().saturating_sub(window);
    &history[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EmotionEstimate, EstimateSource};
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn fused(label: Emotion, confidence: f32) -> FusedEmotion {
        FusedEmotion {
            estimate: EmotionEstimate::new(label, confidence, EstimateSource::Fused),
            modalities_disagreed: false,
            rationale: vec![],
        }
    }

    fn signal(severity: Severity, term: &str) -> CrisisSignal {
        let mut terms = BTreeSet::new();
        terms.insert(term.to_string());
        CrisisSignal {
            matched: true,
            matched_terms: terms,
            severity_hint: severity,
        }
    }

    fn turn_at(level: RiskLevel) -> ConversationTurn {
        ConversationTurn {
            timestamp: Utc::now(),
            text: String::new(),
            voice_features: None,
            emotion: EmotionEstimate::new(Emotion::Sad, 0.5, EstimateSource::Fused),
            risk: RiskAssessment {
                level,
                crisis: false,
                rationale: vec![],
            },
        }
    }

    #[test]
    fn test_rule1_high_keyword_is_always_critical() {
        // Even a confident happy reading cannot override direct crisis language.
        let assessment = assess(
            &config(),
            &fused(Emotion::Happy, 0.99),
            &signal(Severity::High, "want to die"),
            &[],
        );
        assert_eq!(assessment.level, RiskLevel::Critical);
        assert!(assessment.crisis);
        assert!(assessment.rationale.iter().any(|r| r.contains("rule 1")));
    }

    #[test]
    fn test_rule2_low_keyword_with_despondent_reading() {
        let assessment = assess(
            &config(),
            &fused(Emotion::Hopeless, 0.7),
            &signal(Severity::Low, "hopeless"),
            &[],
        );
        assert_eq!(assessment.level, RiskLevel::High);
        assert!(assessment.crisis);
    }

    #[test]
    fn test_rule2_needs_corroborating_confidence() {
        let assessment = assess(
            &config(),
            &fused(Emotion::Hopeless, 0.5),
            &signal(Severity::Low, "hopeless"),
            &[],
        );
        // Falls through to rule 6 (0.5 >= 0.3, non-benign hopeless).
        assert_eq!(assessment.level, RiskLevel::Low);
        assert!(!assessment.crisis);
    }

    #[test]
    fn test_rule3_strong_emotion_high_without_crisis() {
        let assessment = assess(&config(), &fused(Emotion::Anxious, 0.85), &CrisisSignal::none(), &[]);
        assert_eq!(assessment.level, RiskLevel::High);
        assert!(!assessment.crisis);
    }

    #[test]
    fn test_rule5_moderate_band() {
        let assessment = assess(&config(), &fused(Emotion::Angry, 0.6), &CrisisSignal::none(), &[]);
        assert_eq!(assessment.level, RiskLevel::Medium);
    }

    #[test]
    fn test_rule6_low_band() {
        let assessment = assess(&config(), &fused(Emotion::Hopeless, 0.4), &CrisisSignal::none(), &[]);
        assert_eq!(assessment.level, RiskLevel::Low);
    }

    #[test]
    fn test_rule7_benign_or_weak_is_none() {
        let assessment = assess(&config(), &fused(Emotion::Happy, 0.9), &CrisisSignal::none(), &[]);
        assert_eq!(assessment.level, RiskLevel::None);
        let assessment = assess(&config(), &fused(Emotion::Sad, 0.2), &CrisisSignal::none(), &[]);
        assert_eq!(assessment.level, RiskLevel::None);
    }

    #[test]
    fn test_rule4_escalation_bumps_low_to_medium() {
        let history = vec![
            turn_at(RiskLevel::Medium),
            turn_at(RiskLevel::Low),
            turn_at(RiskLevel::High),
        ];
        // Alone this turn would be low (rule 6).
        let assessment = assess(&config(), &fused(Emotion::Sad, 0.4), &CrisisSignal::none(), &history);
        assert_eq!(assessment.level, RiskLevel::Medium);
        assert!(assessment.rationale.iter().any(|r| r.contains("rule 4")));
    }

    #[test]
    fn test_rule4_needs_two_elevated_turns() {
        let history = vec![turn_at(RiskLevel::Medium), turn_at(RiskLevel::Low)];
        let assessment = assess(&config(), &fused(Emotion::Sad, 0.4), &CrisisSignal::none(), &history);
        assert_eq!(assessment.level, RiskLevel::Low);
    }

    #[test]
    fn test_rule4_only_counts_the_window() {
        // Elevated turns beyond the configured window must not count.
        let mut history = vec![turn_at(RiskLevel::High), turn_at(RiskLevel::High)];
        history.extend((0..5).map(|_| turn_at(RiskLevel::None)));
        let assessment = assess(&config(), &fused(Emotion::Sad, 0.4), &CrisisSignal::none(), &history);
        assert_eq!(assessment.level, RiskLevel::Low);
    }

    #[test]
    fn test_rule4_never_reaches_critical() {
        let history = vec![
            turn_at(RiskLevel::High),
            turn_at(RiskLevel::High),
            turn_at(RiskLevel::High),
        ];
        // Banded medium, bumped once to high, capped there.
        let assessment = assess(&config(), &fused(Emotion::Sad, 0.6), &CrisisSignal::none(), &history);
        assert_eq!(assessment.level, RiskLevel::High);
        assert!(!assessment.crisis);
    }

    #[test]
    fn test_keyword_severity_monotonicity() {
        // A high-severity match never produces a level below critical,
        // whatever the fused emotion says.
        for label in Emotion::ALL {
            for confidence in [0.0, 0.3, 0.6, 1.0] {
                let assessment = assess(
                    &config(),
                    &fused(label, confidence),
                    &signal(Severity::High, "suicide"),
                    &[],
                );
                assert_eq!(assessment.level, RiskLevel::Critical);
                assert!(assessment.crisis);
            }
        }
    }

    #[test]
    fn test_rationale_lists_fired_rules() {
        let history = vec![turn_at(RiskLevel::Medium), turn_at(RiskLevel::Medium)];
        let assessment = assess(&config(), &fused(Emotion::Anxious, 0.6), &CrisisSignal::none(), &history);
        assert!(assessment.rationale.iter().any(|r| r.contains("rule 5")));
        assert!(assessment.rationale.iter().any(|r| r.contains("rule 4")));
    }
}
