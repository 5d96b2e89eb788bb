//! Core value objects shared across the engine.
//!
//! Every type here is created fresh per turn and never mutated afterwards;
//! persistence of turns is the caller's concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Closed set of emotion labels the engine recognizes.
///
/// Anything outside this set (a surprising LLM reply, a stale config value)
/// is normalized to `Neutral` before it reaches fusion or risk assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Anxious,
    Sad,
    Angry,
    Hopeless,
    Calm,
    Happy,
}

impl Emotion {
    /// All labels, in a fixed order (used for prompt construction).
    pub const ALL: [Emotion; 7] = [
        Emotion::Neutral,
        Emotion::Anxious,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Hopeless,
        Emotion::Calm,
        Emotion::Happy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Anxious => "anxious",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Hopeless => "hopeless",
            Emotion::Calm => "calm",
            Emotion::Happy => "happy",
        }
    }

    /// Parse a label leniently; unknown strings map to `Neutral`.
    pub fn parse_lenient(s: &str) -> Emotion {
        match s.trim().to_lowercase().as_str() {
            "anxious" => Emotion::Anxious,
            "sad" => Emotion::Sad,
            "angry" => Emotion::Angry,
            "hopeless" => Emotion::Hopeless,
            "calm" => Emotion::Calm,
            "happy" => Emotion::Happy,
            _ => Emotion::Neutral,
        }
    }

    /// Labels that carry no distress signal on their own.
    pub fn is_benign(&self) -> bool {
        matches!(self, Emotion::Neutral | Emotion::Calm | Emotion::Happy)
    }
}

/// Which modality produced an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateSource {
    Voice,
    Text,
    Fused,
}

/// One modality's (or the fused) emotion estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionEstimate {
    pub label: Emotion,
    /// Always in [0, 1]; clamped at construction.
    pub confidence: f32,
    pub source: EstimateSource,
}

impl EmotionEstimate {
    pub fn new(label: Emotion, confidence: f32, source: EstimateSource) -> Self {
        Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }

    /// The neutral zero-confidence estimate used as the fail-soft fallback.
    pub fn neutral(source: EstimateSource) -> Self {
        Self::new(Emotion::Neutral, 0.0, source)
    }
}

/// Severity attached to a crisis keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    High,
}

/// Result of lexical crisis-keyword screening. Independent of the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisSignal {
    pub matched: bool,
    pub matched_terms: BTreeSet<String>,
    /// Highest severity among the matched terms; `Low` when nothing matched.
    pub severity_hint: Severity,
}

impl CrisisSignal {
    pub fn none() -> Self {
        Self {
            matched: false,
            matched_terms: BTreeSet::new(),
            severity_hint: Severity::Low,
        }
    }
}

/// Raw acoustic measurements for one turn, as delivered by the audio front end.
///
/// Fields are optional: a missing field is substituted with the population
/// mean for that dimension during normalization. A missing struct means the
/// voice modality contributes nothing to fusion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceFeatures {
    /// Mean fundamental frequency in Hz.
    pub pitch_mean: Option<f32>,
    /// RMS energy, already scaled to [0, 1] by the extractor.
    pub energy: Option<f32>,
    /// Estimated speech rate in words per minute.
    pub speech_rate: Option<f32>,
    /// Average pause duration in seconds.
    pub avg_pause_duration: Option<f32>,
}

/// Discrete risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// One step up the ladder, capped at `High`. The escalation-trend rule
    /// never auto-promotes to `Critical`; only a high-severity keyword does.
    pub fn bumped(&self) -> RiskLevel {
        match self {
            RiskLevel::None => RiskLevel::Low,
            RiskLevel::Low => RiskLevel::Medium,
            RiskLevel::Medium => RiskLevel::High,
            RiskLevel::High => RiskLevel::High,
            RiskLevel::Critical => RiskLevel::Critical,
        }
    }
}

/// Output of the risk assessor for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub crisis: bool,
    /// Every decision-table rule that fired, in evaluation order.
    pub rationale: Vec<String>,
}

/// One prior turn from the conversation history window. Owned by the
/// conversation manager; the engine only ever reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub voice_features: Option<VoiceFeatures>,
    pub emotion: EmotionEstimate,
    pub risk: RiskAssessment,
}

/// Suggested therapeutic action for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueRecommendation {
    /// Key into the technique catalog (e.g. "breathing_exercise").
    pub technique_id: String,
    /// The emotion/risk pairing that produced the choice.
    pub rationale: String,
}

/// Full result of analyzing one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnAnalysis {
    pub emotion: EmotionEstimate,
    pub crisis_signal: CrisisSignal,
    pub risk: RiskAssessment,
    pub technique: TechniqueRecommendation,
}

impl TurnAnalysis {
    /// The compact shape returned to callers (and printed by the CLI).
    pub fn to_response(&self) -> TurnResponse {
        TurnResponse {
            emotion_detected: self.emotion.label.as_str().to_string(),
            confidence: self.emotion.confidence,
            risk_level: self.risk.level.as_str().to_string(),
            crisis: self.risk.crisis,
            suggested_technique: self.technique.technique_id.clone(),
        }
    }
}

/// JSON response shape for one analyzed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub emotion_detected: String,
    pub confidence: f32,
    pub risk_level: String,
    pub crisis: bool,
    pub suggested_technique: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_parse_lenient() {
        assert_eq!(Emotion::parse_lenient("Anxious"), Emotion::Anxious);
        assert_eq!(Emotion::parse_lenient("  hopeless "), Emotion::Hopeless);
        assert_eq!(Emotion::parse_lenient("depressed"), Emotion::Neutral);
        assert_eq!(Emotion::parse_lenient(""), Emotion::Neutral);
    }

    #[test]
    fn test_estimate_confidence_clamped() {
        let e = EmotionEstimate::new(Emotion::Sad, 1.7, EstimateSource::Text);
        assert_eq!(e.confidence, 1.0);
        let e = EmotionEstimate::new(Emotion::Sad, -0.2, EstimateSource::Text);
        assert_eq!(e.confidence, 0.0);
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Critical > RiskLevel::High);
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
        assert!(RiskLevel::Low > RiskLevel::None);
    }

    #[test]
    fn test_bump_caps_at_high() {
        assert_eq!(RiskLevel::None.bumped(), RiskLevel::Low);
        assert_eq!(RiskLevel::Medium.bumped(), RiskLevel::High);
        assert_eq!(RiskLevel::High.bumped(), RiskLevel::High);
        assert_eq!(RiskLevel::Critical.bumped(), RiskLevel::Critical);
    }

    #[test]
    fn test_risk_level_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&RiskLevel::Critical).unwrap(),
            "\"critical\""
        );
        assert_eq!(
            serde_json::from_str::<Emotion>("\"anxious\"").unwrap(),
            Emotion::Anxious
        );
    }

    #[test]
    fn test_turn_response_shape() {
        let analysis = TurnAnalysis {
            emotion: EmotionEstimate::new(Emotion::Anxious, 0.87, EstimateSource::Fused),
            crisis_signal: CrisisSignal::none(),
            risk: RiskAssessment {
                level: RiskLevel::Medium,
                crisis: false,
                rationale: vec![],
            },
            technique: TechniqueRecommendation {
                technique_id: "breathing_exercise".to_string(),
                rationale: "anxious/medium".to_string(),
            },
        };
        let json = serde_json::to_value(analysis.to_response()).unwrap();
        assert_eq!(json["emotion_detected"], "anxious");
        assert_eq!(json["risk_level"], "medium");
        assert_eq!(json["suggested_technique"], "breathing_exercise");
    }
}
