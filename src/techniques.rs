//! Static therapeutic technique catalog and the recommender.
//!
//! The catalog is a fixed table of guided exercises; the recommender maps
//! (fused emotion, risk level) to one of its entries. Risk at high or above
//! always forces crisis resources, and an unrecognized lookup degrades to
//! general support. This component never fails.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Emotion, RiskLevel, TechniqueRecommendation};

pub const CRISIS_RESOURCES: &str = "crisis_resources";
pub const GENERAL_SUPPORT: &str = "general_support";

/// One guided technique in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technique {
    pub name: String,
    pub description: String,
    pub steps: Vec<String>,
}

/// Static lookup table of techniques plus the emotion mapping.
#[derive(Debug, Clone)]
pub struct TechniqueCatalog {
    techniques: BTreeMap<&'static str, Technique>,
}

impl Default for TechniqueCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn technique(name: &str, description: &str, steps: &[&str]) -> Technique {
    Technique {
        name: name.to_string(),
        description: description.to_string(),
        steps: steps.iter().map(|s| s.to_string()).collect(),
    }
}

impl TechniqueCatalog {
    pub fn new() -> Self {
        let mut techniques = BTreeMap::new();

        techniques.insert(
            "breathing_exercise",
            technique(
                "4-7-8 Breathing",
                "Calming breathing pattern to reduce acute anxiety",
                &[
                    "Sit comfortably with your back straight",
                    "Breathe in through your nose for 4 counts",
                    "Hold your breath for 7 counts",
                    "Exhale through your mouth for 8 counts",
                    "Repeat 3-4 times",
                ],
            ),
        );
        techniques.insert(
            "grounding_technique",
            technique(
                "5-4-3-2-1 Grounding",
                "Anchor attention in the present moment",
                &[
                    "Name 5 things you can see around you",
                    "Name 4 things you can physically touch",
                    "Name 3 things you can hear right now",
                    "Name 2 things you can smell",
                    "Name 1 thing you can taste",
                ],
            ),
        );
        techniques.insert(
            "cbt_reframe",
            technique(
                "Thought Challenging",
                "Question and examine a charged thought pattern",
                &[
                    "What is the specific thought you're having?",
                    "What evidence supports this thought?",
                    "What evidence contradicts it?",
                    "What would you tell a friend having this thought?",
                    "What's a more balanced way to see this?",
                ],
            ),
        );
        techniques.insert(
            CRISIS_RESOURCES,
            technique(
                "Crisis Resources",
                "Immediate support contacts and safety planning",
                &[
                    "988 Suicide & Crisis Lifeline (call or text, 24/7)",
                    "Crisis Text Line: text HOME to 741741",
                    "Emergency services: 911 if in immediate danger",
                    "If possible, reach out to someone you trust right now",
                ],
            ),
        );
        techniques.insert(
            "positive_reinforcement",
            technique(
                "Positive Reinforcement",
                "Acknowledge and build on what is going well",
                &[
                    "Name what went well and your part in it",
                    "Consider how to make more room for it",
                ],
            ),
        );
        techniques.insert(
            "maintenance_check",
            technique(
                "Maintenance Check-in",
                "Light-touch check on routines that support stability",
                &[
                    "How has sleep been this week?",
                    "Anything on the horizon you want to prepare for?",
                ],
            ),
        );
        techniques.insert(
            GENERAL_SUPPORT,
            technique(
                "General Support",
                "Open listening and validation",
                &["Tell me more about what's on your mind."],
            ),
        );

        Self { techniques }
    }

    /// Catalog entry by id, if present.
    pub fn get(&self, technique_id: &str) -> Option<&Technique> {
        self.techniques.get(technique_id)
    }

    /// Pick the technique for this emotion/risk pairing.
    pub fn recommend(&self, emotion: Emotion, risk: RiskLevel) -> TechniqueRecommendation {
        if risk >= RiskLevel::High {
            return TechniqueRecommendation {
                technique_id: CRISIS_RESOURCES.to_string(),
                rationale: format!("risk level {} forces crisis resources", risk.as_str()),
            };
        }

        let technique_id = match emotion {
            Emotion::Anxious => "breathing_exercise",
            Emotion::Sad => "grounding_technique",
            Emotion::Angry => "cbt_reframe",
            Emotion::Hopeless => CRISIS_RESOURCES,
            Emotion::Happy => "positive_reinforcement",
            Emotion::Calm => "maintenance_check",
            Emotion::Neutral => GENERAL_SUPPORT,
        };

        // A mapping target missing from the catalog degrades, never fails.
        let technique_id = if self.techniques.contains_key(technique_id) {
            technique_id
        } else {
            GENERAL_SUPPORT
        };

        TechniqueRecommendation {
            technique_id: technique_id.to_string(),
            rationale: format!("{} at risk {}", emotion.as_str(), risk.as_str()),
        }
    }
}
