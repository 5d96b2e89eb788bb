//! Text emotion classification.
//!
//! Two independent passes over each turn of user text:
//! 1. crisis-keyword screening (`crisis::CrisisScreen`): synchronous,
//!    deterministic, never talks to the model;
//! 2. semantic classification: a constrained prompt to the language model
//!    asking for one label from the closed set plus a confidence.
//!
//! The semantic pass is strictly fail-soft: an error, timeout, or reply the
//! parser cannot make sense of degrades to `neutral`/`0.0` and is logged,
//! never surfaced to the caller. The keyword pass is unaffected either way.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::crisis::CrisisScreen;
use crate::llm_client::LanguageModel;
use crate::types::{ConversationTurn, CrisisSignal, Emotion, EmotionEstimate, EstimateSource};

/// How many prior turns are summarized into the prompt.
const PROMPT_HISTORY_TURNS: usize = 3;

/// Output of classifying one turn of text.
#[derive(Debug, Clone)]
pub struct TextAnalysis {
    pub estimate: EmotionEstimate,
    pub crisis: CrisisSignal,
}

pub struct TextClassifier {
    screen: CrisisScreen,
}

/// Expected JSON body inside the model's reply.
#[derive(Debug, Deserialize)]
struct ModelReply {
    emotion: String,
    confidence: f32,
}

impl TextClassifier {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            screen: CrisisScreen::new(&config.crisis_keywords),
        }
    }

    /// Classify one turn. The crisis signal is computed first and is
    /// independent of whatever the model does.
    pub async fn classify(
        &self,
        model: &dyn LanguageModel,
        text: &str,
        history: &[ConversationTurn],
    ) -> TextAnalysis {
        let crisis = self.screen.screen(text);

        let prompt = build_classification_prompt(text, history);
        let estimate = match model.complete(&prompt).await {
            Ok(reply) => match parse_model_reply(&reply) {
                Some(estimate) => estimate,
                None => {
                    warn!("Unparsable emotion reply, falling back to neutral: {:?}", reply);
                    EmotionEstimate::neutral(EstimateSource::Text)
                }
            },
            Err(e) => {
                warn!("Emotion classification call failed, falling back to neutral: {}", e);
                EmotionEstimate::neutral(EstimateSource::Text)
            }
        };

        debug!(
            "Text classification: {} ({:.2}), keyword match: {}",
            estimate.label.as_str(),
            estimate.confidence,
            crisis.matched
        );

        TextAnalysis { estimate, crisis }
    }
}

/// Build the constrained classification prompt.
pub fn build_classification_prompt(text: &str, history: &[ConversationTurn]) -> String {
    let labels = Emotion::ALL
        .iter()
        .map(|e| e.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut context = String::new();
    let recent = history.iter().rev().take(PROMPT_HISTORY_TURNS).rev();
    for turn in recent {
        context.push_str(&format!(
            "- \"{}\" (read as {})\n",
            turn.text,
            turn.emotion.label.as_str()
        ));
    }
    let context_block = if context.is_empty() {
        String::from("(first message of the session)\n")
    } else {
        context
    };

    format!(
        r#"You are an emotion classifier for a mental health support companion.

Classify the emotional state expressed in the user's message.

Recent messages this session:
{context_block}
User message: "{text}"

Reply with ONLY a JSON object, no other text:
{{"emotion": "<one of: {labels}>", "confidence": <number between 0.0 and 1.0>}}"#,
    )
}

/// Extract and validate the model's JSON reply.
///
/// Models wrap JSON in prose or code fences often enough that we scan for
/// the outermost braces rather than parsing the reply verbatim. An unknown
/// label normalizes to neutral (keeping the reported confidence); anything
/// structurally unusable returns `None`.
pub fn parse_model_reply(reply: &str) -> Option<EmotionEstimate> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }

    let parsed: ModelReply = serde_json::from_str(&reply[start..=end]).ok()?;
    if !parsed.confidence.is_finite() {
        return None;
    }

    let label = Emotion::parse_lenient(&parsed.emotion);
    Some(EmotionEstimate::new(
        label,
        parsed.confidence,
        EstimateSource::Text,
    ))
}
