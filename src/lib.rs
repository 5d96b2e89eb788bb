//! Emotion fusion and risk-decision engine for a conversational
//! mental-health support app.
//!
//! The pipeline for one user turn: screen the text for crisis keywords,
//! classify its emotion with a local LLM, estimate emotion from voice
//! features when present, fuse the two estimates, run the fused result
//! through the risk decision table, and pick a support technique.
//! Everything past the model call is pure and deterministic.

pub mod classifier;
pub mod config;
pub mod crisis;
pub mod engine;
pub mod fusion;
pub mod history;
pub mod llm_client;
pub mod risk;
pub mod techniques;
pub mod types;
pub mod voice;


pub use classifier::TextClassifier;
pub use config::{ConfigError, EngineConfig};
pub use engine::SupportEngine;
pub use history::SessionStore;
pub use llm_client::{LanguageModel, LlmError, OllamaClient};
pub use types::{
    ConversationTurn, CrisisSignal, Emotion, EmotionEstimate, RiskAssessment, RiskLevel,
    TurnAnalysis, TurnResponse, VoiceFeatures,
};
