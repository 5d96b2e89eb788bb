//! Voice feature normalization and the heuristic acoustic emotion scorer.
//!
//! Raw acoustic measurements arrive in physical units (Hz, wpm, seconds).
//! Normalization clamps each dimension to a fixed reference range and
//! min-max scales it to [0, 1]; missing fields take the population mean for
//! that dimension so downstream fusion always sees a complete vector.
//! Out-of-range values are clamped, never rejected.

use crate::types::{Emotion, EmotionEstimate, EstimateSource, VoiceFeatures};

/// Reference range for mean pitch, Hz. Covers typical adult speech.
pub const PITCH_RANGE: (f32, f32) = (80.0, 400.0);
/// Reference range for speech rate, words per minute.
pub const RATE_RANGE: (f32, f32) = (60.0, 250.0);
/// Reference range for average pause duration, seconds.
pub const PAUSE_RANGE: (f32, f32) = (0.0, 2.0);

/// Population-mean defaults, substituted for missing fields (raw units).
pub const DEFAULT_PITCH_HZ: f32 = 150.0;
pub const DEFAULT_ENERGY: f32 = 0.5;
pub const DEFAULT_RATE_WPM: f32 = 150.0;
pub const DEFAULT_PAUSE_SECS: f32 = 0.5;

/// Voice feature vector with every dimension scaled to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedVoice {
    pub pitch: f32,
    pub energy: f32,
    pub rate: f32,
    pub pause: f32,
}

fn scale(value: f32, range: (f32, f32)) -> f32 {
    let clamped = value.clamp(range.0, range.1);
    (clamped - range.0) / (range.1 - range.0)
}

/// Map raw features to the normalized vector. Pure; never fails.
pub fn normalize(features: &VoiceFeatures) -> NormalizedVoice {
    // NaN inputs are treated as missing.
    let field = |v: Option<f32>, default: f32| match v {
        Some(x) if x.is_finite() => x,
        _ => default,
    };

    NormalizedVoice {
        pitch: scale(field(features.pitch_mean, DEFAULT_PITCH_HZ), PITCH_RANGE),
        energy: field(features.energy, DEFAULT_ENERGY).clamp(0.0, 1.0),
        rate: scale(field(features.speech_rate, DEFAULT_RATE_WPM), RATE_RANGE),
        pause: scale(
            field(features.avg_pause_duration, DEFAULT_PAUSE_SECS),
            PAUSE_RANGE,
        ),
    }
}

/// Best score must reach this to assign a non-neutral label.
const LABEL_FLOOR: f32 = 0.3;

/// Heuristic threshold scoring over the normalized vector.
///
/// Each label accumulates fixed weight for each acoustic indicator present;
/// the highest-scoring label wins and its score becomes the confidence.
/// Hopeless is checked before sad so an extreme flat-affect profile resolves
/// to the stronger label on ties.
pub fn estimate_emotion(features: &VoiceFeatures) -> EmotionEstimate {
    let v = normalize(features);

    let hopeless: f32 = {
        let mut s = 0.0;
        if v.energy <= 0.15 {
            s += 0.4;
        }
        if v.pause >= 0.75 {
            s += 0.3;
        }
        if v.rate <= 0.2 {
            s += 0.3;
        }
        s
    };

    let sad: f32 = {
        let mut s = 0.0;
        if v.energy <= 0.3 {
            s += 0.4;
        }
        if v.pitch <= 0.25 {
            s += 0.3;
        }
        if v.pause >= 0.5 {
            s += 0.2;
        }
        if v.rate <= 0.3 {
            s += 0.2;
        }
        s
    };

    let anxious: f32 = {
        let mut s = 0.0;
        if v.rate >= 0.6 {
            s += 0.3;
        }
        if v.energy >= 0.6 {
            s += 0.3;
        }
        if v.pitch >= 0.4 {
            s += 0.2;
        }
        if v.pause <= 0.15 {
            s += 0.2;
        }
        s
    };

    let angry: f32 = {
        let mut s = 0.0;
        if v.energy >= 0.85 {
            s += 0.4;
        }
        if v.pitch >= 0.55 {
            s += 0.3;
        }
        if v.rate >= 0.7 {
            s += 0.3;
        }
        s
    };

    let happy: f32 = {
        let mut s = 0.0;
        if (0.55..0.85).contains(&v.energy) {
            s += 0.3;
        }
        if (0.3..0.6).contains(&v.pitch) {
            s += 0.2;
        }
        if (0.45..0.65).contains(&v.rate) {
            s += 0.3;
        }
        if v.pause <= 0.3 {
            s += 0.1;
        }
        s
    };

    let calm: f32 = {
        let mut s = 0.0;
        if (0.3..0.6).contains(&v.energy) {
            s += 0.3;
        }
        if (0.3..0.55).contains(&v.rate) {
            s += 0.3;
        }
        if (0.15..0.4).contains(&v.pause) {
            s += 0.2;
        }
        if v.pitch <= 0.45 {
            s += 0.2;
        }
        s
    };

    // Scores are capped at 1.0 before comparison; earlier entries win ties.
    let scored = [
        (Emotion::Hopeless, hopeless.min(1.0)),
        (Emotion::Sad, sad.min(1.0)),
        (Emotion::Anxious, anxious.min(1.0)),
        (Emotion::Angry, angry.min(1.0)),
        (Emotion::Happy, happy.min(1.0)),
        (Emotion::Calm, calm.min(1.0)),
    ];

    let (label, score) = scored
        .iter()
        .copied()
        .fold((Emotion::Neutral, 0.0_f32), |best, cand| {
            if cand.1 > best.1 {
                cand
            } else {
                best
            }
        });

    if score < LABEL_FLOOR {
        EmotionEstimate::new(Emotion::Neutral, score, EstimateSource::Voice)
    } else {
        EmotionEstimate::new(label, score, EstimateSource::Voice)
    }
}
