//! Lexical crisis-keyword screening.
//!
//! This runs before (and independently of) the language model: it is
//! synchronous, deterministic, and cheap, so a dead or confused model can
//! never mask a direct crisis statement. Matching is token-boundary phrase
//! matching over lowercased, punctuation-stripped text; in-word apostrophes
//! are preserved so contractions like "can't" match as written.

use crate::config::CrisisKeyword;
use crate::types::{CrisisSignal, Severity};
use std::collections::BTreeSet;

/// Compiled screening over a configured keyword list.
#[derive(Debug, Clone)]
pub struct CrisisScreen {
    /// (normalized term, original term, severity)
    terms: Vec<(String, String, Severity)>,
}

/// Lowercase, strip punctuation except in-word apostrophes, collapse
/// whitespace runs to single spaces.
fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for c in text.chars() {
        if c.is_alphanumeric() || c == '\'' || c == '\u{2019}' {
            let c = if c == '\u{2019}' { '\'' } else { c };
            for lc in c.to_lowercase() {
                out.push(lc);
            }
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

impl CrisisScreen {
    pub fn new(keywords: &[CrisisKeyword]) -> Self {
        let terms = keywords
            .iter()
            .filter(|k| !k.term.trim().is_empty())
            .map(|k| (normalize_text(&k.term), k.term.clone(), k.severity))
            .collect();
        Self { terms }
    }

    /// Screen one turn of user text. Returns every matched term; the
    /// severity hint is the highest severity among the matches.
    pub fn screen(&self, text: &str) -> CrisisSignal {
        let haystack = format!(" {} ", normalize_text(text));

        let mut matched_terms = BTreeSet::new();
        let mut severity = Severity::Low;
        for (normalized, original, term_severity) in &self.terms {
            let needle = format!(" {} ", normalized);
            if haystack.contains(&needle) {
                matched_terms.insert(original.clone());
                severity = severity.max(*term_severity);
            }
        }

        CrisisSignal {
            matched: !matched_terms.is_empty(),
            matched_terms,
            severity_hint: severity,
        }
    }
}
