//! Query-intent routing — decides which backend(s) answer a question.
//!
//! [`Classifier`] is the seam: the orchestrator only sees
//! `classify(question) -> RouteDecision`, so the keyword strategy can be
//! swapped for a learned classifier without touching anything downstream.
//!
//! The keyword strategy scores a question against two phrase lexicons and
//! routes to whichever category scores higher; ties (including two zero
//! scores) consult both backends.

use serde::Serialize;

// ── Decision ──────────────────────────────────────────────────────────────────

/// Which backend(s) a question is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    /// Structured business-data assistant only.
    Structured,
    /// Semantic document index only.
    Semantic,
    /// Both backends, merged into one reply.
    Both,
}

// ── Classifier seam ───────────────────────────────────────────────────────────

/// Intent-classification strategy.
///
/// Implementations must be pure with respect to the question: no I/O, no
/// state, deterministic output.
pub trait Classifier: Send + Sync {
    fn classify(&self, question: &str) -> RouteDecision;
}

// ── Lexicon ───────────────────────────────────────────────────────────────────

/// A fixed set of lower-case phrases for one intent category.
///
/// Built once at startup from config; read-only thereafter.
#[derive(Debug, Clone)]
pub struct Lexicon {
    phrases: Vec<String>,
}

impl Lexicon {
    /// Phrases are lower-cased on construction; empty phrases are discarded
    /// (an empty phrase would match every question).
    pub fn new(phrases: impl IntoIterator<Item = String>) -> Self {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.to_lowercase())
                .filter(|p| !p.trim().is_empty())
                .collect(),
        }
    }

    /// Number of *distinct* phrases present in `question_lower`.
    ///
    /// A phrase occurring several times still counts once — the score is
    /// phrase presence, not occurrence count. Independent of phrase order.
    fn score(&self, question_lower: &str) -> usize {
        self.phrases
            .iter()
            .filter(|p| question_lower.contains(p.as_str()))
            .count()
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

// ── Keyword classifier ────────────────────────────────────────────────────────

/// Lexicon-scoring classifier — the production strategy.
pub struct KeywordClassifier {
    structured: Lexicon,
    semantic: Lexicon,
}

impl KeywordClassifier {
    pub fn new(structured: Lexicon, semantic: Lexicon) -> Self {
        Self { structured, semantic }
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, question: &str) -> RouteDecision {
        let lowered = question.to_lowercase();
        let structured_score = self.structured.score(&lowered);
        let semantic_score = self.semantic.score(&lowered);

        if structured_score > semantic_score {
            RouteDecision::Structured
        } else if semantic_score > structured_score {
            RouteDecision::Semantic
        } else {
            // Equal scores — including the no-signal 0–0 case — consult both
            // for comprehensive coverage.
            RouteDecision::Both
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> KeywordClassifier {
        KeywordClassifier::new(
            Lexicon::new(["territory".to_string(), "ytd revenue".to_string(), "migration status".to_string()]),
            Lexicon::new(["explain".to_string(), "best practices".to_string(), "overview".to_string()]),
        )
    }

    #[test]
    fn structured_phrases_route_structured() {
        let c = classifier();
        assert_eq!(
            c.classify("migration status by territory please"),
            RouteDecision::Structured
        );
    }

    #[test]
    fn semantic_phrases_route_semantic() {
        let c = classifier();
        assert_eq!(
            c.classify("explain the best practices here"),
            RouteDecision::Semantic
        );
    }

    #[test]
    fn empty_question_routes_both() {
        assert_eq!(classifier().classify(""), RouteDecision::Both);
    }

    #[test]
    fn no_signal_routes_both() {
        assert_eq!(
            classifier().classify("hello there, anything new?"),
            RouteDecision::Both
        );
    }

    #[test]
    fn equal_scores_route_both() {
        // One phrase from each lexicon.
        assert_eq!(
            classifier().classify("explain the territory split"),
            RouteDecision::Both
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(
            classifier().classify("YTD REVENUE for the TERRITORY"),
            RouteDecision::Structured
        );
    }

    #[test]
    fn repeated_phrase_counts_once() {
        // "territory" appears three times (score 1); two distinct semantic
        // phrases outweigh it.
        let c = classifier();
        assert_eq!(
            c.classify("territory territory territory — explain the overview"),
            RouteDecision::Semantic
        );
    }

    #[test]
    fn empty_phrases_are_discarded() {
        let lex = Lexicon::new(["".to_string(), "  ".to_string(), "real".to_string()]);
        assert_eq!(lex.len(), 1);
    }

    #[test]
    fn phrases_lowercased_on_construction() {
        let c = KeywordClassifier::new(
            Lexicon::new(["Territory".to_string()]),
            Lexicon::new(Vec::new()),
        );
        assert_eq!(c.classify("territory report"), RouteDecision::Structured);
    }
}
