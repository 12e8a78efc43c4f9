//! Request classifier
//!
//! Turns free text into a [`Category`] with a confidence value:
//!
//! ```text
//! text ──► empty? ──► Unknown (0.0)
//!            │
//!            ▼
//!      NonItFilter ──► NonIt (0.0)
//!            │
//!            ▼
//!   score every CategoryRule (table order)
//!     +1 per keyword, +3 per pattern, context gate first
//!            │
//!            ├─ nothing scored ──► NoMatchPolicy category (0.0)
//!            ▼
//!   highest score wins (first rule wins ties)
//!            │
//!            ▼
//!   confidence_for_score(score)
//! ```
//!
//! The classifier holds only immutable tables, so one instance can be shared
//! across threads without locking.

use crate::category::Category;
use crate::non_it::NonItFilter;
use crate::rules::CategoryRuleTable;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Confidence bands that downstream escalation and UI logic key off.
pub mod bands {
    /// Below this the escalation table routes to human review.
    pub const LOW: f64 = 0.3;
    /// Below this a critical ticket counts as unclassified.
    pub const MEDIUM: f64 = 0.5;
    pub const GOOD: f64 = 0.6;
    pub const HIGH: f64 = 0.7;
}

/// Which sentinel to report when no category scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchPolicy {
    /// Treat the request as outside IT support
    #[default]
    NonIt,
    /// Treat the request as unclassifiable IT work
    Unknown,
}

impl NoMatchPolicy {
    pub fn category(&self) -> Category {
        match self {
            Self::NonIt => Category::NonIt,
            Self::Unknown => Category::Unknown,
        }
    }
}

impl std::str::FromStr for NoMatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "non_it" | "non_it_request" => Ok(Self::NonIt),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("expected 'non_it' or 'unknown', got '{}'", other)),
        }
    }
}

/// Result of classifying one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,
    /// 0.0 to 1.0
    pub confidence: f64,
    /// Matched keywords, then `pattern:<regex>` tags, in match order
    pub matched_terms: Vec<String>,
    pub reasoning: String,
}

impl ClassificationResult {
    fn sentinel(category: Category, reasoning: &str) -> Self {
        Self {
            category,
            confidence: 0.0,
            matched_terms: Vec::new(),
            reasoning: reasoning.to_string(),
        }
    }

    pub fn is_high_confidence(&self) -> bool {
        self.confidence > bands::HIGH
    }
}

/// Map a winning score to a confidence value.
///
/// Monotonic step function: 1 → 0.35, 2 → 0.55, 3 → 0.65, 4 → 0.75,
/// 5 → 0.80, 6 → 0.85, then +0.02 per point capped at 0.95.
pub fn confidence_for_score(score: u32) -> f64 {
    let s = f64::from(score);
    if score >= 6 {
        (0.85 + (s - 6.0) * 0.02).min(0.95)
    } else if score >= 4 {
        0.75 + (s - 4.0) * 0.05
    } else if score >= 2 {
        0.55 + (s - 2.0) * 0.10
    } else if score == 1 {
        0.35
    } else {
        0.1
    }
}

/// Keyword/pattern classifier over an immutable rule table.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: CategoryRuleTable,
    filter: NonItFilter,
    no_match: NoMatchPolicy,
}

impl Classifier {
    /// Classifier with the built-in rule table and filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the category rule table.
    pub fn with_rules(mut self, rules: CategoryRuleTable) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the out-of-domain filter.
    pub fn with_filter(mut self, filter: NonItFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Choose the sentinel for requests nothing scores on.
    pub fn with_no_match(mut self, policy: NoMatchPolicy) -> Self {
        self.no_match = policy;
        self
    }

    pub fn rules(&self) -> &CategoryRuleTable {
        &self.rules
    }

    pub fn no_match_policy(&self) -> NoMatchPolicy {
        self.no_match
    }

    pub fn category_rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Classify a request that may be absent.
    pub fn classify_opt(&self, text: Option<&str>) -> ClassificationResult {
        match text {
            Some(text) => self.classify(text),
            None => ClassificationResult::sentinel(Category::Unknown, "empty or invalid request"),
        }
    }

    /// Classify a request. Never fails; unusable input maps to a sentinel.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        if text.trim().is_empty() {
            return ClassificationResult::sentinel(Category::Unknown, "empty or invalid request");
        }

        if self.filter.is_out_of_domain(text) {
            debug!("request rejected by non-IT filter");
            return ClassificationResult::sentinel(Category::NonIt, "non-IT related request");
        }

        let lower = text.to_lowercase();
        let mut best: Option<(Category, u32, Vec<String>)> = None;

        for rule in self.rules.rules() {
            let Some(scored) = rule.score(&lower) else {
                debug!(category = %rule.category(), "skipped: no required context");
                continue;
            };
            if scored.score == 0 {
                continue;
            }
            debug!(category = %rule.category(), score = scored.score, "category scored");

            let beats = best
                .as_ref()
                .map_or(true, |(_, top, _)| scored.score > *top);
            if beats {
                best = Some((rule.category(), scored.score, scored.matched_terms));
            }
        }

        let Some((category, score, matched_terms)) = best else {
            return ClassificationResult::sentinel(
                self.no_match.category(),
                "no matching indicators found",
            );
        };

        ClassificationResult {
            category,
            confidence: confidence_for_score(score),
            matched_terms,
            reasoning: format!("matched {} indicators for {}", score, category),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::CategoryRuleSpec;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_confidence_check_values() {
        let expected = [
            (0, 0.1),
            (1, 0.35),
            (2, 0.55),
            (3, 0.65),
            (4, 0.75),
            (5, 0.80),
            (6, 0.85),
            (7, 0.87),
            (10, 0.93),
            (11, 0.95),
            (20, 0.95),
        ];
        for (score, confidence) in expected {
            assert!(
                approx(confidence_for_score(score), confidence),
                "score {} gave {}",
                score,
                confidence_for_score(score)
            );
        }
    }

    #[test]
    fn test_confidence_monotonic() {
        let mut previous = confidence_for_score(0);
        for score in 1..50 {
            let current = confidence_for_score(score);
            assert!(current >= previous, "dropped at score {}", score);
            assert!(current <= 0.95);
            previous = current;
        }
    }

    #[test]
    fn test_empty_and_whitespace() {
        let classifier = Classifier::new();
        for text in ["", "   ", "\n\t"] {
            let result = classifier.classify(text);
            assert_eq!(result.category, Category::Unknown);
            assert_eq!(result.confidence, 0.0);
            assert!(result.matched_terms.is_empty());
            assert_eq!(result.reasoning, "empty or invalid request");
        }
        assert_eq!(classifier.classify_opt(None).category, Category::Unknown);
    }

    #[test]
    fn test_password_scenario() {
        let result =
            Classifier::new().classify("I forgot my password and can't log into my computer");
        assert_eq!(result.category, Category::PasswordReset);
        assert!(result.confidence > 0.7);
        assert_eq!(result.matched_terms[0], "password");
        assert!(result
            .matched_terms
            .contains(&"pattern:forgot.*password".to_string()));
        assert!(result.reasoning.starts_with("matched "));
        assert!(result.reasoning.ends_with("for password_reset"));
    }

    #[test]
    fn test_cafeteria_is_non_it() {
        let result = Classifier::new().classify("Where can I find the cafeteria menu?");
        assert_eq!(result.category, Category::NonIt);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.reasoning, "non-IT related request");
    }

    #[test]
    fn test_no_match_policy() {
        let text = "password for my gym membership";
        assert_eq!(Classifier::new().classify(text).category, Category::NonIt);

        let result = Classifier::new()
            .with_no_match(NoMatchPolicy::Unknown)
            .classify(text);
        assert_eq!(result.category, Category::Unknown);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.reasoning, "no matching indicators found");
    }

    #[test]
    fn test_tie_goes_to_first_rule() {
        let specs = vec![
            CategoryRuleSpec {
                category: Category::EmailConfiguration,
                keywords: vec!["sync".into()],
                patterns: vec![],
                required_context: vec![],
            },
            CategoryRuleSpec {
                category: Category::NetworkConnectivity,
                keywords: vec!["sync".into()],
                patterns: vec![],
                required_context: vec![],
            },
        ];
        let classifier = Classifier::new()
            .with_rules(CategoryRuleTable::from_specs(&specs).unwrap())
            .with_filter(NonItFilter::disabled());
        assert_eq!(classifier.category_rule_count(), 2);
        let result = classifier.classify("sync is broken");
        assert_eq!(result.category, Category::EmailConfiguration);
        assert!(approx(result.confidence, 0.35));
    }

    #[test]
    fn test_classify_is_idempotent() {
        let classifier = Classifier::new();
        let text = "My work laptop screen is flickering and won't display properly";
        assert_eq!(classifier.classify(text), classifier.classify(text));
    }

    #[test]
    fn test_no_match_policy_parse() {
        assert_eq!("unknown".parse::<NoMatchPolicy>().unwrap(), NoMatchPolicy::Unknown);
        assert_eq!("non_it".parse::<NoMatchPolicy>().unwrap(), NoMatchPolicy::NonIt);
        assert!("maybe".parse::<NoMatchPolicy>().is_err());
    }
}
