//! Out-of-domain pre-filter
//!
//! Cheap check run before category scoring so that requests which merely
//! mention an IT-sounding word ("coffee on my laptop") are not routed as IT.

use crate::error::{TriageError, TriageResult};
use regex::Regex;
use std::sync::LazyLock;

/// Distinct indicator hits needed to reject a request. One hit is not enough.
pub const INDICATOR_THRESHOLD: usize = 2;

const DEFAULT_INDICATORS: &[&str] = &[
    // food and dining
    "cafeteria",
    "menu",
    "food",
    "lunch",
    "dinner",
    "restaurant",
    "eat",
    "dining",
    "kitchen",
    "coffee",
    "tea",
    "snack",
    "meal",
    "breakfast",
    // hr and admin
    "vacation",
    "holiday",
    "payroll",
    "salary",
    "benefits",
    "hr",
    "human resources",
    "leave",
    "sick day",
    "time off",
    "pto",
    "401k",
    "insurance",
    // facilities
    "parking",
    "elevator",
    "restroom",
    "bathroom",
    "cleaning",
    "temperature",
    "air conditioning",
    "heating",
    "building",
    "office space",
    "desk",
    // personal
    "personal",
    "home",
    "family",
    "weather",
    "sports",
    "news",
    "entertainment",
    "shopping",
    "recipe",
    "health",
    "medical",
    "doctor",
    // general questions
    "what time",
    "when is",
    "where is",
    "directions",
    "location",
    "address",
    "phone number",
    "contact",
    "who is",
    "biography",
    // hypotheticals
    "what if",
    "what would happen",
    "suppose",
    "imagine",
    "hypothetical",
    "if i",
    "what happens when",
    "spill",
    "drop",
    "accidentally",
];

const DEFAULT_PATTERNS: &[&str] = &[
    r"cafeteria.*menu",
    r"where.*is.*the.*cafeteria",
    r"what.*time.*does.*cafeteria",
    r"coffee.*spill",
    r"what.*if.*spill",
    r"what.*would.*happen.*if",
    r"parking.*space",
    r"how.*to.*get.*to",
    r"when.*does.*cafeteria",
    r"where.*can.*i.*find.*menu",
];

static DEFAULT_FILTER: LazyLock<NonItFilter> = LazyLock::new(|| {
    NonItFilter::new(DEFAULT_INDICATORS, DEFAULT_PATTERNS)
        .expect("built-in non-IT patterns should compile")
});

/// Off-topic indicator terms and patterns.
#[derive(Debug, Clone)]
pub struct NonItFilter {
    indicators: Vec<String>,
    patterns: Vec<Regex>,
}

impl NonItFilter {
    /// Build a filter. Indicators are lower-cased and de-duplicated so each
    /// distinct term counts at most once toward the threshold.
    pub fn new<S: AsRef<str>>(indicators: &[S], patterns: &[S]) -> TriageResult<Self> {
        let mut terms: Vec<String> = Vec::with_capacity(indicators.len());
        for indicator in indicators {
            let term = indicator.as_ref().trim().to_lowercase();
            if !term.is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        }

        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|source| TriageError::InvalidPattern {
                    owner: "non-IT filter".to_string(),
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<TriageResult<Vec<_>>>()?;

        Ok(Self {
            indicators: terms,
            patterns,
        })
    }

    /// A filter that never rejects anything.
    pub fn disabled() -> Self {
        Self {
            indicators: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Indicator terms found in already lower-cased text.
    pub fn indicator_hits<'a>(&'a self, lower: &str) -> Vec<&'a str> {
        self.indicators
            .iter()
            .filter(|term| lower.contains(term.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// First off-topic pattern matching already lower-cased text.
    pub fn matching_pattern(&self, lower: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.is_match(lower))
            .map(|p| p.as_str())
    }

    /// Whether the request is outside the IT support domain.
    pub fn is_out_of_domain(&self, text: &str) -> bool {
        let lower = text.to_lowercase();

        if self.indicator_hits(&lower).len() >= INDICATOR_THRESHOLD {
            return true;
        }

        self.matching_pattern(&lower).is_some()
    }

    pub fn indicator_count(&self) -> usize {
        self.indicators.len()
    }
}

impl Default for NonItFilter {
    fn default() -> Self {
        DEFAULT_FILTER.clone()
    }
}
