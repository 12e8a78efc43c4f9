//! Category rule table
//!
//! Keyword, pattern and required-context terms per category. Tables are pure
//! data: compiled once, never mutated, and injectable so tests can drive the
//! classifier with alternative rule sets.

use crate::category::Category;
use crate::error::{TriageError, TriageResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

/// Score added per matched keyword.
pub const KEYWORD_WEIGHT: u32 = 1;

/// Score added per matched pattern.
pub const PATTERN_WEIGHT: u32 = 3;

/// Uncompiled rule, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRuleSpec {
    pub category: Category,
    pub keywords: Vec<String>,
    pub patterns: Vec<String>,
    /// At least one of these must appear for the rule to score. Empty = always passes.
    #[serde(default)]
    pub required_context: Vec<String>,
}

impl CategoryRuleSpec {
    fn from_static(
        category: Category,
        keywords: &[&str],
        patterns: &[&str],
        required_context: &[&str],
    ) -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            category,
            keywords: owned(keywords),
            patterns: owned(patterns),
            required_context: owned(required_context),
        }
    }
}

/// Outcome of scoring one rule against a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleScore {
    pub score: u32,
    /// Keywords first, then `pattern:<regex>` tags, in match order.
    pub matched_terms: Vec<String>,
}

/// Compiled rule for one category.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    category: Category,
    keywords: Vec<String>,
    patterns: Vec<Regex>,
    required_context: Vec<String>,
}

impl CategoryRule {
    /// Compile a spec. Terms are lower-cased and de-duplicated in order.
    pub fn compile(spec: &CategoryRuleSpec) -> TriageResult<Self> {
        if spec.category.is_sentinel() {
            return Err(TriageError::SentinelCategory(spec.category.to_string()));
        }

        let mut patterns = Vec::with_capacity(spec.patterns.len());
        for pattern in dedup_terms(&spec.patterns, false) {
            let regex = Regex::new(&pattern).map_err(|source| TriageError::InvalidPattern {
                owner: spec.category.to_string(),
                pattern: pattern.clone(),
                source,
            })?;
            patterns.push(regex);
        }

        Ok(Self {
            category: spec.category,
            keywords: dedup_terms(&spec.keywords, true),
            patterns,
            required_context: dedup_terms(&spec.required_context, true),
        })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|r| r.as_str())
    }

    pub fn required_context(&self) -> &[String] {
        &self.required_context
    }

    /// Whether the lower-cased request carries enough context for this rule.
    pub fn has_context(&self, lower: &str) -> bool {
        self.required_context.is_empty()
            || self.required_context.iter().any(|term| lower.contains(term.as_str()))
    }

    /// Score a lower-cased request. `None` when the context gate fails.
    pub fn score(&self, lower: &str) -> Option<RuleScore> {
        if !self.has_context(lower) {
            return None;
        }

        let mut score = 0;
        let mut matched_terms = Vec::new();

        for keyword in &self.keywords {
            if lower.contains(keyword.as_str()) {
                score += KEYWORD_WEIGHT;
                matched_terms.push(keyword.clone());
            }
        }

        for pattern in &self.patterns {
            if pattern.is_match(lower) {
                score += PATTERN_WEIGHT;
                matched_terms.push(format!("pattern:{}", pattern.as_str()));
            }
        }

        Some(RuleScore {
            score,
            matched_terms,
        })
    }
}

fn dedup_terms(terms: &[String], lowercase: bool) -> Vec<String> {
    let mut seen = Vec::with_capacity(terms.len());
    for term in terms {
        let term = if lowercase {
            term.trim().to_lowercase()
        } else {
            term.clone()
        };
        if !term.is_empty() && !seen.contains(&term) {
            seen.push(term);
        }
    }
    seen
}

/// Ordered, immutable set of category rules.
#[derive(Debug, Clone)]
pub struct CategoryRuleTable {
    rules: Vec<CategoryRule>,
}

impl CategoryRuleTable {
    /// Compile specs in the given order. Order decides ties.
    pub fn from_specs(specs: &[CategoryRuleSpec]) -> TriageResult<Self> {
        let mut rules: Vec<CategoryRule> = Vec::with_capacity(specs.len());
        for spec in specs {
            if rules.iter().any(|r| r.category == spec.category) {
                return Err(TriageError::DuplicateCategory(spec.category.to_string()));
            }
            rules.push(CategoryRule::compile(spec)?);
        }
        Ok(Self { rules })
    }

    /// Parse a JSON array of [`CategoryRuleSpec`].
    pub fn from_json(json: &str) -> TriageResult<Self> {
        let specs: Vec<CategoryRuleSpec> = serde_json::from_str(json)?;
        Self::from_specs(&specs)
    }

    pub fn from_file(path: impl AsRef<Path>) -> TriageResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| TriageError::io(path, e))?;
        Self::from_json(&json)
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, category: Category) -> Option<&CategoryRule> {
        self.rules.iter().find(|r| r.category == category)
    }
}

impl Default for CategoryRuleTable {
    fn default() -> Self {
        DEFAULT_TABLE.clone()
    }
}

static DEFAULT_TABLE: LazyLock<CategoryRuleTable> = LazyLock::new(|| {
    CategoryRuleTable::from_specs(&default_specs()).expect("built-in category rules should compile")
});

/// Built-in rules, in tie-break order.
pub fn default_specs() -> Vec<CategoryRuleSpec> {
    vec![
        CategoryRuleSpec::from_static(
            Category::PasswordReset,
            &[
                "password",
                "login",
                "forgot",
                "reset",
                "unlock",
                "locked out",
                "account locked",
                "sign in",
                "authentication",
                "credentials",
                "can't log in",
                "unable to login",
                "access denied",
            ],
            &[
                r"forgot.*password",
                r"can't.*log.*in",
                r"unable.*to.*log",
                r"reset.*password",
                r"locked.*out",
                r"login.*problem",
                r"password.*expired",
                r"authentication.*fail",
            ],
            &["computer", "system", "account", "work", "login", "access"],
        ),
        CategoryRuleSpec::from_static(
            Category::SoftwareInstallation,
            &[
                "install",
                "setup",
                "software",
                "application",
                "app",
                "program",
                "download",
                "upgrade",
                "update",
                "configure",
                "installation",
                "installer",
                "setup wizard",
                "deploy",
            ],
            &[
                r"install.*software",
                r"setup.*application",
                r"installation.*error",
                r"can't.*install",
                r"need.*to.*install",
                r"how.*to.*install",
                r"software.*installation",
            ],
            &["software", "program", "application", "computer", "work", "laptop"],
        ),
        CategoryRuleSpec::from_static(
            Category::HardwareFailure,
            &[
                "laptop",
                "computer",
                "screen",
                "monitor",
                "keyboard",
                "mouse",
                "broken",
                "damaged",
                "hardware",
                "device",
                "flickering",
                "black screen",
                "not working",
                "died",
                "failed",
                "malfunction",
            ],
            &[
                r"screen.*flickering",
                r"laptop.*broken",
                r"computer.*not.*working",
                r"hardware.*failure",
                r"monitor.*black",
                r"device.*malfunction",
                r"won't.*turn.*on",
            ],
            &["computer", "laptop", "device", "work", "office"],
        ),
        CategoryRuleSpec::from_static(
            Category::NetworkConnectivity,
            &[
                "network",
                "internet",
                "wifi",
                "connection",
                "connectivity",
                "vpn",
                "can't connect",
                "no internet",
                "offline",
                "disconnect",
                "ethernet",
                "network adapter",
            ],
            &[
                r"can't.*connect",
                r"no.*internet",
                r"wifi.*problem",
                r"network.*issue",
                r"vpn.*not.*working",
                r"connection.*failed",
                r"internet.*down",
            ],
            &["network", "internet", "wifi", "connection", "work", "office"],
        ),
        CategoryRuleSpec::from_static(
            Category::EmailConfiguration,
            &[
                "email",
                "outlook",
                "mail",
                "sync",
                "syncing",
                "configuration",
                "distribution list",
                "mailbox",
                "messages",
                "receiving",
                "exchange",
                "smtp",
                "imap",
            ],
            &[
                r"email.*not.*sync",
                r"outlook.*problem",
                r"not.*receiving.*email",
                r"mail.*configuration",
                r"distribution.*list",
                r"email.*setup",
            ],
            &["email", "work", "office", "business"],
        ),
        CategoryRuleSpec::from_static(
            Category::SecurityIncident,
            &[
                "security",
                "virus",
                "malware",
                "suspicious",
                "hacked",
                "hack",
                "phishing",
                "spam",
                "pop-up",
                "suspicious email",
                "incident",
                "breach",
                "threat",
                "attack",
            ],
            &[
                r"suspicious.*email",
                r"think.*hacked",
                r"security.*incident",
                r"malware.*infection",
                r"strange.*pop.*up",
                r"virus.*detected",
                r"security.*breach",
            ],
            &["computer", "system", "work", "security"],
        ),
        CategoryRuleSpec::from_static(
            Category::PolicyQuestion,
            &[
                "policy",
                "procedure",
                "allowed",
                "permission",
                "approval",
                "what's the policy",
                "company policy",
                "guidelines",
                "rules",
                "compliance",
                "regulation",
                "standard",
            ],
            &[
                r"what.*policy",
                r"company.*policy",
                r"need.*approval",
                r"allowed.*to",
                r"policy.*for",
                r"compliance.*requirement",
            ],
            &["company", "work", "business", "office", "it", "technology"],
        ),
    ]
}
