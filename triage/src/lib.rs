//! Help-desk triage core
//!
//! Deterministic, rule-driven decisions for IT support requests:
//! - [`Classifier`]: free text → [`Category`] + confidence, behind a
//!   [`NonItFilter`] that rejects off-topic requests
//! - [`EscalationEngine`]: ticket fields → [`EscalationDecision`]
//!
//! Both hold only rule tables compiled at construction and are safe to share
//! across threads. Neither performs I/O at call time; file loading
//! ([`CategoryCatalog`], [`CategoryRuleTable::from_file`],
//! [`EscalationRuleSet::from_file`]) happens once at startup.
//!
//! # Usage
//!
//! ```rust
//! use triage::{Classifier, EscalationEngine, Ticket};
//!
//! let classifier = Classifier::new();
//! let result = classifier.classify("I forgot my password and can't log into my computer");
//!
//! let ticket = Ticket::new()
//!     .with("category", result.category.as_str())
//!     .with("classification_confidence", result.confidence);
//! let decision = EscalationEngine::new().evaluate(&ticket);
//! assert!(!decision.should_escalate);
//! ```

pub mod catalog;
pub mod category;
pub mod classifier;
pub mod error;
pub mod escalation;
pub mod non_it;
pub mod rules;

pub use catalog::{CategoryCatalog, CategoryInfo};
pub use category::Category;
pub use classifier::{confidence_for_score, ClassificationResult, Classifier, NoMatchPolicy};
pub use error::{TriageError, TriageResult};
pub use escalation::{
    BatchSummary, Condition, EscalationAction, EscalationDecision, EscalationEngine,
    EscalationLevel, EscalationPriority, EscalationReason, EscalationRule, EscalationRuleSet,
    Ticket,
};
pub use non_it::NonItFilter;
pub use rules::{CategoryRule, CategoryRuleSpec, CategoryRuleTable};
