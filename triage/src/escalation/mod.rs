//! Escalation: deterministic routing of tickets to human attention
//!
//! ```text
//! Ticket ──► every EscalationRule (all conditions must pass)
//!               │
//!               ├─ none matched ──► should_escalate = false
//!               ▼
//!        sort matches by priority (critical, high, medium, low)
//!               │
//!               ▼
//!        first match governs level / contact / SLA
//! ```
//!
//! Conditions are a closed set of variants (`Equals`, `LessThan`,
//! `GreaterThan`, `NumberEquals`, `KeywordsAny`), so an unknown operator is a
//! load-time error instead of a silent no-op.

pub mod engine;
pub mod rule;
pub mod ticket;

pub use engine::{BatchSummary, EscalationAction, EscalationDecision, EscalationEngine};
pub use rule::{
    default_rules, Condition, EscalationLevel, EscalationPriority, EscalationReason,
    EscalationRule, EscalationRuleSet,
};
pub use ticket::{Ticket, KEYWORDS_FIELD, TEXT_FIELDS};
