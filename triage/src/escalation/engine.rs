//! Escalation engine: rule evaluation over ticket records
//!
//! Every rule is evaluated; matches are ranked by priority (critical first)
//! and the top match governs the decision. Definition order only matters
//! between rules of equal priority.

use crate::escalation::rule::{
    EscalationLevel, EscalationPriority, EscalationReason, EscalationRule, EscalationRuleSet,
};
use crate::escalation::ticket::Ticket;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

const NO_MATCH_REASON: &str = "no escalation rules matched the ticket criteria";
const NOT_A_MAPPING_REASON: &str = "ticket is not a field mapping";

/// Action taken from the governing rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationAction {
    pub rule: String,
    pub escalation_level: EscalationLevel,
    pub priority: EscalationPriority,
    pub reason: EscalationReason,
    pub contact_info: String,
    /// Minutes
    pub response_time_sla: u32,
    pub description: String,
    pub auto_assign: bool,
    pub requires_approval: bool,
}

impl From<&EscalationRule> for EscalationAction {
    fn from(rule: &EscalationRule) -> Self {
        Self {
            rule: rule.name.clone(),
            escalation_level: rule.escalation_level,
            priority: rule.priority,
            reason: rule.reason,
            contact_info: rule.contact_info.clone(),
            response_time_sla: rule.response_time_sla,
            description: rule.description.clone(),
            auto_assign: rule.auto_assign,
            requires_approval: rule.requires_approval,
        }
    }
}

/// Decision produced by the Escalation Engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationDecision {
    pub should_escalate: bool,
    /// Names of every matching rule, highest priority first
    pub matched_rules: Vec<String>,
    /// Present iff `should_escalate`
    pub action: Option<EscalationAction>,
    /// Human-readable explanation
    pub reason: String,
}

impl EscalationDecision {
    fn no_escalation(reason: &str) -> Self {
        Self {
            should_escalate: false,
            matched_rules: Vec::new(),
            action: None,
            reason: reason.to_string(),
        }
    }

    pub fn total_matches(&self) -> usize {
        self.matched_rules.len()
    }

    pub fn primary_rule(&self) -> Option<&str> {
        self.action.as_ref().map(|a| a.rule.as_str())
    }

    pub fn escalation_level(&self) -> Option<EscalationLevel> {
        self.action.as_ref().map(|a| a.escalation_level)
    }

    pub fn priority(&self) -> Option<EscalationPriority> {
        self.action.as_ref().map(|a| a.priority)
    }

    pub fn contact_info(&self) -> Option<&str> {
        self.action.as_ref().map(|a| a.contact_info.as_str())
    }

    pub fn response_time_sla(&self) -> Option<u32> {
        self.action.as_ref().map(|a| a.response_time_sla)
    }
}

/// Aggregate view over a batch of tickets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_tickets: usize,
    pub escalated_tickets: usize,
    /// 0.0 when the batch is empty
    pub escalation_rate: f64,
    pub escalation_levels: BTreeMap<EscalationLevel, usize>,
    pub priority_distribution: BTreeMap<EscalationPriority, usize>,
}

impl BatchSummary {
    /// Fold per-ticket decisions into a summary.
    pub fn from_decisions<'a>(decisions: impl IntoIterator<Item = &'a EscalationDecision>) -> Self {
        let mut summary = Self::default();
        for decision in decisions {
            summary.total_tickets += 1;
            if let Some(action) = decision.action.as_ref() {
                summary.escalated_tickets += 1;
                *summary
                    .escalation_levels
                    .entry(action.escalation_level)
                    .or_insert(0) += 1;
                *summary.priority_distribution.entry(action.priority).or_insert(0) += 1;
            }
        }
        if summary.total_tickets > 0 {
            summary.escalation_rate =
                summary.escalated_tickets as f64 / summary.total_tickets as f64;
        }
        summary
    }
}

/// Immutable rule table with pure evaluation
#[derive(Debug, Clone, Default)]
pub struct EscalationEngine {
    rules: EscalationRuleSet,
}

impl EscalationEngine {
    /// Create a new engine with the built-in rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a custom rule table
    pub fn with_rules(rules: EscalationRuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &EscalationRuleSet {
        &self.rules
    }

    /// Every rule the ticket satisfies, highest priority first.
    ///
    /// The sort is stable, so equal-priority rules keep definition order.
    pub fn matching_rules(&self, ticket: &Ticket) -> Vec<&EscalationRule> {
        let search_text = ticket.search_text();
        let mut matched: Vec<&EscalationRule> = Vec::new();

        for rule in self.rules.rules() {
            if rule.matches(ticket, &search_text) {
                matched.push(rule);
            } else {
                debug!(rule = %rule.name, "rule failed condition check");
            }
        }

        matched.sort_by_key(|rule| rule.priority.rank());
        matched
    }

    /// Evaluate a single ticket.
    pub fn evaluate(&self, ticket: &Ticket) -> EscalationDecision {
        let matched = self.matching_rules(ticket);

        let Some(primary) = matched.first() else {
            info!("no escalation rules matched");
            return EscalationDecision::no_escalation(NO_MATCH_REASON);
        };

        info!(
            matches = matched.len(),
            rule = %primary.name,
            level = %primary.escalation_level,
            priority = %primary.priority,
            "ticket escalated"
        );

        EscalationDecision {
            should_escalate: true,
            matched_rules: matched.iter().map(|r| r.name.clone()).collect(),
            action: Some(EscalationAction::from(*primary)),
            reason: format!(
                "matched {} rule(s); governed by '{}' ({})",
                matched.len(),
                primary.name,
                primary.reason
            ),
        }
    }

    /// Evaluate an arbitrary JSON value. Anything but an object never escalates.
    pub fn evaluate_value(&self, value: &Value) -> EscalationDecision {
        match Ticket::from_value(value) {
            Some(ticket) => self.evaluate(&ticket),
            None => EscalationDecision::no_escalation(NOT_A_MAPPING_REASON),
        }
    }

    /// Evaluate each ticket independently, preserving input order.
    pub fn evaluate_batch(&self, tickets: &[Ticket]) -> Vec<EscalationDecision> {
        tickets.iter().map(|ticket| self.evaluate(ticket)).collect()
    }

    /// Escalation totals and distributions for a batch.
    pub fn analyze_batch(&self, tickets: &[Ticket]) -> BatchSummary {
        BatchSummary::from_decisions(&self.evaluate_batch(tickets))
    }
}
