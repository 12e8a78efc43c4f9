//! Escalation rules: conditions over ticket fields plus the action to take.

use crate::classifier::bands;
use crate::error::{TriageError, TriageResult};
use crate::escalation::ticket::Ticket;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Team or tier a ticket is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EscalationLevel {
    #[serde(rename = "level_1")]
    Level1,
    #[serde(rename = "level_2")]
    Level2,
    #[serde(rename = "level_3")]
    Level3,
    #[serde(rename = "security_team")]
    SecurityTeam,
    #[serde(rename = "management")]
    Management,
    #[serde(rename = "vendor_support")]
    VendorSupport,
}

impl std::fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Level1 => write!(f, "level_1"),
            Self::Level2 => write!(f, "level_2"),
            Self::Level3 => write!(f, "level_3"),
            Self::SecurityTeam => write!(f, "security_team"),
            Self::Management => write!(f, "management"),
            Self::VendorSupport => write!(f, "vendor_support"),
        }
    }
}

/// Escalation priority. Ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl EscalationPriority {
    /// Decision rank: 0 for critical up to 3 for low.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

impl std::fmt::Display for EscalationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Why a rule escalates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    LowConfidence,
    SecurityConcern,
    HardwareFailure,
    ManagementApproval,
    SystemOutage,
    VipUser,
    DataLoss,
    UnknownCategory,
    #[serde(rename = "complex_technical_issue")]
    ComplexTechnical,
}

impl std::fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::LowConfidence => "low_confidence",
            Self::SecurityConcern => "security_concern",
            Self::HardwareFailure => "hardware_failure",
            Self::ManagementApproval => "management_approval",
            Self::SystemOutage => "system_outage",
            Self::VipUser => "vip_user",
            Self::DataLoss => "data_loss",
            Self::UnknownCategory => "unknown_category",
            Self::ComplexTechnical => "complex_technical_issue",
        };
        write!(f, "{}", s)
    }
}

/// A single predicate over a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    /// Field equals the value; numbers compare by value (`3` equals `3.0`)
    Equals { field: String, value: Value },
    /// Numeric field strictly below the threshold
    LessThan { field: String, threshold: f64 },
    /// Numeric field strictly above the threshold
    GreaterThan { field: String, threshold: f64 },
    /// Numeric field equal to the value
    NumberEquals { field: String, value: f64 },
    /// Any keyword occurs in the ticket's free text (lower-cased keywords)
    KeywordsAny { keywords: Vec<String> },
}

impl Condition {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn less_than(field: impl Into<String>, threshold: f64) -> Self {
        Self::LessThan {
            field: field.into(),
            threshold,
        }
    }

    pub fn greater_than(field: impl Into<String>, threshold: f64) -> Self {
        Self::GreaterThan {
            field: field.into(),
            threshold,
        }
    }

    pub fn number_equals(field: impl Into<String>, value: f64) -> Self {
        Self::NumberEquals {
            field: field.into(),
            value,
        }
    }

    pub fn keywords_any<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self::KeywordsAny {
            keywords: keywords.iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }

    fn normalized(self) -> Self {
        match self {
            Self::KeywordsAny { keywords } => Self::keywords_any(keywords.as_slice()),
            other => other,
        }
    }

    /// Evaluate against a ticket. `search_text` is the ticket's pre-folded
    /// free text, computed once per ticket by the caller.
    pub fn matches(&self, ticket: &Ticket, search_text: &str) -> bool {
        match self {
            Self::Equals { field, value } => match (ticket.get(field), value) {
                (Some(Value::Number(actual)), Value::Number(expected)) => {
                    actual.as_f64() == expected.as_f64()
                }
                (actual, expected) => actual == Some(expected),
            },
            Self::LessThan { field, threshold } => {
                ticket.number(field).is_some_and(|v| v < *threshold)
            }
            Self::GreaterThan { field, threshold } => {
                ticket.number(field).is_some_and(|v| v > *threshold)
            }
            Self::NumberEquals { field, value } => {
                ticket.number(field).is_some_and(|v| v == *value)
            }
            Self::KeywordsAny { keywords } => keywords
                .iter()
                .any(|keyword| search_text.contains(keyword.as_str())),
        }
    }
}

/// Named predicate-to-action mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationRule {
    pub name: String,
    /// All must pass
    pub conditions: Vec<Condition>,
    pub escalation_level: EscalationLevel,
    pub priority: EscalationPriority,
    pub reason: EscalationReason,
    pub contact_info: String,
    /// Minutes
    pub response_time_sla: u32,
    pub description: String,
    #[serde(default)]
    pub auto_assign: bool,
    #[serde(default)]
    pub requires_approval: bool,
}

impl EscalationRule {
    /// Whether every condition passes for the ticket.
    pub fn matches(&self, ticket: &Ticket, search_text: &str) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.matches(ticket, search_text))
    }
}

/// Ordered escalation rule table. Order is not priority.
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationRuleSet {
    rules: Vec<EscalationRule>,
}

impl EscalationRuleSet {
    /// Validate and normalise a rule list.
    pub fn from_rules(rules: Vec<EscalationRule>) -> TriageResult<Self> {
        let rules = rules
            .into_iter()
            .map(|mut rule| {
                if rule.conditions.is_empty() {
                    return Err(TriageError::EmptyConditions(rule.name));
                }
                rule.conditions = rule.conditions.into_iter().map(Condition::normalized).collect();
                Ok(rule)
            })
            .collect::<TriageResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Parse a JSON array of [`EscalationRule`].
    pub fn from_json(json: &str) -> TriageResult<Self> {
        let rules: Vec<EscalationRule> = serde_json::from_str(json)?;
        Self::from_rules(rules)
    }

    pub fn from_file(path: impl AsRef<Path>) -> TriageResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| TriageError::io(path, e))?;
        Self::from_json(&json)
    }

    pub fn rules(&self) -> &[EscalationRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for EscalationRuleSet {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

/// Built-in escalation rules.
pub fn default_rules() -> Vec<EscalationRule> {
    vec![
        EscalationRule {
            name: "Security Incident".into(),
            conditions: vec![Condition::equals("category", "security_incident")],
            escalation_level: EscalationLevel::SecurityTeam,
            priority: EscalationPriority::High,
            reason: EscalationReason::SecurityConcern,
            contact_info: "security-team@company.com".into(),
            response_time_sla: 15,
            description: "Security team attention required".into(),
            auto_assign: true,
            requires_approval: false,
        },
        EscalationRule {
            name: "Low Confidence Classification".into(),
            conditions: vec![Condition::less_than("classification_confidence", bands::LOW)],
            escalation_level: EscalationLevel::Level2,
            priority: EscalationPriority::Medium,
            reason: EscalationReason::LowConfidence,
            contact_info: "level2-support@company.com".into(),
            response_time_sla: 60,
            description: "Human review needed for unclear requests".into(),
            auto_assign: false,
            requires_approval: false,
        },
        EscalationRule {
            name: "Hardware Failure".into(),
            conditions: vec![Condition::equals("category", "hardware_failure")],
            escalation_level: EscalationLevel::Level2,
            priority: EscalationPriority::High,
            reason: EscalationReason::HardwareFailure,
            contact_info: "hardware-support@company.com".into(),
            response_time_sla: 30,
            description: "Hardware specialists required".into(),
            auto_assign: false,
            requires_approval: false,
        },
        EscalationRule {
            name: "System Outage".into(),
            conditions: vec![Condition::keywords_any(&[
                "outage",
                "down",
                "offline",
                "not working",
                "system failure",
            ])],
            escalation_level: EscalationLevel::Level3,
            priority: EscalationPriority::Critical,
            reason: EscalationReason::SystemOutage,
            contact_info: "system-admin@company.com".into(),
            response_time_sla: 15,
            description: "System outage requiring immediate attention".into(),
            auto_assign: false,
            requires_approval: false,
        },
        EscalationRule {
            name: "VIP User Support".into(),
            conditions: vec![Condition::keywords_any(&[
                "vip",
                "executive",
                "ceo",
                "cto",
                "director",
            ])],
            escalation_level: EscalationLevel::Level3,
            priority: EscalationPriority::High,
            reason: EscalationReason::VipUser,
            contact_info: "vip-support@company.com".into(),
            response_time_sla: 30,
            description: "VIP user priority support".into(),
            auto_assign: false,
            requires_approval: false,
        },
        EscalationRule {
            name: "Data Loss".into(),
            conditions: vec![Condition::keywords_any(&[
                "lost data",
                "deleted files",
                "corrupted",
                "backup",
                "restore",
            ])],
            escalation_level: EscalationLevel::Level2,
            priority: EscalationPriority::High,
            reason: EscalationReason::DataLoss,
            contact_info: "data-recovery@company.com".into(),
            response_time_sla: 45,
            description: "Data loss or recovery issue".into(),
            auto_assign: false,
            requires_approval: false,
        },
        // catch-all for critical tickets the classifier could not place
        EscalationRule {
            name: "Critical Unclassified".into(),
            conditions: vec![
                Condition::equals("priority", "critical"),
                Condition::less_than("classification_confidence", bands::MEDIUM),
            ],
            escalation_level: EscalationLevel::Level3,
            priority: EscalationPriority::Critical,
            reason: EscalationReason::UnknownCategory,
            contact_info: "escalation-team@company.com".into(),
            response_time_sla: 30,
            description: "Critical issue requiring immediate review".into(),
            auto_assign: false,
            requires_approval: false,
        },
    ]
}
