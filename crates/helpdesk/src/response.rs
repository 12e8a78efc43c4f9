//! Knowledge response compilation
//!
//! Builds an extractive answer from retrieved documents and scores it:
//!
//! ```text
//! confidence = min(1, 0.5·relevance + 0.3·completeness + 0.2·specificity + bonuses)
//! ```
//!
//! Bonuses reward answers that read as instructions (step markers), point
//! somewhere concrete (URLs, portals) and say when to escalate.

use crate::retriever::RetrievalResult;
use serde::{Deserialize, Serialize};
use triage::Category;

/// Answer used when retrieval found nothing.
pub const FALLBACK_ANSWER: &str = "I don't have enough information to answer your question. \
Please contact IT support directly for assistance.";

/// Answer used for requests outside IT support.
pub const OUT_OF_SCOPE_ANSWER: &str = "This request appears to be outside the scope of IT \
support. Please contact the appropriate department for help.";

/// Confidence when no documents were retrieved.
pub const NO_CONTEXT_CONFIDENCE: f64 = 0.1;

const STEP_MARKERS: &[&str] = &["step", "steps", "follow", "first", "then", "next", "finally"];
const REFERENCE_MARKERS: &[&str] = &["http", "www", ".com", "portal", "website"];
const ESCALATION_MARKERS: &[&str] = &["contact", "escalate", "support", "help desk", "if", "when"];

const STEP_BONUS: f64 = 0.15;
const REFERENCE_BONUS: f64 = 0.10;
const ESCALATION_BONUS: f64 = 0.10;
const LENGTH_BONUS: f64 = 0.05;

/// Answer lengths (chars) that earn the length bonus.
const GOOD_LENGTH: std::ops::RangeInclusive<usize> = 50..=800;

/// Documents that feed the relevance and specificity measures.
const QUALITY_WINDOW: usize = 3;

/// Longest excerpt taken from one document.
const EXCERPT_CHARS: usize = 400;

/// Shape of the answer, chosen from the request category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    #[default]
    Standard,
    Troubleshooting,
    Installation,
    Policy,
}

impl TemplateKind {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::SoftwareInstallation => Self::Installation,
            Category::HardwareFailure | Category::NetworkConnectivity => Self::Troubleshooting,
            Category::PolicyQuestion => Self::Policy,
            _ => Self::Standard,
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Self::Standard => "Here is what the IT knowledge base says:",
            Self::Troubleshooting => "Troubleshooting guidance from the IT knowledge base:",
            Self::Installation => "Installation guidance from the IT knowledge base:",
            Self::Policy => "Relevant IT policy:",
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Troubleshooting => write!(f, "troubleshooting"),
            Self::Installation => write!(f, "installation"),
            Self::Policy => write!(f, "policy"),
        }
    }
}

/// How useful the retrieved context looks, each measure in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextQuality {
    /// Mean score of the top three documents
    pub relevance: f64,
    /// Distinct document types, saturating at three
    pub completeness: f64,
    /// Content volume of the top three documents, saturating at 1000 chars
    pub specificity: f64,
}

impl ContextQuality {
    pub fn assess(documents: &[RetrievalResult]) -> Self {
        if documents.is_empty() {
            return Self::default();
        }

        let top = &documents[..documents.len().min(QUALITY_WINDOW)];
        let relevance = top.iter().map(|d| d.relevance_score).sum::<f64>() / top.len() as f64;

        let mut types: Vec<&str> = documents.iter().map(RetrievalResult::doc_type).collect();
        types.sort_unstable();
        types.dedup();
        let completeness = (types.len() as f64 / 3.0).min(1.0);

        let volume: usize = top.iter().map(|d| d.content.chars().count()).sum();
        let specificity = (volume as f64 / 1000.0).min(1.0);

        Self {
            relevance,
            completeness,
            specificity,
        }
    }

    pub fn base_confidence(&self) -> f64 {
        self.relevance * 0.5 + self.completeness * 0.3 + self.specificity * 0.2
    }
}

/// Answer text plus how far to trust it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeResponse {
    pub answer: String,
    pub confidence: f64,
    pub sources_used: Vec<String>,
    pub template: TemplateKind,
}

impl KnowledgeResponse {
    /// Fixed answer with no supporting documents.
    pub fn canned(answer: &str, confidence: f64, template: TemplateKind) -> Self {
        Self {
            answer: answer.to_string(),
            confidence,
            sources_used: Vec::new(),
            template,
        }
    }
}

/// Extractive answer builder.
#[derive(Debug, Clone)]
pub struct ResponseCompiler {
    max_documents: usize,
}

impl Default for ResponseCompiler {
    fn default() -> Self {
        Self { max_documents: 5 }
    }
}

impl ResponseCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile an answer for `documents`, assumed sorted most relevant first.
    pub fn compile(&self, template: TemplateKind, documents: &[RetrievalResult]) -> KnowledgeResponse {
        if documents.is_empty() {
            return KnowledgeResponse::canned(FALLBACK_ANSWER, NO_CONTEXT_CONFIDENCE, template);
        }

        let used = &documents[..documents.len().min(self.max_documents)];
        let answer = self.render(template, used);
        let confidence = answer_confidence(&answer, documents);

        let mut sources_used: Vec<String> = Vec::with_capacity(used.len());
        for doc in used {
            if !sources_used.contains(&doc.source) {
                sources_used.push(doc.source.clone());
            }
        }

        KnowledgeResponse {
            answer,
            confidence,
            sources_used,
            template,
        }
    }

    fn render(&self, template: TemplateKind, documents: &[RetrievalResult]) -> String {
        // groups keep the order in which their type first appears
        let mut groups: Vec<(&str, Vec<&RetrievalResult>)> = Vec::new();
        for doc in documents {
            match groups.iter_mut().find(|(kind, _)| *kind == doc.doc_type()) {
                Some((_, docs)) => docs.push(doc),
                None => groups.push((doc.doc_type(), vec![doc])),
            }
        }

        let mut answer = String::from(template.heading());
        for (kind, docs) in groups {
            answer.push_str("\n\n");
            answer.push_str(&type_label(kind));
            answer.push(':');
            for doc in docs {
                answer.push_str("\n- ");
                answer.push_str(&excerpt(&doc.content));
                answer.push_str(&format!(" (source: {})", doc.source));
            }
        }
        answer
    }
}

/// Confidence for a compiled answer backed by `documents`.
pub fn answer_confidence(answer: &str, documents: &[RetrievalResult]) -> f64 {
    if documents.is_empty() {
        return NO_CONTEXT_CONFIDENCE;
    }

    let lower = answer.to_lowercase();
    let has_any = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    let mut bonus = 0.0;
    if has_any(STEP_MARKERS) {
        bonus += STEP_BONUS;
    }
    if has_any(REFERENCE_MARKERS) {
        bonus += REFERENCE_BONUS;
    }
    if has_any(ESCALATION_MARKERS) {
        bonus += ESCALATION_BONUS;
    }
    if GOOD_LENGTH.contains(&answer.chars().count()) {
        bonus += LENGTH_BONUS;
    }

    (ContextQuality::assess(documents).base_confidence() + bonus).min(1.0)
}

fn type_label(kind: &str) -> String {
    let words: Vec<String> = kind
        .split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    words.join(" ")
}

fn excerpt(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}
