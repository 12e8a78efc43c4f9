//! Help-desk request pipeline
//!
//! ```text
//! message ──► Classifier ──► Ticket ──► EscalationEngine
//!                 │
//!                 ├─ non_it ──► out-of-scope notice
//!                 ▼
//!            Retriever ──► ResponseCompiler ──► KnowledgeResponse
//! ```
//!
//! Classification and escalation are synchronous and infallible; only
//! retrieval can fail, and a failure degrades the answer rather than the
//! whole response.

use crate::config::{HelpDeskConfig, DEFAULT_SEARCH_LIMIT};
use crate::response::{
    KnowledgeResponse, ResponseCompiler, TemplateKind, FALLBACK_ANSWER, OUT_OF_SCOPE_ANSWER,
};
use crate::retriever::{HttpRetriever, KeywordRetriever, Retriever, StaticRetriever};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use triage::classifier::bands;
use triage::{
    Category, CategoryCatalog, CategoryInfo, CategoryRuleTable, ClassificationResult, Classifier,
    EscalationDecision, EscalationEngine, EscalationRuleSet, Ticket,
};

/// Everything the help desk knows about one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpDeskResponse {
    /// `REQ-<yyyymmddHHMMSS>-<seq>`
    pub request_id: String,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub user_message: String,
    pub classification: ClassificationResult,
    /// Ticket handed to the escalation engine
    pub ticket: Ticket,
    pub escalation: EscalationDecision,
    pub knowledge: KnowledgeResponse,
    /// One-line next step for the user
    pub recommendation: String,
}

/// Classifier, escalation engine and knowledge retrieval behind one call.
pub struct HelpDesk {
    classifier: Classifier,
    engine: EscalationEngine,
    catalog: CategoryCatalog,
    retriever: Arc<dyn Retriever>,
    compiler: ResponseCompiler,
    search_limit: usize,
    sequence: AtomicU64,
}

impl HelpDesk {
    /// Help desk with built-in rules and the given knowledge source.
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self {
            classifier: Classifier::new(),
            engine: EscalationEngine::new(),
            catalog: CategoryCatalog::default(),
            retriever,
            compiler: ResponseCompiler::new(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            sequence: AtomicU64::new(0),
        }
    }

    /// Build from configuration, loading every referenced file.
    pub fn from_config(config: &HelpDeskConfig) -> Result<Self> {
        let retriever: Arc<dyn Retriever> = if let Some(url) = &config.retriever_url {
            info!(url = %url, "using remote retriever");
            Arc::new(HttpRetriever::new(url.clone()).context("Failed to build HTTP retriever")?)
        } else if let Some(path) = &config.knowledge_path {
            let retriever = KeywordRetriever::load(path)
                .with_context(|| format!("Failed to load knowledge base {}", path.display()))?;
            info!(path = %path.display(), documents = retriever.len(), "knowledge base loaded");
            Arc::new(retriever)
        } else {
            warn!("no knowledge source configured; answers will fall back to IT contact");
            Arc::new(StaticRetriever::empty())
        };

        let mut classifier = Classifier::new().with_no_match(config.no_match);
        if let Some(path) = &config.category_rules_path {
            let rules = CategoryRuleTable::from_file(path)
                .with_context(|| format!("Failed to load category rules {}", path.display()))?;
            classifier = classifier.with_rules(rules);
        }

        let engine = match &config.escalation_rules_path {
            Some(path) => EscalationEngine::with_rules(
                EscalationRuleSet::from_file(path)
                    .with_context(|| format!("Failed to load escalation rules {}", path.display()))?,
            ),
            None => EscalationEngine::new(),
        };

        let catalog = config
            .categories_path
            .as_ref()
            .map(CategoryCatalog::load_or_default)
            .unwrap_or_default();

        Ok(Self::new(retriever)
            .with_classifier(classifier)
            .with_engine(engine)
            .with_catalog(catalog)
            .with_search_limit(config.search_limit))
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_engine(mut self, engine: EscalationEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_catalog(mut self, catalog: CategoryCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn engine(&self) -> &EscalationEngine {
        &self.engine
    }

    pub fn category_info(&self, category: Category) -> Option<&CategoryInfo> {
        self.catalog.info(category)
    }

    /// Run one message through classification, escalation and retrieval.
    pub async fn process_request(&self, message: &str) -> HelpDeskResponse {
        self.process_request_with(message, Ticket::new()).await
    }

    /// Like [`process_request`](Self::process_request), with caller-supplied
    /// ticket fields (priority, department, keywords, ...). Extra fields win
    /// over the ones derived from the message.
    pub async fn process_request_with(&self, message: &str, extra: Ticket) -> HelpDeskResponse {
        let now = Utc::now();
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let request_id = format!("REQ-{}-{:04}", now.format("%Y%m%d%H%M%S"), seq);

        let classification = self.classifier.classify(message);
        let ticket = Ticket::new()
            .with("category", classification.category.as_str())
            .with("classification_confidence", classification.confidence)
            .with("description", message)
            .with("user_message", message);
        let ticket = extra
            .fields()
            .fold(ticket, |ticket, (field, value)| ticket.with(field, value.clone()));
        let escalation = self.engine.evaluate(&ticket);

        let template = TemplateKind::for_category(classification.category);
        let knowledge = if classification.category == Category::NonIt {
            KnowledgeResponse::canned(OUT_OF_SCOPE_ANSWER, 0.0, template)
        } else {
            self.answer(message, template).await
        };

        let recommendation = recommend(&classification, &escalation, &knowledge);

        info!(
            request_id = %request_id,
            category = %classification.category,
            confidence = classification.confidence,
            escalate = escalation.should_escalate,
            sources = knowledge.sources_used.len(),
            "request processed"
        );

        HelpDeskResponse {
            request_id,
            timestamp: now.to_rfc3339(),
            user_message: message.to_string(),
            classification,
            ticket,
            escalation,
            knowledge,
            recommendation,
        }
    }

    /// Process each message independently, in order.
    pub async fn process_batch<S: AsRef<str>>(&self, messages: &[S]) -> Vec<HelpDeskResponse> {
        let mut responses = Vec::with_capacity(messages.len());
        for message in messages {
            responses.push(self.process_request(message.as_ref()).await);
        }
        responses
    }

    async fn answer(&self, message: &str, template: TemplateKind) -> KnowledgeResponse {
        match self.retriever.search(message, self.search_limit).await {
            Ok(documents) => self.compiler.compile(template, &documents),
            Err(e) => {
                warn!(error = %e, "knowledge retrieval failed");
                KnowledgeResponse::canned(FALLBACK_ANSWER, 0.0, template)
            }
        }
    }
}

/// Next step for the user, from the strongest signal available.
pub fn recommend(
    classification: &ClassificationResult,
    escalation: &EscalationDecision,
    knowledge: &KnowledgeResponse,
) -> String {
    if let Some(action) = &escalation.action {
        return format!(
            "This request should be escalated to {} - {}",
            action.escalation_level, action.description
        );
    }
    if knowledge.confidence > bands::GOOD {
        return "I found relevant information that should help resolve your issue.".to_string();
    }
    if classification.is_high_confidence() {
        return format!(
            "Your request has been classified as {}. Standard resolution procedures will be followed.",
            classification.category.label()
        );
    }
    "Your request needs human review for proper classification and resolution.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::{MockRetriever, RetrievalResult, RetrieverError};
    use std::collections::BTreeMap;
    use triage::{EscalationLevel, EscalationPriority, NoMatchPolicy};

    fn guide() -> RetrievalResult {
        RetrievalResult {
            content: "Open the self-service portal, then follow the reset steps.".into(),
            source: "password_guide.md".into(),
            metadata: BTreeMap::new(),
            relevance_score: 0.8,
        }
    }

    #[tokio::test]
    async fn test_it_request_uses_retriever() {
        let mut retriever = MockRetriever::new();
        retriever
            .expect_search()
            .times(1)
            .returning(|_, limit| {
                assert_eq!(limit, DEFAULT_SEARCH_LIMIT);
                Ok(vec![guide()])
            });
        let desk = HelpDesk::new(Arc::new(retriever));

        let response = desk
            .process_request("I forgot my password and can't log into my computer")
            .await;

        assert_eq!(response.classification.category, Category::PasswordReset);
        assert!(!response.escalation.should_escalate);
        assert_eq!(response.knowledge.sources_used, vec!["password_guide.md"]);
        assert_eq!(response.knowledge.template, TemplateKind::Standard);
        assert!(response.knowledge.confidence > 0.1);
        assert_eq!(response.ticket.text("category"), Some("password_reset"));
        assert_eq!(
            response.ticket.text("user_message"),
            response.ticket.text("description")
        );
    }

    #[tokio::test]
    async fn test_non_it_skips_retrieval() {
        let mut retriever = MockRetriever::new();
        retriever.expect_search().times(0);
        let desk = HelpDesk::new(Arc::new(retriever));

        let response = desk.process_request("Where can I find the cafeteria menu?").await;
        assert_eq!(response.classification.category, Category::NonIt);
        assert_eq!(response.knowledge.answer, OUT_OF_SCOPE_ANSWER);
        assert_eq!(response.knowledge.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_retriever_failure_degrades() {
        let mut retriever = MockRetriever::new();
        retriever
            .expect_search()
            .returning(|_, _| Err(RetrieverError::Request("connection refused".into())));
        let desk = HelpDesk::new(Arc::new(retriever));

        let response = desk.process_request("Office computer won't turn on this morning").await;
        assert_eq!(response.knowledge.answer, FALLBACK_ANSWER);
        assert_eq!(response.knowledge.confidence, 0.0);
        assert_eq!(response.knowledge.template, TemplateKind::Troubleshooting);
        // escalation is unaffected by retrieval
        assert_eq!(
            response.escalation.escalation_level(),
            Some(EscalationLevel::Level2)
        );
    }

    #[tokio::test]
    async fn test_request_ids_are_unique_and_shaped() {
        let desk = HelpDesk::new(Arc::new(StaticRetriever::empty()));
        let responses = desk
            .process_batch(&["VPN not working from home office", "Can't connect to office WiFi network"])
            .await;

        assert_eq!(responses.len(), 2);
        assert_ne!(responses[0].request_id, responses[1].request_id);
        for response in &responses {
            let id = &response.request_id;
            assert!(id.starts_with("REQ-"));
            assert_eq!(id.len(), "REQ-".len() + 14 + 1 + 4);
            assert!(chrono::DateTime::parse_from_rfc3339(&response.timestamp).is_ok());
        }
        assert!(responses[0].request_id.ends_with("-0001"));
        assert!(responses[1].request_id.ends_with("-0002"));
    }

    #[tokio::test]
    async fn test_search_limit_floor() {
        let mut retriever = MockRetriever::new();
        retriever
            .expect_search()
            .returning(|_, limit| {
                assert_eq!(limit, 1);
                Ok(Vec::new())
            });
        let desk = HelpDesk::new(Arc::new(retriever)).with_search_limit(0);
        let response = desk.process_request("My work email is not syncing with Outlook").await;
        assert_eq!(response.knowledge.answer, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn test_caller_priority_reaches_critical_unclassified() {
        let desk = HelpDesk::new(Arc::new(StaticRetriever::empty()))
            .with_classifier(Classifier::new().with_no_match(NoMatchPolicy::Unknown));

        let response = desk
            .process_request_with(
                "Something is wrong with my system but I don't know what",
                Ticket::new().with("priority", "critical"),
            )
            .await;

        assert_eq!(response.classification.category, Category::Unknown);
        assert_eq!(response.ticket.text("priority"), Some("critical"));
        assert_eq!(response.escalation.primary_rule(), Some("Critical Unclassified"));
        assert_eq!(response.escalation.priority(), Some(EscalationPriority::Critical));
        assert!(response
            .recommendation
            .starts_with("This request should be escalated to"));

        // same message without the extra field stays at the low-confidence rule
        let plain = desk
            .process_request("Something is wrong with my system but I don't know what")
            .await;
        assert_eq!(
            plain.escalation.primary_rule(),
            Some("Low Confidence Classification")
        );
    }

    #[tokio::test]
    async fn test_extra_fields_override_derived_ones() {
        let desk = HelpDesk::new(Arc::new(StaticRetriever::empty()));
        let response = desk
            .process_request_with(
                "Where can I find the cafeteria menu?",
                Ticket::new().with("category", "security_incident"),
            )
            .await;

        assert_eq!(response.classification.category, Category::NonIt);
        assert_eq!(response.ticket.text("category"), Some("security_incident"));
        assert_eq!(
            response.escalation.escalation_level(),
            Some(EscalationLevel::SecurityTeam)
        );
    }

    #[tokio::test]
    async fn test_recommendation_follows_strongest_signal() {
        let mut retriever = MockRetriever::new();
        retriever.expect_search().returning(|_, _| Ok(vec![guide()]));
        let desk = HelpDesk::new(Arc::new(retriever));
        let response = desk
            .process_request("I forgot my password and can't log into my computer")
            .await;
        assert!(!response.escalation.should_escalate);

        let mut knowledge = response.knowledge.clone();
        knowledge.confidence = 0.9;
        assert_eq!(
            recommend(&response.classification, &response.escalation, &knowledge),
            "I found relevant information that should help resolve your issue."
        );

        // exactly at the band does not count as good
        knowledge.confidence = bands::GOOD;
        let mut classification = response.classification.clone();
        classification.confidence = 0.9;
        assert_eq!(
            recommend(&classification, &response.escalation, &knowledge),
            "Your request has been classified as Password Reset. \
             Standard resolution procedures will be followed."
        );

        classification.confidence = bands::HIGH;
        assert_eq!(
            recommend(&classification, &response.escalation, &knowledge),
            "Your request needs human review for proper classification and resolution."
        );
    }

    #[tokio::test]
    async fn test_escalation_recommendation_names_level_and_description() {
        let desk = HelpDesk::new(Arc::new(StaticRetriever::empty()));
        let response = desk
            .process_request("I think my computer has a virus - getting strange popups")
            .await;
        let action = response.escalation.action.as_ref().unwrap();
        assert_eq!(
            response.recommendation,
            format!(
                "This request should be escalated to {} - {}",
                action.escalation_level, action.description
            )
        );
    }
}
