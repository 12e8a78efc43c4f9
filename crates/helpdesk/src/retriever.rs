//! Knowledge retrieval
//!
//! The help desk only needs "top-N documents for a query". Where they come
//! from sits behind [`Retriever`]:
//! - [`KeywordRetriever`]: in-memory term-overlap search over a JSON file
//! - [`HttpRetriever`]: a remote search service
//! - [`StaticRetriever`]: fixed results, for wiring and tests

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Query terms shorter than this are ignored.
const MIN_TERM_CHARS: usize = 3;

#[derive(Debug, Error)]
pub enum RetrieverError {
    #[error("failed to read knowledge base {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid knowledge base: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("retrieval request failed: {0}")]
    Request(String),

    #[error("retrieval service error ({status}): {body}")]
    Status { status: u16, body: String },
}

/// One retrieved document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub content: String,
    pub source: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    /// 0.0 to 1.0
    #[serde(default)]
    pub relevance_score: f64,
}

impl RetrievalResult {
    /// The document's `type` metadata, `"unknown"` when absent.
    pub fn doc_type(&self) -> &str {
        self.metadata
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Retriever: Send + Sync {
    /// At most `limit` documents, most relevant first.
    async fn search(&self, query: &str, limit: usize)
        -> Result<Vec<RetrievalResult>, RetrieverError>;
}

/// Knowledge-base entry as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeDocument {
    pub content: String,
    pub source: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Clone)]
struct IndexedDocument {
    document: KnowledgeDocument,
    lower: String,
}

/// Term-overlap search over an in-memory document list.
#[derive(Debug, Clone, Default)]
pub struct KeywordRetriever {
    documents: Vec<IndexedDocument>,
}

impl KeywordRetriever {
    pub fn new(documents: Vec<KnowledgeDocument>) -> Self {
        let documents = documents
            .into_iter()
            .map(|document| IndexedDocument {
                lower: document.content.to_lowercase(),
                document,
            })
            .collect();
        Self { documents }
    }

    /// Parse a JSON array of `{content, source, metadata}` objects.
    pub fn from_json(json: &str) -> Result<Self, RetrieverError> {
        let documents: Vec<KnowledgeDocument> = serde_json::from_str(json)?;
        Ok(Self::new(documents))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RetrieverError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RetrieverError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Synchronous search; the trait impl delegates here.
    pub fn rank(&self, query: &str, limit: usize) -> Vec<RetrievalResult> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<RetrievalResult> = self
            .documents
            .iter()
            .filter_map(|indexed| {
                let hits = terms
                    .iter()
                    .filter(|term| indexed.lower.contains(term.as_str()))
                    .count();
                if hits == 0 {
                    return None;
                }
                Some(RetrievalResult {
                    content: indexed.document.content.clone(),
                    source: indexed.document.source.clone(),
                    metadata: indexed.document.metadata.clone(),
                    relevance_score: hits as f64 / terms.len() as f64,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.source.cmp(&b.source))
        });
        results.truncate(limit);
        debug!(terms = terms.len(), hits = results.len(), "keyword search");
        results
    }
}

/// Distinct lower-cased alphanumeric terms of at least [`MIN_TERM_CHARS`].
fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_TERM_CHARS)
    {
        if !terms.iter().any(|t| t == word) {
            terms.push(word.to_string());
        }
    }
    terms
}

#[async_trait]
impl Retriever for KeywordRetriever {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievalResult>, RetrieverError> {
        Ok(self.rank(query, limit))
    }
}

/// Client for a remote search service.
///
/// `POST {base_url}/search` with `{"query": ..., "limit": ...}`; the service
/// answers with a JSON array of [`RetrievalResult`].
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRetriever {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RetrieverError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RetrieverError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievalResult>, RetrieverError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&SearchRequest { query, limit })
            .send()
            .await
            .map_err(|e| RetrieverError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RetrieverError::Status { status, body });
        }

        let mut results: Vec<RetrievalResult> = response
            .json()
            .await
            .map_err(|e| RetrieverError::Request(e.to_string()))?;
        for result in &mut results {
            result.relevance_score = result.relevance_score.clamp(0.0, 1.0);
        }
        results.truncate(limit);
        Ok(results)
    }
}

/// Returns the same documents for every query.
#[derive(Debug, Clone, Default)]
pub struct StaticRetriever {
    results: Vec<RetrievalResult>,
}

impl StaticRetriever {
    pub fn new(results: Vec<RetrievalResult>) -> Self {
        Self { results }
    }

    /// A knowledge base with nothing in it.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn search(
        &self,
        _query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievalResult>, RetrieverError> {
        Ok(self.results.iter().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KB: &str = r#"[
        {"content": "To reset your password open the self-service portal and follow the steps.",
         "source": "password_guide.md", "metadata": {"type": "guide"}},
        {"content": "VPN troubleshooting: restart the VPN client, then check your network.",
         "source": "vpn_troubleshooting.md", "metadata": {"type": "troubleshooting"}},
        {"content": "Password policy: passwords expire every 90 days.",
         "source": "policy.md"}
    ]"#;

    #[test]
    fn test_query_terms() {
        assert_eq!(
            query_terms("How do I reset my PASSWORD? password!"),
            vec!["how", "reset", "password"]
        );
        assert!(query_terms("a an of").is_empty());
    }

    #[test]
    fn test_rank_orders_by_overlap_then_source() {
        let retriever = KeywordRetriever::from_json(KB).unwrap();
        assert_eq!(retriever.len(), 3);

        let results = retriever.rank("reset password", 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "password_guide.md");
        assert_eq!(results[0].relevance_score, 1.0);
        assert_eq!(results[1].source, "policy.md");
        assert_eq!(results[1].relevance_score, 0.5);
        assert_eq!(results[1].doc_type(), "unknown");
    }

    #[test]
    fn test_rank_drops_zero_relevance_and_truncates() {
        let retriever = KeywordRetriever::from_json(KB).unwrap();
        assert!(retriever.rank("printer toner", 10).is_empty());
        assert_eq!(retriever.rank("password vpn", 1).len(), 1);
    }

    #[test]
    fn test_ties_broken_by_source() {
        let retriever = KeywordRetriever::from_json(KB).unwrap();
        let results = retriever.rank("password", 10);
        let sources: Vec<&str> = results.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["password_guide.md", "policy.md"]);
    }

    #[test]
    fn test_malformed_knowledge_base() {
        assert!(matches!(
            KeywordRetriever::from_json("{\"content\": 1}"),
            Err(RetrieverError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_static_retriever_respects_limit() {
        let doc = RetrievalResult {
            content: "x".into(),
            source: "a".into(),
            metadata: BTreeMap::new(),
            relevance_score: 0.5,
        };
        let retriever = StaticRetriever::new(vec![doc.clone(), doc]);
        assert_eq!(retriever.search("q", 1).await.unwrap().len(), 1);
        assert!(StaticRetriever::empty().search("q", 5).await.unwrap().is_empty());
    }

    #[test]
    fn test_http_base_url_normalised() {
        let retriever = HttpRetriever::new("http://kb.internal:8000/").unwrap();
        assert_eq!(retriever.base_url(), "http://kb.internal:8000");
    }
}
