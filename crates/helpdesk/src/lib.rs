//! IT help-desk request pipeline
//!
//! Wraps the [`triage`] crate with the parts that talk to the outside world:
//! configuration, knowledge retrieval and answer compilation.
//!
//! # Usage
//!
//! ```rust,no_run
//! use helpdesk::{HelpDesk, HelpDeskConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = HelpDeskConfig::load(None)?;
//! let desk = HelpDesk::from_config(&config)?;
//! let response = desk.process_request("VPN not working from home office").await;
//! println!("{}: {}", response.classification.category, response.knowledge.answer);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod desk;
pub mod response;
pub mod retriever;

pub use config::{ConfigError, HelpDeskConfig, DEFAULT_SEARCH_LIMIT};
pub use desk::{HelpDesk, HelpDeskResponse};
pub use response::{
    answer_confidence, ContextQuality, KnowledgeResponse, ResponseCompiler, TemplateKind,
    FALLBACK_ANSWER, OUT_OF_SCOPE_ANSWER,
};
pub use retriever::{
    HttpRetriever, KeywordRetriever, KnowledgeDocument, RetrievalResult, Retriever,
    RetrieverError, StaticRetriever,
};

pub use triage;
