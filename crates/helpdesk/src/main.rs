use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use helpdesk::triage::{BatchSummary, NoMatchPolicy, Ticket};
use helpdesk::{HelpDesk, HelpDeskConfig, HelpDeskResponse};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file (overridden by HELPDESK_* env vars and the flags below)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Category catalog JSON
    #[arg(long, global = true)]
    categories: Option<PathBuf>,

    /// Knowledge base JSON for local keyword search
    #[arg(long, global = true)]
    knowledge: Option<PathBuf>,

    /// Remote retrieval service base URL
    #[arg(long, global = true)]
    retriever_url: Option<String>,

    /// Category for requests nothing matches: non_it or unknown
    #[arg(long, global = true)]
    no_match: Option<NoMatchPolicy>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a request and print the result as JSON
    Classify { text: String },
    /// Evaluate a ticket given as inline JSON or @file
    Escalate { ticket: String },
    /// Run the full pipeline for one request
    Ask {
        text: String,
        /// Print the full response as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Extra ticket field, e.g. `--field priority=critical` (repeatable)
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
    /// Process one request per non-empty line of FILE
    Batch { file: PathBuf },
    /// List the active rule tables
    Rules,
}

impl Args {
    fn apply(&self, config: &mut HelpDeskConfig) {
        if let Some(path) = &self.categories {
            config.categories_path = Some(path.clone());
        }
        if let Some(path) = &self.knowledge {
            config.knowledge_path = Some(path.clone());
        }
        if let Some(url) = &self.retriever_url {
            config.retriever_url = Some(url.clone());
        }
        if let Some(policy) = self.no_match {
            config.no_match = policy;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = HelpDeskConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .init();

    let desk = HelpDesk::from_config(&config)?;
    info!(
        categories = desk.classifier().category_rule_count(),
        escalation_rules = desk.engine().rules().len(),
        "Help desk ready"
    );

    match args.command {
        Command::Classify { text } => {
            let result = desk.classifier().classify(&text);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Escalate { ticket } => {
            let value = read_ticket(&ticket)?;
            let decision = desk.engine().evaluate_value(&value);
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
        Command::Ask { text, json, fields } => {
            let extra = parse_fields(&fields)?;
            let response = desk.process_request_with(&text, extra).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_summary(&desk, &response);
            }
        }
        Command::Batch { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let messages: Vec<&str> = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect();

            let responses = desk.process_batch(&messages).await;
            for response in &responses {
                println!("{}", serde_json::to_string(response)?);
            }

            let tickets: Vec<Ticket> = responses.iter().map(|r| r.ticket.clone()).collect();
            let summary: BatchSummary = desk.engine().analyze_batch(&tickets);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Rules => {
            for rule in desk.classifier().rules().rules() {
                println!(
                    "category {:<22} {} keywords, {} patterns",
                    rule.category().as_str(),
                    rule.keywords().len(),
                    rule.patterns().count()
                );
            }
            for rule in desk.engine().rules().rules() {
                println!(
                    "escalation {:<30} {} / {} -> {} ({} min)",
                    rule.name,
                    rule.escalation_level,
                    rule.priority,
                    rule.contact_info,
                    rule.response_time_sla
                );
            }
        }
    }

    Ok(())
}

/// Inline JSON, or `@path` to read it from a file.
fn read_ticket(arg: &str) -> Result<Value> {
    let json = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read ticket file {}", path))?,
        None => arg.to_string(),
    };
    serde_json::from_str(&json).context("Ticket is not valid JSON")
}

/// `KEY=VALUE` pairs as ticket fields; values that parse as JSON keep their type.
fn parse_fields(pairs: &[String]) -> Result<Ticket> {
    pairs.iter().try_fold(Ticket::new(), |ticket, pair| -> Result<Ticket> {
        let (key, raw) = pair
            .split_once('=')
            .with_context(|| format!("Field '{}' is not KEY=VALUE", pair))?;
        let value = serde_json::from_str::<Value>(raw)
            .unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok(ticket.with(key.trim(), value))
    })
}

fn print_summary(desk: &HelpDesk, response: &HelpDeskResponse) {
    let classification = &response.classification;
    println!("Request:    {}", response.request_id);
    println!(
        "Category:   {} ({:.0}%)",
        classification.category.label(),
        classification.confidence * 100.0
    );
    if let Some(info) = desk.category_info(classification.category) {
        if let Some(time) = &info.typical_resolution_time {
            println!("Typical resolution: {}", time);
        }
    }

    match &response.escalation.action {
        Some(action) => println!(
            "Escalation: {} via {} ({}, respond within {} min)",
            action.escalation_level, action.contact_info, action.priority, action.response_time_sla
        ),
        None => println!("Escalation: none"),
    }

    println!();
    println!("{}", response.knowledge.answer);
    println!();
    println!(
        "Answer confidence: {:.0}%  Sources: {}",
        response.knowledge.confidence * 100.0,
        response.knowledge.sources_used.len()
    );
    println!("Recommendation: {}", response.recommendation);
}
