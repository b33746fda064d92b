//! Command-line interface for aivis.
//!
//! Provides commands for analyzing collected provider responses, scanning a
//! single response, and inspecting the resolved configuration.

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::config::load_config;
use crate::core::{Analyzer, BatchReport, ResponseAnalysis, SkippedResponse};
use crate::domain::{Provider, QueryType, RawResponse};
use crate::ingest::load_all;
use crate::report::Report;

/// aivis - AI search visibility analysis
#[derive(Parser, Debug)]
#[command(name = "aivis")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: .aivis/config.yaml in this or a parent directory)
    #[arg(short, long, global = true, env = "AIVIS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze collected responses and emit a JSON report
    Analyze {
        /// Response files or glob patterns (.jsonl, .json, .csv, or text dumps)
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Analyze a single response body
    Scan {
        /// Response file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Provider that produced the response
        #[arg(short, long, default_value = "unknown")]
        provider: String,

        /// Query the response answers
        #[arg(short, long, default_value = "")]
        query: String,

        /// Query audience
        #[arg(long, value_enum, default_value = "consumer")]
        query_type: QueryTypeArg,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Query type for CLI (maps to QueryType)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum QueryTypeArg {
    Consumer,
    Business,
}

impl From<QueryTypeArg> for QueryType {
    fn from(t: QueryTypeArg) -> Self {
        match t {
            QueryTypeArg::Consumer => QueryType::Consumer,
            QueryTypeArg::Business => QueryType::Business,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = self.config.as_deref();
        match self.command {
            Commands::Analyze { inputs, output } => run_analyze(config, &inputs, output.as_deref()).await,
            Commands::Scan {
                input,
                provider,
                query,
                query_type,
            } => run_scan(config, input, &provider, query, query_type.into()),
            Commands::Config => show_config(config),
        }
    }
}

/// Analyze responses on the blocking pool, one task per response.
///
/// Results come back in input order regardless of completion order.
/// `rejected_inputs` is carried into the unanalyzable count.
pub async fn analyze_concurrently(
    analyzer: Arc<Analyzer>,
    responses: Vec<RawResponse>,
    rejected_inputs: usize,
) -> Result<BatchReport> {
    let total = responses.len();
    let mut tasks = JoinSet::new();

    for (idx, response) in responses.into_iter().enumerate() {
        let analyzer = Arc::clone(&analyzer);
        tasks.spawn_blocking(move || (idx, analyzer.analyze_or_skip(&response)));
    }

    let mut outcomes: Vec<(usize, Result<ResponseAnalysis, SkippedResponse>)> = Vec::with_capacity(total);
    while let Some(joined) = tasks.join_next().await {
        outcomes.push(joined.context("Analysis task failed")?);
    }
    outcomes.sort_by_key(|(idx, _)| *idx);

    let outcomes = outcomes.into_iter().map(|(_, outcome)| outcome).collect();
    Ok(BatchReport::from_outcomes(&analyzer, outcomes, rejected_inputs))
}

/// Analyze response files and emit the report
async fn run_analyze(config_path: Option<&Path>, inputs: &[String], output: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    debug!(config_file = %config.config_file.display(), "Loaded configuration");

    let analyzer = Arc::new(config.build_analyzer()?);
    let parsed = load_all(inputs, &config.query_classifier())?;
    info!(
        responses = parsed.responses.len(),
        rejected = parsed.rejected,
        "Loaded responses"
    );

    let batch = analyze_concurrently(Arc::clone(&analyzer), parsed.responses, parsed.rejected).await?;
    let report = Report::new(analyzer.business(), analyzer.competitors(), batch);

    match output {
        Some(path) => {
            report.write_to(path)?;
            info!(path = %path.display(), "Wrote report");
        }
        None => println!("{}", report.to_json()?),
    }

    for line in report.summary_lines() {
        info!("{}", line);
    }

    Ok(())
}

/// Analyze one response from a file or stdin
fn run_scan(
    config_path: Option<&Path>,
    input: Option<PathBuf>,
    provider: &str,
    query: String,
    query_type: QueryType,
) -> Result<()> {
    let config = load_config(config_path)?;
    let analyzer = config.build_analyzer()?;

    let body = if let Some(path) = input {
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        anyhow::bail!("No input provided. Use --input <file> or pipe to stdin");
    };

    let provider: Provider = provider.parse().unwrap_or(Provider::Unknown);
    let response = RawResponse::new(provider, query, query_type, body);
    let analysis = analyzer.analyze(&response)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&analysis).context("Failed to serialize analysis")?
    );
    Ok(())
}

/// Show resolved configuration
fn show_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let (business, competitors) = config.entities()?;

    println!("Config file: {}", config.config_file.display());
    println!();
    println!("Business: {}", business);
    if !business.aliases().is_empty() {
        println!("  aliases: {}", business.aliases().join(", "));
    }
    println!("Competitors:");
    for competitor in &competitors {
        if competitor.aliases().is_empty() {
            println!("  {}", competitor);
        } else {
            println!("  {} ({})", competitor, competitor.aliases().join(", "));
        }
    }
    println!();
    println!(
        "{}",
        serde_yaml::to_string(&config.scan).context("Failed to serialize scan settings")?
    );
    println!("Consumer queries: 1..={}", config.queries.num_consumer);

    Ok(())
}
