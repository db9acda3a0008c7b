//! catsearch CLI - hybrid product search over a JSON catalog file.
//!
//! A thin wrapper around the search engine: it loads a catalog into the
//! in-memory reference stores and exposes `search`, `analyze`, and `stats`.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use catsearch_analyze::{build_matcher, QueryAnalyzer, TermNormalizer};
use catsearch_core::{FusionWeights, ProductRecord, SearchTuning};
use catsearch_memory::{HashEmbedder, MemoryCatalog, MemoryLexicalStore, MemoryVectorStore};
use catsearch_query::SearchEngine;

/// Embedding dimension for the built-in hashing embedder.
const EMBED_DIMENSION: usize = 64;

/// catsearch - Hybrid catalog product search
#[derive(Parser)]
#[command(name = "catsearch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Catalog JSON file (default: ./catalog.json)
    #[arg(short, long, global = true)]
    catalog: Option<PathBuf>,

    /// Tuning TOML file (default: standard config locations)
    #[arg(short, long, global = true)]
    tuning: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long, default_value = "10")]
        top_k: usize,

        /// Override the lexical fusion weight (pair with --semantic-weight)
        #[arg(long)]
        lexical_weight: Option<f32>,

        /// Override the semantic fusion weight (pair with --lexical-weight)
        #[arg(long)]
        semantic_weight: Option<f32>,

        /// Show per-source score breakdown
        #[arg(long)]
        explain: bool,
    },

    /// Show how a query is classified and which terms it expands to
    Analyze {
        /// Query to analyze
        query: String,
    },

    /// Show catalog statistics
    Stats,
}

fn get_catalog_path(catalog: Option<PathBuf>) -> PathBuf {
    catalog.unwrap_or_else(|| PathBuf::from("catalog.json"))
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_tuning(path: Option<PathBuf>) -> Result<SearchTuning, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(SearchTuning::load(&p)?),
        None => Ok(SearchTuning::load_default()?),
    }
}

fn load_catalog(path: &PathBuf) -> Result<Vec<ProductRecord>, Box<dyn std::error::Error>> {
    if !path.exists() {
        eprintln!(
            "Catalog file not found: {}. Provide one with -c.",
            path.display()
        );
        std::process::exit(1);
    }
    let content = fs::read_to_string(path)?;
    let records: Vec<ProductRecord> = serde_json::from_str(&content)?;
    Ok(records)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let tuning = load_tuning(cli.tuning)?;
    let catalog_path = get_catalog_path(cli.catalog);

    match cli.command {
        Commands::Search {
            query,
            top_k,
            lexical_weight,
            semantic_weight,
            explain,
        } => {
            let records = load_catalog(&catalog_path)?;
            let engine = build_engine(records, tuning).await?;

            let weights = match (lexical_weight, semantic_weight) {
                (Some(lexical), Some(semantic)) => Some(FusionWeights::new(lexical, semantic)),
                (None, None) => None,
                _ => {
                    eprintln!("Provide both --lexical-weight and --semantic-weight, or neither.");
                    std::process::exit(1);
                }
            };

            search(&engine, &query, top_k, weights, explain).await;
        }
        Commands::Analyze { query } => {
            analyze(&tuning, &query);
        }
        Commands::Stats => {
            let records = load_catalog(&catalog_path)?;
            stats(&records);
        }
    }

    Ok(())
}

async fn build_engine(
    records: Vec<ProductRecord>,
    tuning: SearchTuning,
) -> Result<
    SearchEngine<MemoryLexicalStore, MemoryVectorStore, HashEmbedder>,
    Box<dyn std::error::Error>,
> {
    let embedder = Arc::new(HashEmbedder::new(EMBED_DIMENSION));
    let catalog = MemoryCatalog::build(records, embedder.as_ref()).await?;
    let engine =
        SearchEngine::connect(catalog.lexical, catalog.vector, embedder, tuning).await?;
    Ok(engine)
}

async fn search(
    engine: &SearchEngine<MemoryLexicalStore, MemoryVectorStore, HashEmbedder>,
    query: &str,
    top_k: usize,
    weights: Option<FusionWeights>,
    explain: bool,
) {
    match engine.search(query, top_k, weights).await {
        Ok(results) => {
            if results.results.is_empty() {
                println!("No products found.");
                return;
            }

            println!(
                "Top {} result(s) for {:?} ({} ms):",
                results.total_results, results.query, results.latency_ms
            );
            for hit in &results.results {
                println!("{:2}. {}  {}", hit.rank, hit.id, hit.name);
                if explain {
                    println!(
                        "    score: {:.4} (lexical: {:.3}, semantic: {:.3}, fuzzy: {:.3}, via: {})",
                        hit.final_score,
                        hit.lexical_score,
                        hit.semantic_score,
                        hit.fuzzy_bonus,
                        hit.methods.join(", ")
                    );
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn analyze(tuning: &SearchTuning, query: &str) {
    let analyzer = QueryAnalyzer::new(tuning.weights.clone());
    let analysis = analyzer.analyze(query);
    let weights = analyzer.weights_for(&analysis);

    println!("Query: {:?}", query.trim());
    println!("  product code:  {}", analysis.has_product_code);
    if !analysis.code_patterns.is_empty() {
        println!("  code patterns: {}", analysis.code_patterns.join(", "));
    }
    println!("  short:         {}", analysis.is_short);
    println!("  descriptive:   {}", analysis.is_descriptive);
    println!("  attribute:     {}", analysis.has_attributes);
    println!(
        "  weights:       lexical {:.1}, semantic {:.1}",
        weights.lexical, weights.semantic
    );

    let normalizer = TermNormalizer::new(build_matcher(tuning.matcher.kind));
    let terms = normalizer.normalize(query, &analysis);

    let list = |set: &std::collections::BTreeSet<String>| {
        set.iter().cloned().collect::<Vec<_>>().join(", ")
    };
    if terms.is_code_query() {
        println!("  code variants: {}", list(&terms.product_codes));
    } else {
        println!("  original:      {}", list(&terms.original));
        println!("  corrected:     {}", list(&terms.corrected));
        println!("  stemmed:       {}", list(&terms.stemmed));
        println!("  phonetic:      {}", list(&terms.phonetic));
        println!("  partial:       {}", list(&terms.partial));
    }
}

fn stats(records: &[ProductRecord]) {
    let attributes: usize = records.iter().map(|r| r.attributes.len()).sum();
    let missing_description = records
        .iter()
        .filter(|r| r.short_description.is_empty() && r.description.is_empty())
        .count();

    println!("Catalog statistics:");
    println!("  products:             {}", records.len());
    println!("  attributes:           {}", attributes);
    println!("  without description:  {}", missing_description);
}
