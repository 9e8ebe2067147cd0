//! Nature Feed Sync Tool
//!
//! Ingests article metadata from a Nature subject listing into the local
//! article database and answers semantic searches over the stored titles.
//! The title index lives in process memory, so `search` embeds and indexes
//! the current database contents before querying it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use bunken::config::{DEFAULT_COLLECTION, DEFAULT_FEED_URL, DEFAULT_TOP_K};
use bunken::{
    ArticleStore, DEFAULT_NLIST, DEFAULT_NPROBE, EmbedConfig, EmbedMode, EngineConfig, IndexParams,
    NatureFeed, QueryEngine, SearchParams, SyncPipeline, VectorStore, build_embedder, ingest_into,
};

/// Default database location
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bunken")
        .join("articles.db")
}

/// CLI arguments
#[derive(Parser)]
#[command(name = "nature-sync")]
#[command(about = "Sync Nature articles into a local semantic search index")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database file
    #[arg(short = 'd', long, env = "BUNKEN_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Vector collection name
    #[arg(short = 'c', long, env = "BUNKEN_COLLECTION", default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Embedding mode: auto, neural, or hash
    #[arg(short = 'm', long, env = "BUNKEN_EMBED_MODE", default_value = "auto")]
    embed_mode: EmbedMode,

    /// Checkpoint directory for the neural embedder
    #[arg(long, env = "BUNKEN_MODEL_DIR")]
    model_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the currently listed articles into the database
    Ingest {
        /// Subject listing URL
        #[arg(short, long, env = "BUNKEN_FEED_URL", default_value = DEFAULT_FEED_URL)]
        url: String,

        /// Maximum article pages to fetch
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Embed every stored title and build the index once, reporting stats
    Rebuild {
        /// Inverted lists in the index
        #[arg(long, default_value_t = DEFAULT_NLIST)]
        nlist: usize,
    },
    /// Search stored articles by meaning (rebuilds the index first)
    Search {
        /// Query text
        query: String,

        /// Results to return
        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,

        /// Inverted lists probed at query time
        #[arg(long, default_value_t = DEFAULT_NPROBE)]
        nprobe: usize,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show database status
    Status,
}

/// Maps the parsed top-level flags onto an [`EngineConfig`].
fn engine_config(cli: &Cli) -> EngineConfig {
    let mut embed = EmbedConfig::default().with_mode(cli.embed_mode);
    if let Some(dir) = &cli.model_dir {
        embed = embed.with_model_dir(dir.clone());
    }
    EngineConfig::default()
        .with_db_path(cli.db_path.clone().unwrap_or_else(default_db_path))
        .with_collection(cli.collection.clone())
        .with_embed(embed)
}

fn open_store(config: &EngineConfig) -> Result<ArticleStore> {
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    ArticleStore::open(&config.db_path).context("Failed to open article database")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = engine_config(&cli);

    match cli.command {
        Commands::Ingest { url, limit } => {
            let config = config.with_feed_url(url);
            let mut store = open_store(&config)?;
            info!("Fetching article listing from {}...", config.feed_url);
            let feed = NatureFeed::new(config.feed_url.as_str())
                .context("Failed to build the feed client")?
                .with_limit(limit);
            let report = ingest_into(&mut store, &feed)?;
            println!(
                "fetched {} articles: {} new, {} skipped",
                report.fetched, report.inserted, report.skipped
            );
        }
        Commands::Rebuild { nlist } => {
            let config = config.with_index(IndexParams::default().with_nlist(nlist));
            let store = open_store(&config)?;
            let embedder = build_embedder(&config.embed).context("Failed to build the embedder")?;
            info!("Rebuilding the title index...");
            let pipeline = SyncPipeline::new(embedder, VectorStore::new(), config.collection)
                .with_index_params(config.index)
                .with_batch_size(config.batch_size);
            let report = pipeline.rebuild(&store)?;
            println!(
                "indexed {} titles ({} dims) in {:.2?}",
                report.articles, report.dimension, report.elapsed
            );
        }
        Commands::Search {
            query,
            top_k,
            nprobe,
            json,
        } => {
            let config = config.with_search(SearchParams::default().with_nprobe(nprobe));
            let store = open_store(&config)?;
            let embedder = build_embedder(&config.embed).context("Failed to build the embedder")?;
            let vectors = VectorStore::new();
            info!("Building the title index for this run...");
            SyncPipeline::new(embedder.clone(), vectors.clone(), config.collection.as_str())
                .with_index_params(config.index)
                .with_batch_size(config.batch_size)
                .rebuild(&store)?;

            let engine = QueryEngine::new(embedder, vectors, config.collection)
                .with_search_params(config.search);
            let matches = engine.search(&store, &query, top_k)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else if matches.is_empty() {
                println!("no matches");
            } else {
                for (rank, m) in matches.iter().enumerate() {
                    println!("{}. {} (distance {:.4})", rank + 1, m.title, m.distance);
                    if !m.abstract_text.is_empty() {
                        println!("   {}", snippet(&m.abstract_text, 240));
                    }
                }
            }
        }
        Commands::Status => {
            let store = open_store(&config)?;
            println!("database:  {}", config.db_path.display());
            println!("articles:  {}", store.count()?);
            if let Some(max) = store.max_id()? {
                println!("max id:    {max}");
            }
            println!("embedding: {}", config.embed.mode);
            println!("index:     rebuilt per process (not persisted)");
        }
    }

    Ok(())
}

/// First `limit` characters of a text, with an ellipsis when cut.
fn snippet(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_db_path() {
        let path = default_db_path();
        assert!(path.to_string_lossy().contains("bunken"));
    }

    #[test]
    fn test_cli_parses_search() {
        let cli = Cli::try_parse_from(["nature-sync", "search", "immune escape", "-k", "3"])
            .expect("search should parse");
        match cli.command {
            Commands::Search { query, top_k, .. } => {
                assert_eq!(query, "immune escape");
                assert_eq!(top_k, 3);
            }
            _ => panic!("expected the search subcommand"),
        }
        assert_eq!(cli.collection, DEFAULT_COLLECTION);
    }

    #[test]
    fn test_engine_config_mapping() {
        let cli = Cli::try_parse_from([
            "nature-sync",
            "-d",
            "/tmp/bunken-test.db",
            "-c",
            "papers",
            "-m",
            "hash",
            "status",
        ])
        .expect("status should parse");
        let config = engine_config(&cli);
        assert_eq!(config.db_path, PathBuf::from("/tmp/bunken-test.db"));
        assert_eq!(config.collection, "papers");
        assert_eq!(config.embed.mode, EmbedMode::Hash);
    }

    #[test]
    fn test_cli_rejects_bad_embed_mode() {
        let result = Cli::try_parse_from(["nature-sync", "-m", "quantum", "status"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        assert_eq!(snippet("short", 10), "short");
        assert_eq!(snippet("0123456789abc", 10), "0123456789…");
        let cut = snippet("日本語のテキストです", 3);
        assert_eq!(cut, "日本語…");
    }
}
