mod output;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use backfill::{BackfillConfig, BackfillJob};
use data_loader::{MongoConfig, MongoMovieStore, MovieStore, StoreError};
use ml_client::{Embedder, EmbeddingConfig, HuggingFaceEmbedder};
use search::{SearchConfig, SearchOrchestrator};
use settings::FromEnv;

/// movie-search - Semantic search over movie plots
#[derive(Parser, Debug)]
#[command(name = "movie-search")]
#[command(about = "Semantic movie search using plot embeddings and a vector index", long_about = None)]
struct Cli {
    /// Environment file to load before reading configuration
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find movies whose plots match a free-text query
    Search {
        /// What the movie should be about
        query: String,

        /// Number of results to return (overrides SEARCH_LIMIT)
        #[arg(long)]
        limit: Option<u32>,

        /// Candidates the index considers (overrides SEARCH_NUM_CANDIDATES)
        #[arg(long)]
        num_candidates: Option<u32>,

        /// Vector index to query (overrides SEARCH_INDEX)
        #[arg(long)]
        index: Option<String>,
    },

    /// Generate plot embeddings for movies that lack one
    Backfill {
        /// Maximum number of movies to process (overrides BACKFILL_LIMIT)
        #[arg(long)]
        limit: Option<u32>,

        /// Pause between documents in milliseconds (overrides BACKFILL_DELAY_MS)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Stop at the first document that fails
        #[arg(long)]
        fail_fast: bool,
    },

    /// Embed a single text and show the vector
    Embed {
        /// Text to embed
        text: String,
    },

    /// Show collection and index status
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if settings::load_env_file(&cli.env_file)? {
        tracing::debug!("Loaded environment from {}", cli.env_file.display());
    }

    // All configuration is read up front so a missing variable fails before
    // any network activity.
    let embedding_config = EmbeddingConfig::from_env().context("Invalid embedding configuration")?;
    let mongo_config = MongoConfig::from_env().context("Invalid MongoDB configuration")?;
    let search_config = SearchConfig::from_env().context("Invalid search configuration")?;
    let backfill_config = BackfillConfig::from_env().context("Invalid backfill configuration")?;

    let embedder: Arc<dyn Embedder> = Arc::new(HuggingFaceEmbedder::new(embedding_config)?);

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Search {
            query,
            limit,
            num_candidates,
            index,
        } => {
            let store = connect_store(&mongo_config).await?;
            let config = apply_search_overrides(search_config, limit, num_candidates, index);
            handle_search(embedder, store, config, &query).await?
        }
        Commands::Backfill {
            limit,
            delay_ms,
            fail_fast,
        } => {
            let config = apply_backfill_overrides(backfill_config, limit, delay_ms, fail_fast);
            config.validate().context("Invalid backfill options")?;
            let store = connect_store(&mongo_config).await?;
            handle_backfill(embedder, store, config).await?
        }
        Commands::Embed { text } => handle_embed(embedder.as_ref(), &text).await?,
        Commands::Status => {
            let store = connect_store(&mongo_config).await?;
            handle_status(store.as_ref(), &search_config).await?
        }
    }

    Ok(())
}

async fn connect_store(config: &MongoConfig) -> Result<Arc<dyn MovieStore>> {
    println!("Connecting to {}...", config.redacted_url());
    let start = Instant::now();
    let store = MongoMovieStore::connect(config)
        .await
        .context("Failed to connect to MongoDB")?;
    println!(
        "{} Connected to {}.{} in {:?}",
        "✓".green(),
        config.database,
        config.collection,
        start.elapsed()
    );
    Ok(Arc::new(store))
}

fn apply_search_overrides(
    mut config: SearchConfig,
    limit: Option<u32>,
    num_candidates: Option<u32>,
    index: Option<String>,
) -> SearchConfig {
    if let Some(limit) = limit {
        config = config.with_limit(limit);
    }
    if let Some(num_candidates) = num_candidates {
        config = config.with_num_candidates(num_candidates);
    }
    if let Some(index) = index {
        config = config.with_index(index);
    }
    config
}

fn apply_backfill_overrides(
    mut config: BackfillConfig,
    limit: Option<u32>,
    delay_ms: Option<u64>,
    fail_fast: bool,
) -> BackfillConfig {
    if let Some(limit) = limit {
        config = config.with_limit(limit);
    }
    if let Some(delay_ms) = delay_ms {
        config = config.with_delay(Duration::from_millis(delay_ms));
    }
    config.with_fail_fast(fail_fast)
}

/// Handle the 'search' command
async fn handle_search(
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn MovieStore>,
    config: SearchConfig,
    query: &str,
) -> Result<()> {
    let orchestrator = SearchOrchestrator::new(embedder, store, config)?;

    println!("\nSearching for: {}", query.bold());
    let start = Instant::now();
    let movies = orchestrator
        .search_all(query)
        .await
        .with_context(|| format!("Search for {:?} failed", query))?;

    print!("{}", output::render_results(&movies));
    println!("{} {} results in {:?}", "✓".green(), movies.len(), start.elapsed());
    Ok(())
}

/// Handle the 'backfill' command
async fn handle_backfill(
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn MovieStore>,
    config: BackfillConfig,
) -> Result<()> {
    println!(
        "\nGenerating embeddings for up to {} movies into '{}'...",
        config.limit, config.path
    );
    let job = BackfillJob::new(embedder, store, config)?;
    let report = job.run().await?;

    println!("\n{}", report.to_string().bold());
    for failure in &report.failures {
        println!(
            "  {} {} ({}): {}",
            "✗".red(),
            failure.title,
            failure.key,
            failure.reason
        );
    }

    if report.has_failures() {
        bail!("{} of {} documents failed to embed", report.failed(), report.pending);
    }
    Ok(())
}

/// Handle the 'embed' command
async fn handle_embed(embedder: &dyn Embedder, text: &str) -> Result<()> {
    let start = Instant::now();
    let embedding = embedder
        .embed(text)
        .await
        .context("Failed to generate embedding")?;

    println!(
        "{} Generated embedding of length: {} with {} in {:?}",
        "✓".green(),
        embedding.len(),
        embedder.model(),
        start.elapsed()
    );
    println!("{}", output::preview(&embedding, 8));
    Ok(())
}

/// Handle the 'status' command
async fn handle_status(store: &dyn MovieStore, config: &SearchConfig) -> Result<()> {
    let total = store.count_movies().await.context("Failed to count movies")?;
    let embedded = store
        .count_embedded(&config.path)
        .await
        .context("Failed to count embedded movies")?;

    println!("{}", "Collection status:".bold().blue());
    println!("{}Movies: {}", "• ".green(), total);
    println!("{}With '{}': {}", "• ".green(), config.path, embedded);

    match store.describe_vector_index(&config.index, &config.path).await {
        Ok(index) => println!("{}Index: {}", "• ".green(), output::describe_index(&index)),
        Err(StoreError::IndexNotFound { index, path }) => println!(
            "{}Index: {}",
            "• ".red(),
            format!("no vector index '{}' on '{}'", index, path).yellow()
        ),
        Err(e) => return Err(e).context("Failed to list search indexes"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_requires_query() {
        assert!(Cli::try_parse_from(["movie-search", "search"]).is_err());
    }

    #[test]
    fn test_parse_search_with_overrides() {
        let cli = Cli::try_parse_from([
            "movie-search",
            "--env-file",
            "local.env",
            "search",
            "imaginary characters from outer space at war",
            "--limit",
            "2",
            "--index",
            "OtherIndex",
        ])
        .unwrap();

        assert_eq!(cli.env_file, PathBuf::from("local.env"));
        let Commands::Search {
            query,
            limit,
            num_candidates,
            index,
        } = cli.command
        else {
            panic!("expected search command");
        };
        assert_eq!(query, "imaginary characters from outer space at war");

        let config = apply_search_overrides(SearchConfig::default(), limit, num_candidates, index);
        assert_eq!(config.limit, 2);
        assert_eq!(config.num_candidates, 100);
        assert_eq!(config.index, "OtherIndex");
    }

    #[test]
    fn test_parse_backfill_defaults() {
        let cli = Cli::try_parse_from(["movie-search", "backfill"]).unwrap();
        assert_eq!(cli.env_file, PathBuf::from(".env"));
        let Commands::Backfill {
            limit,
            delay_ms,
            fail_fast,
        } = cli.command
        else {
            panic!("expected backfill command");
        };

        let config = apply_backfill_overrides(BackfillConfig::default(), limit, delay_ms, fail_fast);
        assert_eq!(config, BackfillConfig::default());
    }

    #[test]
    fn test_parse_backfill_overrides() {
        let cli = Cli::try_parse_from([
            "movie-search",
            "backfill",
            "--limit",
            "5",
            "--delay-ms",
            "0",
            "--fail-fast",
        ])
        .unwrap();
        let Commands::Backfill {
            limit,
            delay_ms,
            fail_fast,
        } = cli.command
        else {
            panic!("expected backfill command");
        };

        let config = apply_backfill_overrides(BackfillConfig::default(), limit, delay_ms, fail_fast);
        assert_eq!(config.limit, 5);
        assert_eq!(config.delay, Duration::ZERO);
        assert!(config.fail_fast);
    }

    #[test]
    fn test_zero_limit_override_is_rejected() {
        let cli = Cli::try_parse_from(["movie-search", "backfill", "--limit", "0"]).unwrap();
        let Commands::Backfill {
            limit,
            delay_ms,
            fail_fast,
        } = cli.command
        else {
            panic!("expected backfill command");
        };

        let config = apply_backfill_overrides(BackfillConfig::default(), limit, delay_ms, fail_fast);
        assert!(config.validate().is_err());
    }
}
