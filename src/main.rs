use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use movie_recommender::{
    cache::{create_redis_client, Cache, CacheWriterHandle},
    config::Config,
    models::MovieFilter,
    routes::{create_router, AppState},
    services::{
        dataset::DEFAULT_CAST_LIMIT, providers::tmdb::TmdbProvider, Artifacts, DatasetLoader,
        FeatureBuilder, Recommender,
    },
};

#[derive(Debug, Parser)]
#[command(name = "movie-recommender", version, about = "Content-based movie recommendations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the similarity model from the movie dataset
    Build {
        /// Movies CSV (TMDB layout keyed by `id`, or pre-merged keyed by `movie_id`)
        #[arg(long)]
        movies: PathBuf,
        /// TMDB credits CSV providing cast and crew
        #[arg(long)]
        credits: Option<PathBuf>,
        /// Output directory, defaults to ARTIFACTS_DIR
        #[arg(long)]
        out: Option<PathBuf>,
        /// Keep only the N most common tokens
        #[arg(long)]
        max_features: Option<usize>,
        /// Number of leading cast members per movie
        #[arg(long, default_value_t = DEFAULT_CAST_LIMIT)]
        cast_limit: usize,
    },
    /// Serve the HTTP API
    Serve {
        /// Artifacts directory, defaults to ARTIFACTS_DIR
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },
    /// Print recommendations for a title
    Recommend {
        title: String,
        #[arg(long)]
        k: Option<usize>,
        /// Only recommend movies with one of these genres
        #[arg(long, value_delimiter = ',')]
        genres: Vec<String>,
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("movie_recommender=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Build {
            movies,
            credits,
            out,
            max_features,
            cast_limit,
        } => {
            let out = out.unwrap_or_else(|| config.artifacts_dir.clone());
            let records = DatasetLoader::new()
                .with_cast_limit(cast_limit)
                .load(&movies, credits.as_deref())
                .context("Failed to load movie dataset")?;

            let builder = FeatureBuilder::new().with_max_features(max_features);
            let artifacts = Artifacts::build(records, &builder)?;
            artifacts.save(&out).context("Failed to save artifacts")?;
        }
        Command::Serve { artifacts } => {
            let dir = artifacts.unwrap_or_else(|| config.artifacts_dir.clone());
            serve(&config, load_recommender(&dir, &config)?).await?;
        }
        Command::Recommend {
            title,
            k,
            genres,
            artifacts,
        } => {
            let dir = artifacts.unwrap_or_else(|| config.artifacts_dir.clone());
            let recommender = load_recommender(&dir, &config)?;
            let filter = MovieFilter {
                genres,
                ..Default::default()
            };

            let k = k.unwrap_or(recommender.default_k());
            let result = recommender.recommend_with(&title, k, &filter)?;
            for rec in recommender.describe(&result) {
                println!("{:.4}  {}  ({})", rec.score, rec.title, rec.movie_id);
            }
        }
    }

    Ok(())
}

fn load_recommender(dir: &std::path::Path, config: &Config) -> anyhow::Result<Recommender> {
    let recommender = Artifacts::load(dir)
        .and_then(Artifacts::into_recommender)
        .with_context(|| format!("Failed to load artifacts from {}", dir.display()))?;
    Ok(recommender.with_default_k(config.recommendation_count))
}

async fn serve(config: &Config, recommender: Recommender) -> anyhow::Result<()> {
    let mut state = AppState::new(recommender, config.max_k);
    let mut cache_writer: Option<CacheWriterHandle> = None;

    match &config.tmdb_api_key {
        Some(api_key) => {
            let cache = match &config.redis_url {
                Some(url) => {
                    let (cache, handle) = Cache::new(create_redis_client(url)?);
                    cache_writer = Some(handle);
                    Some(cache)
                }
                None => None,
            };
            let provider = TmdbProvider::new(api_key.clone(), config.tmdb_api_url.clone(), cache)?;
            state = state.with_details_provider(Arc::new(provider));
            tracing::info!(cached = cache_writer.is_some(), "TMDB movie details enabled");
        }
        None => tracing::warn!("TMDB_API_KEY not set, serving recommendations without details"),
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
