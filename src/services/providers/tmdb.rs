//! TMDB movie details provider
//!
//! API Flow:
//! 1. Details: /3/movie/{id} → poster path, IMDb id, vote average, genres
//! 2. Videos: /3/movie/{id}/videos → first YouTube trailer
//!
//! A failed videos request only drops the trailer link.
use crate::{
    cache::{Cache, CacheKey},
    cached,
    error::{AppError, AppResult},
    models::{MovieDetails, MovieId, TmdbMovie, TmdbVideos},
    services::providers::MovieDetailsProvider,
};
use reqwest::Client as HttpClient;
use std::time::Duration;

const DETAILS_CACHE_TTL: u64 = 86400; // 1 day
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const LANGUAGE: &str = "en-US";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Option<Cache>,
}

impl TmdbProvider {
    pub fn new(api_key: String, api_url: String, cache: Option<Cache>) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    fn movie_url(&self, movie_id: MovieId) -> String {
        format!("{}/3/movie/{}", self.api_url, movie_id)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        let response = self
            .http_client
            .get(url)
            .query(&[("api_key", self.api_key.as_str()), ("language", LANGUAGE)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn fetch_details(&self, movie_id: MovieId) -> AppResult<MovieDetails> {
        let movie: TmdbMovie = self.get(&self.movie_url(movie_id)).await?;

        let videos_url = format!("{}/videos", self.movie_url(movie_id));
        let videos = match self.get::<TmdbVideos>(&videos_url).await {
            Ok(videos) => Some(videos),
            Err(e) => {
                tracing::debug!(error = %e, movie_id, "TMDB videos lookup failed");
                None
            }
        };

        let details = MovieDetails::from_tmdb(movie, videos);

        tracing::info!(
            movie_id,
            has_poster = details.poster_url.is_some(),
            has_trailer = details.trailer_url.is_some(),
            provider = "tmdb",
            "Movie details fetched"
        );

        Ok(details)
    }
}

#[async_trait::async_trait]
impl MovieDetailsProvider for TmdbProvider {
    async fn movie_details(&self, movie_id: MovieId) -> AppResult<MovieDetails> {
        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::MovieDetails(movie_id),
                DETAILS_CACHE_TTL,
                self.fetch_details(movie_id)
            ),
            None => self.fetch_details(movie_id).await,
        }
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
