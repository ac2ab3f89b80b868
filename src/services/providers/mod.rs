//! Movie details providers
//!
//! Recommendations only carry ids, titles and scores. Providers look up the
//! presentation data (poster, rating, IMDb and trailer links) for a movie id.
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{MovieDetails, MovieId, Recommendation},
};

pub mod tmdb;

/// Trait for movie details sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieDetailsProvider: Send + Sync {
    /// Fetch presentation data for a movie
    async fn movie_details(&self, movie_id: MovieId) -> AppResult<MovieDetails>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Fills in `details` for every recommendation, fetching in parallel
///
/// A failed lookup is logged and replaced by empty details so that one bad
/// upstream response never hides the recommendation itself. Order is preserved.
pub async fn attach_details(
    provider: Arc<dyn MovieDetailsProvider>,
    recommendations: Vec<Recommendation>,
) -> Vec<Recommendation> {
    let tasks: Vec<_> = recommendations
        .iter()
        .map(|rec| {
            let provider = provider.clone();
            let movie_id = rec.movie_id;
            tokio::spawn(async move { provider.movie_details(movie_id).await })
        })
        .collect();

    let mut enriched = Vec::with_capacity(recommendations.len());
    let mut failures = 0;

    for (mut rec, task) in recommendations.into_iter().zip(tasks) {
        let details = match task.await {
            Ok(Ok(details)) => details,
            Ok(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    movie_id = rec.movie_id,
                    provider = provider.name(),
                    "Movie details lookup failed"
                );
                failures += 1;
                MovieDetails::default()
            }
            Err(e) => {
                tracing::error!(error = %e, movie_id = rec.movie_id, "Task join error");
                failures += 1;
                MovieDetails::default()
            }
        };
        rec.details = Some(details);
        enriched.push(rec);
    }

    if failures > 0 {
        tracing::warn!(
            success_count = enriched.len() - failures,
            error_count = failures,
            "Partial movie details failure"
        );
    }

    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn recommendation(movie_id: MovieId) -> Recommendation {
        Recommendation {
            movie_id,
            title: format!("Movie {}", movie_id),
            score: 0.5,
            details: None,
        }
    }

    #[tokio::test]
    async fn test_attach_details_preserves_order() {
        let mut mock = MockMovieDetailsProvider::new();
        mock.expect_movie_details().returning(|id| {
            Ok(MovieDetails {
                genres: format!("genre-{}", id),
                ..Default::default()
            })
        });
        mock.expect_name().return_const("mock");

        let enriched = attach_details(
            Arc::new(mock),
            vec![recommendation(3), recommendation(1), recommendation(2)],
        )
        .await;

        let genres: Vec<String> = enriched
            .iter()
            .map(|r| r.details.as_ref().unwrap().genres.clone())
            .collect();
        assert_eq!(genres, vec!["genre-3", "genre-1", "genre-2"]);
    }

    #[tokio::test]
    async fn test_attach_details_falls_back_to_empty_details() {
        let mut mock = MockMovieDetailsProvider::new();
        mock.expect_movie_details().returning(|id| {
            if id == 2 {
                Err(AppError::ExternalApi("TMDB returned 500".to_string()))
            } else {
                Ok(MovieDetails {
                    rating: Some(7.5),
                    ..Default::default()
                })
            }
        });
        mock.expect_name().return_const("mock");

        let enriched =
            attach_details(Arc::new(mock), vec![recommendation(1), recommendation(2)]).await;

        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].details.as_ref().unwrap().rating, Some(7.5));
        assert_eq!(enriched[1].details, Some(MovieDetails::default()));
    }
}
