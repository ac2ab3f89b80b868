use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{MovieFilter, MovieSummary, Recommendation},
    routes::AppState,
    services::providers::attach_details,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: String,
    pub k: Option<i64>,
    /// Comma separated genre names
    pub genres: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    /// Fetch posters, ratings and trailer links when a provider is configured
    #[serde(default = "default_details")]
    pub details: bool,
}

fn default_details() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub query: MovieSummary,
    pub results: Vec<Recommendation>,
}

impl RecommendationQuery {
    fn k(&self, default_k: usize, max_k: usize) -> AppResult<usize> {
        match self.k {
            None => Ok(default_k),
            Some(k) if k <= 0 => Err(AppError::InvalidArgument(
                "k must be a positive number".to_string(),
            )),
            Some(k) if k as u64 > max_k as u64 => Err(AppError::InvalidArgument(format!(
                "k must not exceed {}",
                max_k
            ))),
            Some(k) => Ok(k as usize),
        }
    }

    fn filter(&self) -> AppResult<MovieFilter> {
        if let (Some(from), Some(to)) = (self.year_from, self.year_to) {
            if from > to {
                return Err(AppError::InvalidArgument(format!(
                    "year_from ({}) is after year_to ({})",
                    from, to
                )));
            }
        }

        let genres = self
            .genres
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();

        Ok(MovieFilter {
            genres,
            year_from: self.year_from,
            year_to: self.year_to,
        })
    }
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Query(params) = query?;
    let k = params.k(state.recommender.default_k(), state.max_k)?;
    let filter = params.filter()?;

    tracing::info!(
        request_id = %request_id,
        title = %params.title,
        k,
        filtered = !filter.is_empty(),
        "Processing recommendation request"
    );

    let query = MovieSummary::from(state.recommender.resolve(&params.title)?);
    let result = state.recommender.recommend_with(&params.title, k, &filter)?;
    let mut results = state.recommender.describe(&result);

    if params.details {
        if let Some(provider) = state.details_provider.clone() {
            results = attach_details(provider, results).await;
        }
    }

    tracing::info!(
        request_id = %request_id,
        movie_id = query.movie_id,
        results = results.len(),
        "Recommendations completed"
    );

    Ok(Json(RecommendationResponse { query, results }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(k: Option<i64>) -> RecommendationQuery {
        RecommendationQuery {
            title: "Heat".to_string(),
            k,
            genres: None,
            year_from: None,
            year_to: None,
            details: true,
        }
    }

    #[test]
    fn test_k_defaults_and_bounds() {
        assert_eq!(query(None).k(5, 50).unwrap(), 5);
        assert_eq!(query(Some(12)).k(5, 50).unwrap(), 12);
        assert!(matches!(query(Some(0)).k(5, 50), Err(AppError::InvalidArgument(_))));
        assert!(matches!(query(Some(-3)).k(5, 50), Err(AppError::InvalidArgument(_))));
        assert!(matches!(query(Some(51)).k(5, 50), Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn test_filter_parses_genre_list() {
        let params = RecommendationQuery {
            genres: Some("Crime, Drama,,".to_string()),
            year_from: Some(1990),
            ..query(None)
        };
        let filter = params.filter().unwrap();
        assert_eq!(filter.genres, vec!["Crime", "Drama"]);
        assert_eq!(filter.year_from, Some(1990));
        assert_eq!(filter.year_to, None);
    }

    #[test]
    fn test_filter_rejects_inverted_year_range() {
        let params = RecommendationQuery {
            year_from: Some(2010),
            year_to: Some(2000),
            ..query(None)
        };
        assert!(matches!(params.filter(), Err(AppError::InvalidArgument(_))));
    }
}
