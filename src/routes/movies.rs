use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{error::AppResult, models::MovieSummary, routes::AppState};

const DEFAULT_SEARCH_LIMIT: usize = 10;
const MAX_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GenresResponse {
    pub genres: Vec<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
}

/// Handler for title autocomplete
pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> AppResult<Json<Vec<MovieSummary>>> {
    let Query(params) = query?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let titles = state.recommender.search_titles(&params.q, limit)?;

    tracing::debug!(query = %params.q, results = titles.len(), "Title search completed");

    Ok(Json(titles))
}

/// Handler listing the values available for filtering
pub async fn genres(State(state): State<AppState>) -> Json<GenresResponse> {
    let bounds = state.recommender.year_bounds();
    Json(GenresResponse {
        genres: state.recommender.genres(),
        year_min: bounds.map(|(lo, _)| lo),
        year_max: bounds.map(|(_, hi)| hi),
    })
}
