use std::collections::{BTreeSet, HashMap};

use crate::{
    error::{AppError, AppResult},
    models::{
        MovieFilter, MovieId, MovieRecord, MovieSummary, Recommendation, RecommendationResult,
        ScoredMovie,
    },
    services::similarity::SimilarityIndex,
};

/// Number of recommendations returned by `recommend`
pub const DEFAULT_RECOMMENDATIONS: usize = 5;

/// Immutable query context over the loaded dataset and similarity index
///
/// Built once at startup and shared read-only between request handlers.
#[derive(Debug)]
pub struct Recommender {
    movies: Vec<MovieRecord>,
    index: SimilarityIndex,
    by_title: HashMap<String, usize>,
    by_lowercase_title: HashMap<String, usize>,
    default_k: usize,
}

impl Recommender {
    /// Creates the context; `index` rows must follow the order of `movies`
    pub fn new(movies: Vec<MovieRecord>, index: SimilarityIndex) -> AppResult<Self> {
        let aligned = movies.len() == index.len()
            && movies
                .iter()
                .zip(index.movie_ids())
                .all(|(movie, &id)| movie.movie_id == id);
        if !aligned {
            return Err(AppError::Validation(
                "similarity index rows do not follow the movie table".to_string(),
            ));
        }

        let mut by_title = HashMap::with_capacity(movies.len());
        let mut by_lowercase_title = HashMap::with_capacity(movies.len());
        // First occurrence wins for duplicate titles
        for (position, movie) in movies.iter().enumerate() {
            by_title.entry(movie.title.clone()).or_insert(position);
            by_lowercase_title
                .entry(movie.title.to_lowercase())
                .or_insert(position);
        }

        Ok(Self {
            movies,
            index,
            by_title,
            by_lowercase_title,
            default_k: DEFAULT_RECOMMENDATIONS,
        })
    }

    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }

    pub fn default_k(&self) -> usize {
        self.default_k
    }

    pub fn movie(&self, movie_id: MovieId) -> Option<&MovieRecord> {
        self.index.position(movie_id).map(|p| &self.movies[p])
    }

    /// Resolves a title, exact match first, then ignoring case
    pub fn resolve(&self, title: &str) -> AppResult<&MovieRecord> {
        let title = title.trim();
        self.by_title
            .get(title)
            .or_else(|| self.by_lowercase_title.get(&title.to_lowercase()))
            .map(|&p| &self.movies[p])
            .ok_or_else(|| AppError::NotFound(format!("Movie '{}' not found", title)))
    }

    /// The default number of movies most similar to `title`
    pub fn recommend(&self, title: &str) -> AppResult<RecommendationResult> {
        self.recommend_with(title, self.default_k, &MovieFilter::default())
    }

    /// The `k` movies most similar to `title` among those passing `filter`
    pub fn recommend_with(
        &self,
        title: &str,
        k: usize,
        filter: &MovieFilter,
    ) -> AppResult<RecommendationResult> {
        let movie = self.resolve(title)?;

        if filter.is_empty() {
            return self.index.top_k(movie.movie_id, k);
        }

        if !filter.matches(movie) {
            return Err(AppError::NotFound(format!(
                "Movie '{}' does not match the selected filters",
                movie.title
            )));
        }

        self.index
            .top_k_filtered(movie.movie_id, k, |p| filter.matches(&self.movies[p]))
    }

    /// Attaches titles to a result, without details
    pub fn describe(&self, result: &[ScoredMovie]) -> Vec<Recommendation> {
        result
            .iter()
            .filter_map(|scored| {
                self.movie(scored.movie_id).map(|movie| Recommendation {
                    movie_id: movie.movie_id,
                    title: movie.title.clone(),
                    score: scored.score,
                    details: None,
                })
            })
            .collect()
    }

    /// Titles matching `query`, prefix matches before substring matches
    pub fn search_titles(&self, query: &str, limit: usize) -> AppResult<Vec<MovieSummary>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Err(AppError::InvalidArgument(
                "Search query cannot be empty".to_string(),
            ));
        }

        let mut prefix = Vec::new();
        let mut substring = Vec::new();
        for movie in &self.movies {
            let title = movie.title.to_lowercase();
            if title.starts_with(&query) {
                prefix.push(movie);
            } else if title.contains(&query) {
                substring.push(movie);
            }
        }

        Ok(prefix
            .into_iter()
            .chain(substring)
            .take(limit)
            .map(MovieSummary::from)
            .collect())
    }

    /// Distinct genre names, sorted
    pub fn genres(&self) -> Vec<String> {
        self.movies
            .iter()
            .flat_map(|m| m.genres.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Earliest and latest release years in the dataset
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let mut years = self.movies.iter().filter_map(|m| m.release_year);
        let first = years.next()?;
        Some(years.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::features::FeatureBuilder;

    fn movie(id: u64, title: &str, genres: &[&str], director: &str, year: i32) -> MovieRecord {
        MovieRecord {
            genres: genres.iter().map(|g| g.to_string()).collect(),
            director: Some(director.to_string()),
            release_year: Some(year),
            ..MovieRecord::new(id, title)
        }
    }

    fn recommender() -> Recommender {
        let movies = vec![
            movie(1, "Heat", &["Action", "Crime", "Drama", "Thriller"], "Michael Mann", 1995),
            movie(2, "Collateral", &["Action", "Crime", "Drama", "Mystery"], "Michael Mann", 2004),
            movie(3, "Up", &["Animation", "Family"], "Pete Docter", 2009),
            movie(4, "Casino", &["Crime", "Drama"], "Martin Scorsese", 1995),
            movie(5, "Heat", &["Romance"], "Someone Else", 2010),
            movie(6, "The Departed", &["Crime", "Drama", "Thriller"], "Martin Scorsese", 2006),
            MovieRecord::new(7, "Lonely"),
        ];
        let features = FeatureBuilder::new().build(&movies);
        let ids = movies.iter().map(|m| m.movie_id).collect();
        let index = SimilarityIndex::build(ids, &features.vectors).unwrap();
        Recommender::new(movies, index).unwrap()
    }

    #[test]
    fn test_recommend_returns_default_count() {
        let rec = recommender();
        let result = rec.recommend("Heat").unwrap();

        assert_eq!(result.len(), DEFAULT_RECOMMENDATIONS);
        assert_eq!(result[0].movie_id, 2);
        assert!(result.iter().all(|r| r.movie_id != 1));
    }

    #[test]
    fn test_duplicate_title_resolves_to_first_occurrence() {
        let rec = recommender();
        assert_eq!(rec.resolve("Heat").unwrap().movie_id, 1);
    }

    #[test]
    fn test_resolve_ignores_case_and_whitespace() {
        let rec = recommender();
        assert_eq!(rec.resolve("  the departed ").unwrap().movie_id, 6);
    }

    #[test]
    fn test_unknown_title_is_not_found() {
        let rec = recommender();
        assert!(matches!(rec.recommend("Nope"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_zero_k_is_invalid() {
        let rec = recommender();
        let result = rec.recommend_with("Heat", 0, &MovieFilter::default());
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn test_movie_without_metadata_gets_zero_scores_in_dataset_order() {
        let rec = recommender();
        let result = rec.recommend_with("Lonely", 3, &MovieFilter::default()).unwrap();

        let ids: Vec<u64> = result.iter().map(|r| r.movie_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(result.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn test_filter_restricts_candidates() {
        let rec = recommender();
        let filter = MovieFilter {
            year_from: Some(1990),
            year_to: Some(2000),
            ..Default::default()
        };
        let result = rec.recommend_with("Heat", 5, &filter).unwrap();

        let ids: Vec<u64> = result.iter().map(|r| r.movie_id).collect();
        assert_eq!(ids, vec![4]);
    }

    #[test]
    fn test_queried_movie_must_pass_filter() {
        let rec = recommender();
        let filter = MovieFilter {
            genres: vec!["Animation".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            rec.recommend_with("Heat", 5, &filter),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_describe_attaches_titles() {
        let rec = recommender();
        let result = rec.recommend_with("Casino", 1, &MovieFilter::default()).unwrap();
        let described = rec.describe(&result);

        assert_eq!(described.len(), 1);
        assert_eq!(described[0].title, "The Departed");
        assert_eq!(described[0].details, None);
    }

    #[test]
    fn test_search_titles_prefers_prefix_matches() {
        let rec = recommender();
        let results = rec.search_titles("he", 10).unwrap();

        let titles: Vec<&str> = results.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Heat", "Heat", "The Departed"]);
    }

    #[test]
    fn test_search_titles_respects_limit_and_rejects_empty_query() {
        let rec = recommender();
        assert_eq!(rec.search_titles("e", 2).unwrap().len(), 2);
        assert!(matches!(
            rec.search_titles("  ", 5),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_genres_and_year_bounds() {
        let rec = recommender();
        assert_eq!(rec.genres().first().map(String::as_str), Some("Action"));
        assert_eq!(rec.genres().len(), 8);
        assert_eq!(rec.year_bounds(), Some((1995, 2010)));
    }
}
