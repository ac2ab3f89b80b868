use serde::{Deserialize, Serialize};

use super::{MovieDetails, MovieId, MovieRecord};

/// A candidate movie with its similarity to the queried movie
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoredMovie {
    pub movie_id: MovieId,
    pub score: f32,
}

/// Ordered by descending score, ties in dataset order
pub type RecommendationResult = Vec<ScoredMovie>;

/// A recommended movie as returned to the client
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<MovieDetails>,
}

/// Genre and release year restrictions on the candidate set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieFilter {
    /// A movie passes when it has at least one of these genres; empty means any genre
    pub genres: Vec<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
}

impl MovieFilter {
    /// Checks whether the filter restricts anything
    pub fn is_empty(&self) -> bool {
        self.genres.is_empty() && self.year_from.is_none() && self.year_to.is_none()
    }

    /// Checks whether a movie passes the filter
    ///
    /// Movies without a release year fail any active year bound.
    pub fn matches(&self, movie: &MovieRecord) -> bool {
        if !self.genres.is_empty() && !self.genres.iter().any(|g| movie.has_genre(g)) {
            return false;
        }

        if self.year_from.is_none() && self.year_to.is_none() {
            return true;
        }

        match movie.release_year {
            Some(year) => {
                self.year_from.map_or(true, |from| year >= from)
                    && self.year_to.map_or(true, |to| year <= to)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(genres: &[&str], year: Option<i32>) -> MovieRecord {
        MovieRecord {
            genres: genres.iter().map(|g| g.to_string()).collect(),
            release_year: year,
            ..MovieRecord::new(1, "Heat")
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = MovieFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&movie(&[], None)));
    }

    #[test]
    fn test_genre_filter_matches_any_selected_genre() {
        let filter = MovieFilter {
            genres: vec!["Crime".to_string(), "Western".to_string()],
            ..Default::default()
        };
        assert!(filter.matches(&movie(&["Action", "Crime"], Some(1995))));
        assert!(!filter.matches(&movie(&["Drama"], Some(1995))));
    }

    #[test]
    fn test_year_range_is_inclusive() {
        let filter = MovieFilter {
            year_from: Some(1990),
            year_to: Some(1995),
            ..Default::default()
        };
        assert!(filter.matches(&movie(&[], Some(1990))));
        assert!(filter.matches(&movie(&[], Some(1995))));
        assert!(!filter.matches(&movie(&[], Some(1996))));
    }

    #[test]
    fn test_missing_year_fails_active_year_bound() {
        let filter = MovieFilter {
            year_from: Some(2000),
            ..Default::default()
        };
        assert!(!filter.matches(&movie(&["Drama"], None)));
    }

    #[test]
    fn test_recommendation_omits_missing_details() {
        let rec = Recommendation {
            movie_id: 949,
            title: "Heat".to_string(),
            score: 0.5,
            details: None,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(json["movie_id"], 949);
    }
}
