use serde::{Deserialize, Serialize};

/// TMDB movie identifier
pub type MovieId = u64;

/// One film of the dataset with the metadata used for similarity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub cast: Vec<String>,
    pub director: Option<String>,
    pub keywords: Vec<String>,
    pub release_year: Option<i32>,
}

impl MovieRecord {
    /// Creates a record with no metadata
    pub fn new(movie_id: MovieId, title: impl Into<String>) -> Self {
        Self {
            movie_id,
            title: title.into(),
            genres: Vec::new(),
            cast: Vec::new(),
            director: None,
            keywords: Vec::new(),
            release_year: None,
        }
    }

    /// Iterates over every raw metadata value that contributes to the feature vector
    pub fn metadata(&self) -> impl Iterator<Item = &str> {
        self.genres
            .iter()
            .chain(self.cast.iter())
            .chain(self.director.iter())
            .chain(self.keywords.iter())
            .map(String::as_str)
    }

    /// Checks if the movie carries the genre, ignoring case
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }
}

/// Title entry returned by title search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub movie_id: MovieId,
    pub title: String,
    pub release_year: Option<i32>,
}

impl From<&MovieRecord> for MovieSummary {
    fn from(movie: &MovieRecord) -> Self {
        Self {
            movie_id: movie.movie_id,
            title: movie.title.clone(),
            release_year: movie.release_year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_has_no_metadata() {
        let movie = MovieRecord::new(19995, "Avatar");
        assert_eq!(movie.title, "Avatar");
        assert_eq!(movie.metadata().count(), 0);
    }

    #[test]
    fn test_metadata_covers_all_fields() {
        let movie = MovieRecord {
            genres: vec!["Action".to_string()],
            cast: vec!["Sam Worthington".to_string()],
            director: Some("James Cameron".to_string()),
            keywords: vec!["space colony".to_string()],
            ..MovieRecord::new(19995, "Avatar")
        };

        let values: Vec<&str> = movie.metadata().collect();
        assert_eq!(
            values,
            vec!["Action", "Sam Worthington", "James Cameron", "space colony"]
        );
    }

    #[test]
    fn test_has_genre_ignores_case() {
        let movie = MovieRecord {
            genres: vec!["Science Fiction".to_string()],
            ..MovieRecord::new(1, "Alien")
        };
        assert!(movie.has_genre("science fiction"));
        assert!(!movie.has_genre("Drama"));
    }
}
