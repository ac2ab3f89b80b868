use serde::{Deserialize, Serialize};

const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
const IMDB_TITLE_URL: &str = "https://www.imdb.com/title";
const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Presentation data for a recommended movie
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub poster_url: Option<String>,
    pub rating: Option<f32>,
    pub imdb_url: Option<String>,
    /// Comma separated genre names as reported by TMDB
    pub genres: String,
    pub trailer_url: Option<String>,
}

impl MovieDetails {
    /// Combines the TMDB movie and videos responses
    pub fn from_tmdb(movie: TmdbMovie, videos: Option<TmdbVideos>) -> Self {
        let poster_url = movie
            .poster_path
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}{}", POSTER_BASE_URL, p));

        let imdb_url = movie
            .imdb_id
            .filter(|id| !id.is_empty())
            .map(|id| format!("{}/{}/", IMDB_TITLE_URL, id));

        let genres = movie
            .genres
            .iter()
            .filter_map(|g| g.name.as_deref())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let trailer_url = videos.and_then(|v| v.youtube_trailer_url());

        Self {
            poster_url,
            rating: movie.vote_average,
            imdb_url,
            genres,
            trailer_url,
        }
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// TMDB response from GET /3/movie/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    #[serde(default)]
    pub name: Option<String>,
}

/// TMDB response from GET /3/movie/{id}/videos
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideos {
    #[serde(default)]
    pub results: Vec<TmdbVideo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideo {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(rename = "type", default)]
    pub video_type: Option<String>,
}

impl TmdbVideos {
    /// Watch URL of the first YouTube trailer
    pub fn youtube_trailer_url(&self) -> Option<String> {
        self.results
            .iter()
            .find(|v| {
                v.video_type.as_deref() == Some("Trailer")
                    && v.site.as_deref() == Some("YouTube")
                    && v.key.as_deref().is_some_and(|k| !k.is_empty())
            })
            .and_then(|v| v.key.as_ref())
            .map(|key| format!("{}{}", YOUTUBE_WATCH_URL, key))
    }
}
