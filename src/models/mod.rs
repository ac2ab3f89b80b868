mod details;
mod movie;
mod recommendation;

pub use details::{MovieDetails, TmdbGenre, TmdbMovie, TmdbVideo, TmdbVideos};
pub use movie::{MovieId, MovieRecord, MovieSummary};
pub use recommendation::{
    MovieFilter, Recommendation, RecommendationResult, ScoredMovie,
};
