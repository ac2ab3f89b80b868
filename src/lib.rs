//! Content-based movie recommendations.
//!
//! Movies are encoded as bag-of-words vectors over their genres, top cast,
//! director and keywords. An all-pairs cosine similarity matrix is computed
//! offline and persisted; the server answers "movies like this one" queries
//! from it and can decorate results with TMDB posters and trailers.

pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
