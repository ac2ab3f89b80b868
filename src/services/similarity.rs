//! Cosine similarity index
//!
//! Holds the dense movie-by-movie similarity matrix and answers top-k queries
//! against it. The matrix is quadratic in the number of movies, which is fine for
//! a few thousand titles but would need a nearest-neighbour index beyond that.
use std::{collections::HashMap, time::Instant};

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{MovieId, RecommendationResult, ScoredMovie},
    services::features::FeatureVector,
};

/// Cosine from a dot product and precomputed norms, 0 when either norm is 0
fn cosine(dot: f64, norm_a: f64, norm_b: f64) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    ((dot / (norm_a * norm_b)) as f32).clamp(0.0, 1.0)
}


/// Square symmetric matrix stored row-major
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Computes all pairwise similarities
    ///
    /// Each unordered pair is computed once and mirrored, so `get(i, j) == get(j, i)`
    /// holds exactly.
    pub fn compute(vectors: &[FeatureVector]) -> Self {
        let started = Instant::now();
        let size = vectors.len();
        let norms: Vec<f64> = vectors.iter().map(FeatureVector::norm).collect();
        let mut values = vec![0.0f32; size * size];

        for i in 0..size {
            values[i * size + i] = if vectors[i].is_zero() { 0.0 } else { 1.0 };
            for j in (i + 1)..size {
                let sim = cosine(vectors[i].dot(&vectors[j]), norms[i], norms[j]);
                values[i * size + j] = sim;
                values[j * size + i] = sim;
            }
        }

        tracing::info!(
            size,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Similarity matrix computed"
        );

        Self { size, values }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[i * self.size + j]
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    fn is_well_formed(&self) -> bool {
        self.size
            .checked_mul(self.size)
            .is_some_and(|cells| cells == self.values.len())
    }
}

/// Similarity matrix addressed by movie id
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    movie_ids: Vec<MovieId>,
    positions: HashMap<MovieId, usize>,
    matrix: SimilarityMatrix,
}

impl SimilarityIndex {
    /// Builds the index from feature vectors given in the same order as `movie_ids`
    pub fn build(movie_ids: Vec<MovieId>, vectors: &[FeatureVector]) -> AppResult<Self> {
        if movie_ids.len() != vectors.len() {
            return Err(AppError::Validation(format!(
                "{} movie ids for {} feature vectors",
                movie_ids.len(),
                vectors.len()
            )));
        }

        Self::new(movie_ids, SimilarityMatrix::compute(vectors))
    }

    /// Wraps a precomputed matrix, rows in the same order as `movie_ids`
    pub fn new(movie_ids: Vec<MovieId>, matrix: SimilarityMatrix) -> AppResult<Self> {
        if !matrix.is_well_formed() || matrix.size() != movie_ids.len() {
            return Err(AppError::Validation(format!(
                "similarity matrix of size {} does not match {} movies",
                matrix.size(),
                movie_ids.len()
            )));
        }

        let mut positions = HashMap::with_capacity(movie_ids.len());
        for (position, &movie_id) in movie_ids.iter().enumerate() {
            if positions.insert(movie_id, position).is_some() {
                return Err(AppError::Validation(format!(
                    "duplicate movie id {} in similarity index",
                    movie_id
                )));
            }
        }

        Ok(Self {
            movie_ids,
            positions,
            matrix,
        })
    }

    pub fn len(&self) -> usize {
        self.movie_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movie_ids.is_empty()
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    pub fn movie_ids(&self) -> &[MovieId] {
        &self.movie_ids
    }

    pub fn position(&self, movie_id: MovieId) -> Option<usize> {
        self.positions.get(&movie_id).copied()
    }

    /// The `k` movies most similar to `movie_id`, excluding itself
    pub fn top_k(&self, movie_id: MovieId, k: usize) -> AppResult<RecommendationResult> {
        self.top_k_filtered(movie_id, k, |_| true)
    }

    /// Like `top_k`, considering only rows accepted by `accept`
    pub fn top_k_filtered<F>(
        &self,
        movie_id: MovieId,
        k: usize,
        accept: F,
    ) -> AppResult<RecommendationResult>
    where
        F: Fn(usize) -> bool,
    {
        if k == 0 {
            return Err(AppError::InvalidArgument(
                "k must be a positive number".to_string(),
            ));
        }

        let row_index = self.require(movie_id)?;

        let mut candidates: Vec<(usize, f32)> = self
            .matrix
            .row(row_index)
            .iter()
            .copied()
            .enumerate()
            .filter(|&(j, _)| j != row_index && accept(j))
            .collect();

        // Stable: equal scores keep dataset order
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(candidates
            .into_iter()
            .take(k)
            .map(|(j, score)| ScoredMovie {
                movie_id: self.movie_ids[j],
                score,
            })
            .collect())
    }

    fn require(&self, movie_id: MovieId) -> AppResult<usize> {
        self.position(movie_id)
            .ok_or_else(|| AppError::NotFound(format!("Movie id {} is not indexed", movie_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::MovieRecord, services::features::FeatureBuilder};

    fn record(id: u64, genres: &[&str], director: Option<&str>) -> MovieRecord {
        MovieRecord {
            genres: genres.iter().map(|g| g.to_string()).collect(),
            director: director.map(str::to_string),
            ..MovieRecord::new(id, format!("Movie {}", id))
        }
    }

    fn similarity(index: &SimilarityIndex, a: MovieId, b: MovieId) -> f32 {
        index
            .matrix()
            .get(index.position(a).unwrap(), index.position(b).unwrap())
    }

    fn index_for(records: &[MovieRecord]) -> SimilarityIndex {
        let features = FeatureBuilder::new().build(records);
        let ids = records.iter().map(|r| r.movie_id).collect();
        SimilarityIndex::build(ids, &features.vectors).unwrap()
    }

    fn sample() -> Vec<MovieRecord> {
        vec![
            record(10, &["Action", "Crime", "Thriller", "Drama"], Some("Michael Mann")),
            record(20, &["Action", "Crime", "Thriller", "Mystery"], Some("Michael Mann")),
            record(30, &["Animation", "Family"], Some("Pete Docter")),
            record(40, &["Crime", "Drama"], Some("Martin Scorsese")),
            record(50, &[], None),
        ]
    }

    #[test]
    fn test_matrix_is_symmetric_and_bounded() {
        let index = index_for(&sample());
        let matrix = index.matrix();

        for i in 0..matrix.size() {
            for j in 0..matrix.size() {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
                assert!((0.0..=1.0).contains(&matrix.get(i, j)));
            }
        }
    }

    #[test]
    fn test_self_similarity() {
        let index = index_for(&sample());
        for i in 0..4 {
            assert_eq!(index.matrix().get(i, i), 1.0);
        }
        // all-zero vector
        assert_eq!(index.matrix().get(4, 4), 0.0);
    }

    #[test]
    fn test_zero_vector_is_dissimilar_to_everything() {
        let index = index_for(&sample());
        assert!(index.matrix().row(4).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_shared_director_and_genres_rank_higher() {
        let index = index_for(&sample());
        let close = similarity(&index, 10, 20);
        let unrelated = similarity(&index, 10, 30);

        assert!(close > unrelated);
        assert_eq!(unrelated, 0.0);
    }

    #[test]
    fn test_top_k_excludes_self_and_is_sorted() {
        let index = index_for(&sample());
        let result = index.top_k(10, 3).unwrap();

        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|r| r.movie_id != 10));
        assert_eq!(result[0].movie_id, 20);
        assert_eq!(result[1].movie_id, 40);
        assert!(result.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_top_k_returns_min_of_k_and_n_minus_one() {
        let index = index_for(&sample());
        for &movie_id in index.movie_ids() {
            assert_eq!(index.top_k(movie_id, 2).unwrap().len(), 2);
            assert_eq!(index.top_k(movie_id, 100).unwrap().len(), 4);
        }
    }

    #[test]
    fn test_ties_keep_dataset_order() {
        let index = index_for(&sample());
        let result = index.top_k(50, 4).unwrap();

        let ids: Vec<u64> = result.iter().map(|r| r.movie_id).collect();
        assert_eq!(ids, vec![10, 20, 30, 40]);
        assert!(result.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn test_top_k_filtered() {
        let index = index_for(&sample());
        let result = index.top_k_filtered(10, 5, |j| j != 1).unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].movie_id, 40);
    }

    #[test]
    fn test_unknown_movie_is_not_found() {
        let index = index_for(&sample());
        assert!(matches!(index.top_k(999, 5), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_zero_k_is_invalid() {
        let index = index_for(&sample());
        assert!(matches!(index.top_k(10, 0), Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn test_rebuild_is_identical() {
        let records = sample();
        assert_eq!(index_for(&records).matrix(), index_for(&records).matrix());
    }

    #[test]
    fn test_mismatched_matrix_is_rejected() {
        let matrix = SimilarityMatrix::compute(&[]);
        let result = SimilarityIndex::new(vec![1], matrix);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_matrix_values_are_cosine_of_counts() {
        let index = index_for(&sample());
        // 2 shared tokens out of 5 and 3
        let expected = 2.0 / (5f64.sqrt() * 3f64.sqrt());
        assert!((f64::from(similarity(&index, 10, 40)) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_oversized_matrix_is_not_well_formed() {
        let matrix = SimilarityMatrix {
            size: usize::MAX,
            values: Vec::new(),
        };
        assert!(!matrix.is_well_formed());
    }
}
