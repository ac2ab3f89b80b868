//! Persisted model artifacts
//!
//! `movies.json` keeps the records readable for inspection; `model.bin` holds the
//! vocabulary, feature vectors and similarity matrix encoded with bincode.
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::Path,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{MovieId, MovieRecord},
    services::{
        features::{FeatureBuilder, FeatureMatrix},
        recommender::Recommender,
        similarity::{SimilarityIndex, SimilarityMatrix},
    },
};

pub const MOVIES_FILE: &str = "movies.json";
pub const MODEL_FILE: &str = "model.bin";

/// Summary of a model build
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildInfo {
    pub movie_count: usize,
    pub vocabulary_size: usize,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelFile {
    info: BuildInfo,
    movie_ids: Vec<MovieId>,
    features: FeatureMatrix,
    similarity: SimilarityMatrix,
}

/// Everything produced by the offline preparation step
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub info: BuildInfo,
    pub movies: Vec<MovieRecord>,
    pub features: FeatureMatrix,
    pub index: SimilarityIndex,
}

impl Artifacts {
    /// Runs feature construction and similarity computation over the dataset
    pub fn build(movies: Vec<MovieRecord>, builder: &FeatureBuilder) -> AppResult<Self> {
        let features = builder.build(&movies);
        let movie_ids = movies.iter().map(|m| m.movie_id).collect();
        let index = SimilarityIndex::build(movie_ids, &features.vectors)?;

        let info = BuildInfo {
            movie_count: movies.len(),
            vocabulary_size: features.vocabulary.len(),
            built_at: Utc::now(),
        };

        Ok(Self {
            info,
            movies,
            features,
            index,
        })
    }

    /// Writes `movies.json` and `model.bin` into `dir`, creating it if needed
    pub fn save(&self, dir: &Path) -> AppResult<()> {
        fs::create_dir_all(dir)?;

        let writer = BufWriter::new(File::create(dir.join(MOVIES_FILE))?);
        serde_json::to_writer(writer, &self.movies)?;

        let model = ModelFile {
            info: self.info.clone(),
            movie_ids: self.index.movie_ids().to_vec(),
            features: self.features.clone(),
            similarity: self.index.matrix().clone(),
        };
        let bytes = bincode::serde::encode_to_vec(&model, bincode::config::standard())?;
        fs::write(dir.join(MODEL_FILE), bytes)?;

        tracing::info!(
            dir = %dir.display(),
            movie_count = self.info.movie_count,
            vocabulary_size = self.info.vocabulary_size,
            "Artifacts saved"
        );

        Ok(())
    }

    /// Reads artifacts written by `save`
    pub fn load(dir: &Path) -> AppResult<Self> {
        let reader = BufReader::new(File::open(dir.join(MOVIES_FILE))?);
        let movies: Vec<MovieRecord> = serde_json::from_reader(reader)?;

        let bytes = fs::read(dir.join(MODEL_FILE))?;
        let (model, _): (ModelFile, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;

        let ids_match = movies.len() == model.movie_ids.len()
            && movies
                .iter()
                .zip(&model.movie_ids)
                .all(|(movie, &id)| movie.movie_id == id);
        if !ids_match {
            return Err(AppError::Validation(format!(
                "{} does not match the movies in {}",
                MODEL_FILE, MOVIES_FILE
            )));
        }
        if model.features.vectors.len() != movies.len() {
            return Err(AppError::Validation(format!(
                "{} feature vectors for {} movies",
                model.features.vectors.len(),
                movies.len()
            )));
        }
        model.features.validate()?;

        let index = SimilarityIndex::new(model.movie_ids, model.similarity)?;

        tracing::info!(
            dir = %dir.display(),
            movie_count = model.info.movie_count,
            built_at = %model.info.built_at,
            "Artifacts loaded"
        );

        Ok(Self {
            info: model.info,
            movies,
            features: model.features,
            index,
        })
    }

    pub fn into_recommender(self) -> AppResult<Recommender> {
        Recommender::new(self.movies, self.index)
    }
}
