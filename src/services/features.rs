//! Bag-of-words feature construction
//!
//! Every genre, cast member, director and keyword of a movie becomes one opaque
//! token. The vocabulary is the sorted set of all tokens, and each movie is encoded
//! as the count of each vocabulary token in its metadata.
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::MovieRecord,
};

/// Normalizes a metadata value into a token
///
/// Whitespace is removed so that "Sam Worthington" and "Sam Mendes" do not share
/// a "sam" dimension.
pub fn normalize_token(raw: &str) -> Option<String> {
    let token: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    (!token.is_empty()).then_some(token)
}

/// Sorted distinct tokens; a token's position is its index
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
}

impl Vocabulary {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        let mut tokens: Vec<String> = tokens.into_iter().collect();
        tokens.sort();
        tokens.dedup();
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn position(&self, token: &str) -> Option<usize> {
        self.tokens.binary_search_by(|t| t.as_str().cmp(token)).ok()
    }
}

/// Token counts over a vocabulary, stored as `(position, count)` pairs sorted by position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureVector {
    dimension: usize,
    entries: Vec<(u32, u32)>,
}

impl FeatureVector {
    /// True when the movie shares no token with the vocabulary
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries
            .iter()
            .map(|&(_, c)| f64::from(c) * f64::from(c))
            .sum::<f64>()
            .sqrt()
    }

    pub fn dot(&self, other: &FeatureVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;

        while i < self.entries.len() && j < other.entries.len() {
            let (pa, ca) = self.entries[i];
            let (pb, cb) = other.entries[j];
            match pa.cmp(&pb) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += f64::from(ca) * f64::from(cb);
                    i += 1;
                    j += 1;
                }
            }
        }

        sum
    }
}

/// Vocabulary plus one vector per movie, in dataset order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureMatrix {
    pub vocabulary: Vocabulary,
    pub vectors: Vec<FeatureVector>,
}

impl FeatureMatrix {
    /// Checks that every vector spans the vocabulary with in-range, sorted positions
    pub fn validate(&self) -> AppResult<()> {
        let dimension = self.vocabulary.len();
        for (row, vector) in self.vectors.iter().enumerate() {
            if vector.dimension != dimension {
                return Err(AppError::Validation(format!(
                    "feature vector {} has {} dimensions, vocabulary has {}",
                    row, vector.dimension, dimension
                )));
            }
            let ordered = vector.entries.windows(2).all(|w| w[0].0 < w[1].0);
            let in_range = vector
                .entries
                .iter()
                .all(|&(p, _)| (p as usize) < dimension);
            if !ordered || !in_range {
                return Err(AppError::Validation(format!(
                    "feature vector {} has positions outside the vocabulary",
                    row
                )));
            }
        }
        Ok(())
    }
}

/// Builds feature vectors from movie metadata
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    max_features: Option<usize>,
}

impl FeatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only the `max_features` tokens present in the most movies
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn build(&self, records: &[MovieRecord]) -> FeatureMatrix {
        let documents: Vec<Vec<String>> = records
            .iter()
            .map(|r| r.metadata().filter_map(normalize_token).collect())
            .collect();

        let vocabulary = self.build_vocabulary(&documents);

        let vectors = documents
            .iter()
            .map(|tokens| vectorize(&vocabulary, tokens))
            .collect();

        tracing::info!(
            movie_count = records.len(),
            vocabulary_size = vocabulary.len(),
            "Feature vectors built"
        );

        FeatureMatrix {
            vocabulary,
            vectors,
        }
    }

    fn build_vocabulary(&self, documents: &[Vec<String>]) -> Vocabulary {
        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in documents {
            let distinct: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for token in distinct {
                *document_frequency.entry(token).or_default() += 1;
            }
        }

        match self.max_features {
            Some(limit) if document_frequency.len() > limit => {
                let mut ranked: Vec<(&str, usize)> = document_frequency.into_iter().collect();
                // BTreeMap order makes the stable sort break ties alphabetically
                ranked.sort_by(|a, b| b.1.cmp(&a.1));
                ranked.truncate(limit);
                Vocabulary::new(ranked.into_iter().map(|(t, _)| t.to_string()))
            }
            _ => Vocabulary::new(document_frequency.into_keys().map(str::to_string)),
        }
    }
}

fn vectorize(vocabulary: &Vocabulary, tokens: &[String]) -> FeatureVector {
    let mut counts: BTreeMap<u32, u32> = BTreeMap::new();
    for token in tokens {
        if let Some(position) = vocabulary.position(token) {
            *counts.entry(position as u32).or_default() += 1;
        }
    }

    FeatureVector {
        dimension: vocabulary.len(),
        entries: counts.into_iter().collect(),
    }
}
