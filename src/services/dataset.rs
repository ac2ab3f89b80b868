//! Dataset loading
//!
//! Parses the movie table into typed `MovieRecord`s. Two layouts are accepted:
//!
//! 1. TMDB 5000: a movies CSV keyed by `id` (`genres`, `keywords` as JSON arrays of
//!    `{"id", "name"}` objects) plus an optional credits CSV keyed by `movie_id`
//!    (`cast`, `crew` as JSON arrays).
//! 2. Pre-merged: a single CSV keyed by `movie_id` with `genres`, `cast`, `director`
//!    and `keywords` columns.
//!
//! Malformed rows are rejected with `AppError::Validation` instead of being skipped.
use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::Read,
    path::Path,
};

use chrono::{Datelike, NaiveDate};
use csv::{Reader, StringRecord};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{MovieId, MovieRecord},
};

/// Number of leading cast members kept per movie
pub const DEFAULT_CAST_LIMIT: usize = 3;

const DIRECTOR_JOB: &str = "Director";

#[derive(Debug, Deserialize)]
struct TmdbMovieRow {
    id: String,
    title: String,
    #[serde(default)]
    genres: String,
    #[serde(default)]
    keywords: String,
    #[serde(default)]
    release_date: String,
}

#[derive(Debug, Deserialize)]
struct TmdbCreditsRow {
    movie_id: String,
    #[serde(default)]
    cast: String,
    #[serde(default)]
    crew: String,
}

#[derive(Debug, Deserialize)]
struct MergedMovieRow {
    movie_id: String,
    title: String,
    #[serde(default)]
    genres: String,
    #[serde(default)]
    cast: String,
    #[serde(default)]
    director: String,
    #[serde(default)]
    keywords: String,
    #[serde(default)]
    release_date: String,
}

#[derive(Debug, Deserialize)]
struct CrewMember {
    #[serde(default)]
    job: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Loads movie records from CSV files
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    cast_limit: usize,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self {
            cast_limit: DEFAULT_CAST_LIMIT,
        }
    }

    pub fn with_cast_limit(mut self, cast_limit: usize) -> Self {
        self.cast_limit = cast_limit;
        self
    }

    /// Loads the movies file, merging in the credits file when given
    pub fn load(&self, movies_path: &Path, credits_path: Option<&Path>) -> AppResult<Vec<MovieRecord>> {
        tracing::info!(
            movies = %movies_path.display(),
            credits = ?credits_path.map(|p| p.display().to_string()),
            "Loading movie dataset"
        );

        let movies = File::open(movies_path)?;
        let records = match credits_path {
            Some(path) => self.read(movies, Some(File::open(path)?))?,
            None => self.read(movies, None::<File>)?,
        };

        tracing::info!(movie_count = records.len(), "Movie dataset loaded");
        Ok(records)
    }

    /// Parses the movie table, detecting the layout from its header
    pub fn read<M: Read, C: Read>(&self, movies: M, credits: Option<C>) -> AppResult<Vec<MovieRecord>> {
        let mut reader = Reader::from_reader(movies);
        let headers = reader.headers()?.clone();
        let is_merged = headers.iter().any(|h| h == "movie_id");

        let mut records = if is_merged {
            self.read_merged(&mut reader, &headers)?
        } else {
            self.read_tmdb_movies(&mut reader, &headers)?
        };

        if let Some(credits) = credits {
            self.apply_credits(&mut records, credits)?;
        }

        Ok(records)
    }

    fn read_tmdb_movies<R: Read>(
        &self,
        reader: &mut Reader<R>,
        headers: &StringRecord,
    ) -> AppResult<Vec<MovieRecord>> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();

        for result in reader.records() {
            let raw = result.map_err(row_error)?;
            let line = line_of(&raw);
            let row: TmdbMovieRow = raw.deserialize(Some(headers)).map_err(|e| {
                AppError::Validation(format!("line {}: malformed movie row: {}", line, e))
            })?;

            let movie_id = parse_movie_id(&row.id, line)?;
            if !seen.insert(movie_id) {
                return Err(AppError::Validation(format!(
                    "line {}: duplicate movie id {}",
                    line, movie_id
                )));
            }

            records.push(MovieRecord {
                movie_id,
                title: parse_title(&row.title, line)?,
                genres: parse_list(&row.genres, "genres", line)?,
                cast: Vec::new(),
                director: None,
                keywords: parse_list(&row.keywords, "keywords", line)?,
                release_year: parse_release_year(&row.release_date),
            });
        }

        Ok(records)
    }

    fn read_merged<R: Read>(
        &self,
        reader: &mut Reader<R>,
        headers: &StringRecord,
    ) -> AppResult<Vec<MovieRecord>> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();

        for result in reader.records() {
            let raw = result.map_err(row_error)?;
            let line = line_of(&raw);
            let row: MergedMovieRow = raw.deserialize(Some(headers)).map_err(|e| {
                AppError::Validation(format!("line {}: malformed movie row: {}", line, e))
            })?;

            let movie_id = parse_movie_id(&row.movie_id, line)?;
            if !seen.insert(movie_id) {
                return Err(AppError::Validation(format!(
                    "line {}: duplicate movie id {}",
                    line, movie_id
                )));
            }

            let mut cast = parse_list(&row.cast, "cast", line)?;
            cast.truncate(self.cast_limit);

            let director = row.director.trim();

            records.push(MovieRecord {
                movie_id,
                title: parse_title(&row.title, line)?,
                genres: parse_list(&row.genres, "genres", line)?,
                cast,
                director: (!director.is_empty()).then(|| director.to_string()),
                keywords: parse_list(&row.keywords, "keywords", line)?,
                release_year: parse_release_year(&row.release_date),
            });
        }

        Ok(records)
    }

    /// Fills cast and director from the credits table
    fn apply_credits<C: Read>(&self, records: &mut [MovieRecord], credits: C) -> AppResult<()> {
        let positions: HashMap<MovieId, usize> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.movie_id, i))
            .collect();

        let mut reader = Reader::from_reader(credits);
        let headers = reader.headers()?.clone();
        let mut applied = HashSet::new();

        for result in reader.records() {
            let raw = result.map_err(row_error)?;
            let line = line_of(&raw);
            let row: TmdbCreditsRow = raw.deserialize(Some(&headers)).map_err(|e| {
                AppError::Validation(format!("line {}: malformed credits row: {}", line, e))
            })?;

            let movie_id = parse_movie_id(&row.movie_id, line)?;
            let position = *positions.get(&movie_id).ok_or_else(|| {
                AppError::Validation(format!(
                    "line {}: credits reference unknown movie id {}",
                    line, movie_id
                ))
            })?;
            if !applied.insert(movie_id) {
                return Err(AppError::Validation(format!(
                    "line {}: duplicate credits for movie id {}",
                    line, movie_id
                )));
            }

            let mut cast = parse_list(&row.cast, "cast", line)?;
            cast.truncate(self.cast_limit);

            let record = &mut records[position];
            record.cast = cast;
            record.director = parse_director(&row.crew, line)?;
        }

        tracing::debug!(credits = applied.len(), "Credits merged into movie records");
        Ok(())
    }
}

fn row_error(e: csv::Error) -> AppError {
    if e.is_io_error() {
        return AppError::Csv(e);
    }
    let line = e.position().map(|p| p.line()).unwrap_or_default();
    AppError::Validation(format!("line {}: malformed CSV row: {}", line, e))
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or_default()
}

fn parse_movie_id(raw: &str, line: u64) -> AppResult<MovieId> {
    raw.trim().parse().map_err(|_| {
        AppError::Validation(format!("line {}: invalid movie id '{}'", line, raw))
    })
}

fn parse_title(raw: &str, line: u64) -> AppResult<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::Validation(format!("line {}: empty title", line)));
    }
    Ok(title.to_string())
}

/// Parses a list cell: a JSON array of names or `{"name": ..}` objects, or `a|b|c`
fn parse_list(cell: &str, field: &str, line: u64) -> AppResult<Vec<String>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(Vec::new());
    }

    if !cell.starts_with('[') {
        return Ok(cell
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect());
    }

    let items: Vec<serde_json::Value> = serde_json::from_str(cell).map_err(|e| {
        AppError::Validation(format!("line {}: malformed {} list: {}", line, field, e))
    })?;

    items
        .into_iter()
        .map(|item| match item {
            serde_json::Value::String(name) => Ok(name),
            serde_json::Value::Object(mut obj) => match obj.remove("name") {
                Some(serde_json::Value::String(name)) => Ok(name),
                _ => Err(AppError::Validation(format!(
                    "line {}: {} entry without a name",
                    line, field
                ))),
            },
            other => Err(AppError::Validation(format!(
                "line {}: unexpected {} entry {}",
                line, field, other
            ))),
        })
        .filter(|name| name.as_ref().map_or(true, |n| !n.trim().is_empty()))
        .collect()
}

fn parse_director(crew: &str, line: u64) -> AppResult<Option<String>> {
    let crew = crew.trim();
    if crew.is_empty() {
        return Ok(None);
    }

    let members: Vec<CrewMember> = serde_json::from_str(crew).map_err(|e| {
        AppError::Validation(format!("line {}: malformed crew list: {}", line, e))
    })?;

    Ok(members
        .into_iter()
        .find(|m| m.job.as_deref() == Some(DIRECTOR_JOB))
        .and_then(|m| m.name)
        .filter(|name| !name.trim().is_empty()))
}

fn parse_release_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.year());
    }

    raw.parse::<i32>().ok().filter(|y| (1000..=9999).contains(y))
}
