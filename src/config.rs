use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Directory holding `movies.json` and `model.bin`
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// TMDB API key; movie details are not fetched when unset
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Redis connection URL for the movie details cache
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Number of recommendations returned when the request does not specify `k`
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,

    /// Upper bound accepted for `k`
    #[serde(default = "default_max_k")]
    pub max_k: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org".to_string()
}

fn default_recommendation_count() -> usize {
    5
}

fn default_max_k() -> usize {
    50
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.recommendation_count == 0 {
            anyhow::bail!("RECOMMENDATION_COUNT must be at least 1");
        }
        if config.max_k < config.recommendation_count {
            anyhow::bail!(
                "MAX_K ({}) must not be below RECOMMENDATION_COUNT ({})",
                config.max_k,
                config.recommendation_count
            );
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(Vec::new()).unwrap();
        assert_eq!(config.artifacts_dir, PathBuf::from("artifacts"));
        assert_eq!(config.tmdb_api_key, None);
        assert_eq!(config.tmdb_api_url, "https://api.themoviedb.org");
        assert_eq!(config.redis_url, None);
        assert_eq!(config.recommendation_count, 5);
        assert_eq!(config.max_k, 50);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            ("ARTIFACTS_DIR", "/srv/model"),
            ("TMDB_API_KEY", "secret"),
            ("RECOMMENDATION_COUNT", "10"),
            ("PORT", "8080"),
        ]))
        .unwrap();
        assert_eq!(config.artifacts_dir, PathBuf::from("/srv/model"));
        assert_eq!(config.tmdb_api_key.as_deref(), Some("secret"));
        assert_eq!(config.recommendation_count, 10);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_rejects_zero_recommendation_count() {
        let result = Config::from_vars(vars(&[("RECOMMENDATION_COUNT", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_max_k_below_default_count() {
        let result = Config::from_vars(vars(&[("RECOMMENDATION_COUNT", "8"), ("MAX_K", "4")]));
        assert!(result.is_err());
    }
}
