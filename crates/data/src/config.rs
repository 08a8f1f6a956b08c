use std::path::PathBuf;
use std::time::Duration;

use crate::fixtures::DEFAULT_RESULTS_PER_QUERY;

/// Data layer configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Base URL of the remote camera/demographics service.
    pub api_url: String,
    /// Per-request timeout for remote calls. A timeout counts as the
    /// remote being unavailable.
    pub request_timeout: Duration,
    /// Directory holding the local override store file.
    pub store_dir: PathBuf,
    /// Storage key of the local override list (`<store_dir>/<key>.json`).
    pub store_key: String,
    /// Synthetic detections generated per fallback query, before filtering.
    pub synthetic_results: usize,
    /// Seed for the synthetic demographics generator. `None` draws fresh
    /// values on every call.
    pub synthetic_seed: Option<u64>,
    /// Slice the merged camera list to the requested page.
    pub paginate_merged: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(10),
            store_dir: PathBuf::from(".camwatch"),
            store_key: "camera-overrides".to_string(),
            synthetic_results: DEFAULT_RESULTS_PER_QUERY,
            synthetic_seed: None,
            paginate_merged: false,
        }
    }
}

impl DataConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// Unparseable values fall back to the default and log a warning.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `CAMWATCH_API_URL`              | `http://localhost:8000` |
    /// | `CAMWATCH_REQUEST_TIMEOUT_SECS` | `10`                    |
    /// | `CAMWATCH_STORE_DIR`            | `.camwatch`             |
    /// | `CAMWATCH_STORE_KEY`            | `camera-overrides`      |
    /// | `CAMWATCH_SYNTHETIC_RESULTS`    | `100`                   |
    /// | `CAMWATCH_SYNTHETIC_SEED`       | unset                   |
    /// | `CAMWATCH_PAGINATE_MERGED`      | `false`                 |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("CAMWATCH_API_URL").unwrap_or(defaults.api_url);

        let request_timeout = parsed(&lookup, "CAMWATCH_REQUEST_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let store_dir = lookup("CAMWATCH_STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.store_dir);

        let store_key = lookup("CAMWATCH_STORE_KEY").unwrap_or(defaults.store_key);

        let synthetic_results =
            parsed(&lookup, "CAMWATCH_SYNTHETIC_RESULTS").unwrap_or(defaults.synthetic_results);

        let synthetic_seed = parsed(&lookup, "CAMWATCH_SYNTHETIC_SEED");

        let paginate_merged =
            parsed(&lookup, "CAMWATCH_PAGINATE_MERGED").unwrap_or(defaults.paginate_merged);

        Self {
            api_url,
            request_timeout,
            store_dir,
            store_key,
            synthetic_results,
            synthetic_seed,
            paginate_merged,
        }
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable config value");
            None
        }
    }
}
