use std::path::PathBuf;

/// Where the map data document is published.
pub const DEFAULT_DATA_URL: &str = "https://skimap.github.io/map_data.json";
/// Disk cache for base map tiles.
pub const DEFAULT_CACHE_DIR: &str = ".cache";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Location of the dataset document.
pub enum DataSource {
    Http(String),
    File(PathBuf),
}

impl DataSource {
    /// Classifies a configured value: `http://` and `https://` values are fetched
    /// over the network, anything else is read from disk.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.starts_with("http://") || value.starts_with("https://") {
            DataSource::Http(value.to_string())
        } else {
            DataSource::File(PathBuf::from(value.strip_prefix("file://").unwrap_or(value)))
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Http(url) => write!(f, "{}", url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_source: DataSource,
    pub tile_cache: Option<PathBuf>,
}

impl Config {
    /// Builds the configuration from `SKIMAP_DATA`, `SKIMAP_CACHE_DIR` and
    /// `NO_HTTP_CACHE`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_source = DataSource::parse(
            &lookup("SKIMAP_DATA").unwrap_or_else(|| DEFAULT_DATA_URL.to_string()),
        );

        let tile_cache = if cfg!(target_os = "android") || lookup("NO_HTTP_CACHE").is_some() {
            None
        } else {
            Some(
                lookup("SKIMAP_CACHE_DIR")
                    .unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string())
                    .into(),
            )
        };

        Self {
            data_source,
            tile_cache,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
