//! Configuration for vellum.
//!
//! Sources are layered with figment, later ones overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. a TOML file (`vellum.toml` unless a path is given)
//! 3. environment variables prefixed with `VELLUM_`, `__` separating
//!    nested keys (`VELLUM_HNSW__MAX_CONNECTIONS=32`)
//!
//! # Example
//!
//! ```toml
//! [hnsw]
//! distance = "cosine"
//! max_connections = 16
//! ef_construction = 100
//! seed = 20240101
//!
//! [search]
//! default_k = 10
//!
//! [storage]
//! backend = "log"
//! path = "./vectors"
//! ```

use crate::distance::DistanceMetric;
use crate::index::hnsw::params::{
    HnswParams, DEFAULT_EF_CONSTRUCTION, DEFAULT_EF_SEARCH, DEFAULT_MAX_CONNECTIONS,
};
use crate::index::hnsw::{HnswIndex, QueryOptions};
use crate::storage::{LogVectorStore, MemoryVectorStore, VectorStore};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "vellum.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "VELLUM_";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A source could not be read or parsed.
    #[error("Failed to load configuration: {0}")]
    Load(String),

    /// A value is out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(err.to_string())
    }
}

/// Index construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HnswConfig {
    /// Distance function id (`cosine` or `cosine-normalized`).
    pub distance: String,
    /// Max neighbors per node on layers >= 1 (M).
    pub max_connections: usize,
    /// Max neighbors on layer 0; `2 * M` when unset.
    pub max_connections_0: Option<usize>,
    /// Construction beam width.
    pub ef_construction: usize,
    /// Default query beam width.
    pub ef_search: usize,
    /// Level generator seed; random when unset.
    pub seed: Option<u64>,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            distance: DistanceMetric::default().id().to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_connections_0: None,
            ef_construction: DEFAULT_EF_CONSTRUCTION,
            ef_search: DEFAULT_EF_SEARCH,
            seed: None,
        }
    }
}

impl HnswConfig {
    /// Index parameters described by this section.
    #[must_use]
    pub fn params(&self) -> HnswParams {
        let params = HnswParams::custom(
            self.max_connections,
            self.max_connections_0
                .unwrap_or_else(|| self.max_connections.saturating_mul(2)),
            self.ef_construction,
            self.ef_search,
        );
        match self.seed {
            Some(seed) => params.with_seed(seed),
            None => params,
        }
    }

    /// Parsed distance metric.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for an unknown id.
    pub fn metric(&self) -> Result<DistanceMetric, ConfigError> {
        self.distance.parse().map_err(ConfigError::Invalid)
    }
}

/// Query defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results per query when the caller does not say.
    pub default_k: usize,
    /// Query beam width overriding the index default.
    pub ef_search: Option<usize>,
    /// Results farther than this are dropped.
    pub max_distance: Option<f32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: 10,
            ef_search: None,
            max_distance: None,
        }
    }
}

impl SearchConfig {
    /// Query options for `k` results, or `default_k` when `k` is `None`.
    #[must_use]
    pub fn query_options(&self, k: Option<usize>) -> QueryOptions {
        QueryOptions {
            k: k.unwrap_or(self.default_k),
            ef_search: self.ef_search,
            quality: None,
            max_distance: self.max_distance,
        }
    }
}

/// Where vectors are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Resident hash map.
    #[default]
    Memory,
    /// Durable append-only log in `storage.path`.
    Log,
}

/// Vector store settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store implementation.
    pub backend: StorageBackend,
    /// Directory of the log store.
    pub path: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VellumConfig {
    /// Index construction.
    pub hnsw: HnswConfig,
    /// Query defaults.
    pub search: SearchConfig,
    /// Vector store.
    pub storage: StorageConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

impl VellumConfig {
    /// Loads defaults, `vellum.toml` in the working directory if present,
    /// then the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::extract(Self::figment(Path::new(DEFAULT_CONFIG_FILE)))
    }

    /// Like [`Self::load`] with an explicit file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or malformed, or
    /// validation fails.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Load(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Self::extract(Self::figment(path))
    }

    /// Parses a TOML document over the defaults, without the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the document is malformed or validation fails.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::extract(Figment::from(Serialized::defaults(Self::default())).merge(Toml::string(toml)))
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hnsw.metric()?;
        self.hnsw
            .params()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.search.default_k == 0 {
            return Err(ConfigError::Invalid("search.default_k must be > 0".to_string()));
        }
        if self.storage.backend == StorageBackend::Log && self.storage.path.is_none() {
            return Err(ConfigError::Invalid(
                "storage.path is required for the log backend".to_string(),
            ));
        }
        Ok(())
    }

    /// Opens the configured vector store.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid section and `Error::BackingStore`
    /// if the log store cannot be opened.
    pub fn open_store(&self) -> crate::Result<Box<dyn VectorStore>> {
        match (self.storage.backend, &self.storage.path) {
            (StorageBackend::Memory, _) => Ok(Box::new(MemoryVectorStore::new())),
            (StorageBackend::Log, Some(path)) => Ok(Box::new(
                LogVectorStore::open(path).map_err(crate::Error::BackingStore)?,
            )),
            (StorageBackend::Log, None) => Err(crate::Error::Config(
                "storage.path is required for the log backend".to_string(),
            )),
        }
    }

    /// Creates an empty index over the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the store cannot
    /// be opened.
    pub fn open_index(&self) -> crate::Result<HnswIndex<Box<dyn VectorStore>>> {
        self.validate()?;
        HnswIndex::with_store(self.hnsw.metric()?, self.hnsw.params(), self.open_store()?)
    }
}
