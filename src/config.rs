//! Configuration loading and validation.

use crate::error::{ConfigError, Result};
use crate::memory::{DistanceMetric, RetrieverConfig};
use anyhow::Context as _;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Instance root directory (HYBRID_RECALL_DIR or the platform data dir).
    pub instance_dir: PathBuf,
    pub retriever: RetrieverConfig,
    pub relation_map: RelationMapConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
}

/// Default bounds for relation map traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationMapConfig {
    pub depth: usize,
    pub limit: usize,
}

impl Default for RelationMapConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            limit: 30,
        }
    }
}

/// Where the fact memory lives.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub database_url: String,
}

/// Embedding model settings.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Directory for downloaded model files.
    pub cache_dir: PathBuf,
}

// -- TOML deserialization types --

#[derive(Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    retriever: TomlRetrieverConfig,
    #[serde(default)]
    relation_map: TomlRelationMapConfig,
    #[serde(default)]
    storage: TomlStorageConfig,
    #[serde(default)]
    embedding: TomlEmbeddingConfig,
}

#[derive(Deserialize, Default)]
struct TomlRetrieverConfig {
    distance: Option<String>,
    max_distance: Option<f32>,
    k: Option<usize>,
    reverse: Option<bool>,
}

#[derive(Deserialize, Default)]
struct TomlRelationMapConfig {
    depth: Option<usize>,
    limit: Option<usize>,
}

#[derive(Deserialize, Default)]
struct TomlStorageConfig {
    database_url: Option<String>,
}

#[derive(Deserialize, Default)]
struct TomlEmbeddingConfig {
    cache_dir: Option<String>,
}

/// Resolve a value that might be an "env:VAR_NAME" reference.
fn resolve_env_value(value: &str) -> Option<String> {
    if let Some(var_name) = value.strip_prefix("env:") {
        std::env::var(var_name).ok()
    } else {
        Some(value.to_string())
    }
}

fn default_database_url(instance_dir: &Path) -> String {
    format!("sqlite://{}", instance_dir.join("data").join("facts.db").display())
}

impl Config {
    /// Load configuration from the default config file, falling back to env vars.
    pub fn load() -> Result<Self> {
        let instance_dir = std::env::var("HYBRID_RECALL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .map(|d| d.join("hybrid-recall"))
                    .unwrap_or_else(|| PathBuf::from("./.hybrid-recall"))
            });

        let config_path = instance_dir.join("config.toml");
        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::load_from_env(&instance_dir)
        }
    }

    /// Load from a specific TOML config file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let instance_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        Self::load_from_str(&content, instance_dir)
    }

    /// Parse TOML content with `instance_dir` as the base for relative paths.
    pub fn load_from_str(content: &str, instance_dir: PathBuf) -> Result<Self> {
        let toml_config: TomlConfig =
            toml::from_str(content).context("failed to parse config")?;

        Self::from_toml(toml_config, instance_dir)
    }

    /// Defaults with environment overrides (no config file).
    pub fn load_from_env(instance_dir: &Path) -> Result<Self> {
        let toml_config = TomlConfig {
            storage: TomlStorageConfig {
                database_url: std::env::var("HYBRID_RECALL_DATABASE_URL").ok(),
            },
            embedding: TomlEmbeddingConfig {
                cache_dir: std::env::var("HYBRID_RECALL_MODEL_CACHE").ok(),
            },
            ..Default::default()
        };

        Self::from_toml(toml_config, instance_dir.to_path_buf())
    }

    fn from_toml(toml: TomlConfig, instance_dir: PathBuf) -> Result<Self> {
        let base_retriever = RetrieverConfig::default();
        let distance = match toml.retriever.distance.as_deref() {
            Some(tag) => tag.parse::<DistanceMetric>().map_err(|_| {
                ConfigError::Invalid(format!(
                    "retriever.distance must be cosine or euclidean, got '{tag}'"
                ))
            })?,
            None => base_retriever.distance,
        };
        let retriever = RetrieverConfig {
            distance,
            max_distance: toml
                .retriever
                .max_distance
                .unwrap_or(base_retriever.max_distance),
            k: toml.retriever.k.unwrap_or(base_retriever.k),
            reverse: toml.retriever.reverse.unwrap_or(base_retriever.reverse),
        };

        if retriever.k == 0 {
            return Err(ConfigError::Invalid("retriever.k must be positive".into()).into());
        }
        if !retriever.max_distance.is_finite() || retriever.max_distance <= 0.0 {
            return Err(ConfigError::Invalid(
                "retriever.max_distance must be a positive number".into(),
            )
            .into());
        }

        let base_relation_map = RelationMapConfig::default();
        let relation_map = RelationMapConfig {
            depth: toml.relation_map.depth.unwrap_or(base_relation_map.depth),
            limit: toml.relation_map.limit.unwrap_or(base_relation_map.limit),
        };

        if relation_map.limit == 0 {
            return Err(ConfigError::Invalid("relation_map.limit must be positive".into()).into());
        }

        let storage = StorageConfig {
            database_url: toml
                .storage
                .database_url
                .as_deref()
                .and_then(resolve_env_value)
                .unwrap_or_else(|| default_database_url(&instance_dir)),
        };

        let embedding = EmbeddingConfig {
            cache_dir: toml
                .embedding
                .cache_dir
                .map(PathBuf::from)
                .map(|dir| {
                    if dir.is_relative() {
                        instance_dir.join(dir)
                    } else {
                        dir
                    }
                })
                .unwrap_or_else(|| instance_dir.join("models")),
        };

        Ok(Config {
            instance_dir,
            retriever,
            relation_map,
            storage,
            embedding,
        })
    }
}
