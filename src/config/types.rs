use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::defaults::*;
use crate::features::{FeatureColumn, FeatureSchema, UnseenCategoryPolicy};
use crate::inference::EncodingStrategy;
use crate::ml::forest::ForestOptions;

/// Errors that may occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to create the config directory.
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        /// Directory path that failed to create.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to write a config file.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Path that failed to write.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
    /// Failed to serialize config to TOML.
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML serialization error.
        source: toml::ser::Error,
    },
    /// No usable config directory found.
    #[error("No suitable config directory found")]
    NoConfigDir,
}

/// Top-level settings persisted in `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub inference: InferenceSettings,
    #[serde(default)]
    pub training: TrainingSettings,
}

impl AppSettings {
    /// Clamp values that would make the service or trainer misbehave.
    pub fn normalized(mut self) -> Self {
        self.training.n_trees = self.training.n_trees.clamp(1, MAX_TREES);
        self.training.min_samples_split = self.training.min_samples_split.max(2);
        self.training.min_samples_leaf = self.training.min_samples_leaf.max(1);
        if !self.training.test_fraction.is_finite() {
            self.training.test_fraction = default_test_fraction();
        }
        self.training.test_fraction = self.training.test_fraction.clamp(0.0, MAX_TEST_FRACTION);
        if self.training.max_depth == Some(0) {
            self.training.max_depth = None;
        }
        if self.training.max_features == Some(0) {
            self.training.max_features = None;
        }
        self.server.max_payload_bytes = self.server.max_payload_bytes.max(1024);
        self.logging.max_files = self.logging.max_files.max(1);
        self
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Worker thread count (0 = one per core).
    #[serde(default)]
    pub workers: usize,
    /// Upper bound for request bodies.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

/// Locations of the model artifact and the historical dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathSettings {
    #[serde(default = "default_model_path")]
    pub model: PathBuf,
    #[serde(default = "default_dataset_path")]
    pub dataset: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            model: default_model_path(),
            dataset: default_dataset_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also write a per-launch log file under the app directory.
    #[serde(default = "default_true")]
    pub file: bool,
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_true(),
            max_files: default_max_log_files(),
        }
    }
}

/// How the running service turns category text into model codes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InferenceSettings {
    #[serde(default)]
    pub encoding: EncodingStrategy,
    #[serde(default)]
    pub unseen_category: UnseenCategoryPolicy,
}

/// Training pipeline settings: feature schema, split and forest hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingSettings {
    #[serde(default = "default_identifier_column")]
    pub identifier_column: String,
    #[serde(default = "default_label_column")]
    pub label_column: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Share of rows held out for evaluation.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    /// Unset means trees grow until leaves are pure.
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    /// Candidate features per split; unset means `sqrt(n_features)`.
    #[serde(default)]
    pub max_features: Option<usize>,
    #[serde(default = "default_features")]
    pub features: Vec<FeatureColumn>,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            identifier_column: default_identifier_column(),
            label_column: default_label_column(),
            seed: default_seed(),
            test_fraction: default_test_fraction(),
            n_trees: default_n_trees(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            max_features: None,
            features: default_features(),
        }
    }
}

impl TrainingSettings {
    /// Build the feature schema described by these settings.
    pub fn schema(&self) -> FeatureSchema {
        FeatureSchema::new(
            self.features.clone(),
            self.identifier_column.clone(),
            self.label_column.clone(),
        )
    }

    /// Forest hyperparameters derived from these settings.
    pub fn forest_options(&self) -> ForestOptions {
        ForestOptions {
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
            seed: self.seed,
        }
    }
}
