//! TOML configuration for the service and the training pipeline.
//!
//! Settings live in `config.toml` under the app directory unless a path is
//! given explicitly. Missing files and missing keys fall back to defaults.

mod defaults;
mod io;
mod types;


/// Default filename used to store the configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub use io::{config_path, load, load_from_path, load_or_default, save_to_path};
pub use types::{
    AppSettings, ConfigError, InferenceSettings, LoggingSettings, PathSettings, ServerSettings,
    TrainingSettings,
};
