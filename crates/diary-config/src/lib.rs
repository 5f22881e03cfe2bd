//! Configuration for the diary CLI.
//!
//! Provides TOML-based configuration with:
//! - `[backend]` connection settings (URL, API key, timeout)
//! - `[roster]` cache freshness windows and comment sample size
//! - `[user]` default identity and `[logging]` settings
//! - Config file layering (user config dir + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_lenient,
    load_config_with_options, project_config_path, save_config, user_config_dir,
    user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
