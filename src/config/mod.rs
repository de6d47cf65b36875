// Configuration Module
// "Settings are read once and never change"

mod storage;


pub use storage::{StorageOptions, StorageSettings};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::IronBankResult;
use crate::logging::LoggingConfig;

/// Prefix of environment overrides, e.g. `IRON_BANK__STORAGE__INFLUX_URL`
pub const ENV_PREFIX: &str = "IRON_BANK";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageOptions,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load settings from an optional TOML file, then environment overrides
    pub fn load(path: Option<&Path>) -> IronBankResult<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
