//! Splitter configuration using Figment
//!
//! Configuration is loaded from:
//! 1. `config/splitter.toml` (base configuration)
//! 2. Environment variables prefixed with `DAQ_SPLIT_`, using `__` between nested keys
//!    (e.g. `DAQ_SPLIT_APPLICATION__LOG_LEVEL=debug`)
//!
//! # Example
//! ```no_run
//! use daq_splitter::config::SplitterConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SplitterConfig::load()?;
//! let splitter = config.build_splitter()?;
//! println!("{} event slots", splitter.event_count());
//! # Ok(())
//! # }
//! ```
//!
//! # File format
//! ```toml
//! [application]
//! name = "mdpp readout"
//! log_level = "info"
//!
//! [[events]]
//! name = "main"
//! modules = [
//!     { name = "mdpp16", header_filter = "0100 XXXX XXXX XXXX XXXX SSSS SSSS SSSS" },
//!     { name = "scaler" },
//! ]
//! ```

use crate::error::{DaqError, DaqResult};
use crate::filter::BitFilter;
use crate::splitter::MultiEventSplitter;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/splitter.toml";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "DAQ_SPLIT_";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level splitter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Event slots in readout order
    #[serde(default)]
    pub events: Vec<EventDefinition>,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// One event slot and its modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    /// Event name, unique within the configuration
    pub name: String,
    /// Modules in readout order
    #[serde(default)]
    pub modules: Vec<ModuleDefinition>,
}

/// A module and its multi-event header filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    /// Module name, unique within its event
    pub name: String,
    /// Header filter with the sub-event size tagged `S`; empty disables splitting
    #[serde(default)]
    pub header_filter: String,
}

fn default_name() -> String {
    "daq-splitter".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

impl SplitterConfig {
    /// Load configuration from `config/splitter.toml` and environment variables
    pub fn load() -> DaqResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path, with environment overrides
    pub fn load_from<P: AsRef<Path>>(path: P) -> DaqResult<Self> {
        Self::extract(Figment::new().merge(Toml::file(path.as_ref())))
    }

    /// Parse configuration from TOML text, with environment overrides
    pub fn from_toml_str(text: &str) -> DaqResult<Self> {
        Self::extract(Figment::new().merge(Toml::string(text)))
    }

    fn extract(figment: Figment) -> DaqResult<Self> {
        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> DaqResult<()> {
        if !VALID_LOG_LEVELS.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(DaqError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        let mut event_names = HashSet::new();
        for event in &self.events {
            if !event_names.insert(event.name.as_str()) {
                return Err(DaqError::Configuration(format!(
                    "Duplicate event name: {}",
                    event.name
                )));
            }

            let mut module_names = HashSet::new();
            for module in &event.modules {
                if !module_names.insert(module.name.as_str()) {
                    return Err(DaqError::Configuration(format!(
                        "Duplicate module name '{}' in event '{}'",
                        module.name, event.name
                    )));
                }
                BitFilter::new(&module.header_filter)?;
            }
        }

        Ok(())
    }

    /// Header filter strings, one inner list per event slot
    pub fn filter_strings(&self) -> Vec<Vec<String>> {
        self.events
            .iter()
            .map(|event| {
                event
                    .modules
                    .iter()
                    .map(|module| module.header_filter.clone())
                    .collect()
            })
            .collect()
    }

    /// Validate and compile a splitter for this configuration
    pub fn build_splitter(&self) -> DaqResult<MultiEventSplitter> {
        self.validate()?;
        Ok(MultiEventSplitter::new(&self.filter_strings())?)
    }
}
