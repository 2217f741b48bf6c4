//! # Configuration
//!
//! Process configuration, read from a TOML file. Every field has a default so
//! an empty file (or no file) yields a usable local setup.
//!
//! ```toml
//! base_origin = "https://floorb.example"
//! data_dir = "/var/lib/floorb/actors"
//!
//! [delivery]
//! max_in_flight = 8
//! queue_depth = 256
//! timeout_secs = 30
//!
//! [logging]
//! level = "debug"
//! stdout = true
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::iri::parse_iri;
use crate::profile::ProfileConfig;
use crate::utils;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorbConfig {
    /// Origin every profile endpoint is derived from
    pub base_origin: String,
    /// Directory holding one JSON document per actor
    pub data_dir: PathBuf,
    pub delivery: DeliveryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Deliveries allowed to run at the same time
    pub max_in_flight: usize,
    /// Deliveries allowed to wait for a slot; submissions beyond this fail
    pub queue_depth: usize,
    /// Per-delivery timeout; `None` leaves it to the request context
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
    pub stdout: bool,
}

impl Default for FloorbConfig {
    fn default() -> Self {
        Self {
            base_origin: "http://localhost:8080".to_string(),
            data_dir: utils::default_actor_dir(),
            delivery: DeliveryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            queue_depth: 256,
            timeout_secs: Some(30),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            stdout: false,
        }
    }
}

impl DeliveryConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl FloorbConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from {:?}", path);
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml_str(&contents).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: FloorbConfig = toml::from_str(contents).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        parse_iri(&self.base_origin).context("base_origin must be an absolute URI")?;
        if self.delivery.max_in_flight == 0 {
            return Err(anyhow!("delivery.max_in_flight must be at least 1"));
        }
        if self.delivery.queue_depth == 0 {
            return Err(anyhow!("delivery.queue_depth must be at least 1"));
        }
        self.logging
            .level
            .parse::<tracing::Level>()
            .map_err(|_| anyhow!("unknown log level '{}'", self.logging.level))?;
        Ok(())
    }

    pub fn profile_config(&self) -> ProfileConfig {
        ProfileConfig::new(&self.base_origin)
    }

    pub fn log_file(&self) -> PathBuf {
        self.logging
            .file
            .clone()
            .unwrap_or_else(utils::default_log_file)
    }
}
