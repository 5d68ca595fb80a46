//! Configuration of a post office and its host loop, and CLI arguments for the relay.
//!
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

use crate::PostOfficeError;

/// Default number of messages processed per [`Dispatcher`](crate::Dispatcher) pass.
pub const DEFAULT_PROCESS_BATCH: usize = 10;

/// Default interval between [`Dispatcher`](crate::Dispatcher) ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);

fn default_batch() -> usize {
    DEFAULT_PROCESS_BATCH
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK_INTERVAL.as_millis() as u64
}

/// The configuration of a [`PostOffice`](crate::PostOffice) and its
/// [`Dispatcher`](crate::Dispatcher).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PostOfficeConfig {
    /// The process id the post office identifies as; the id of the current process
    /// if absent.
    #[serde(default)]
    pub process_id: Option<u32>,

    /// The number of messages processed per pass.
    #[serde(default = "default_batch")]
    pub batch: usize,

    /// The interval between ticks, in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for PostOfficeConfig {
    fn default() -> Self {
        Self {
            process_id: None,
            batch: default_batch(),
            tick_ms: default_tick_ms(),
        }
    }
}

impl PostOfficeConfig {
    /// Sets the process id.
    pub fn with_process_id(mut self, process_id: u32) -> Self {
        self.process_id = Some(process_id);
        self
    }

    /// Get the process id to identify as.
    pub fn process_id(&self) -> u32 {
        self.process_id.unwrap_or_else(std::process::id)
    }

    /// Get the interval between ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Check that the configuration is usable.
    pub fn validate(self) -> Result<Self, PostOfficeError> {
        if self.batch == 0 {
            return Err(PostOfficeError::InvalidConfig(
                "batch must be at least 1".to_owned(),
            ));
        }

        if self.tick_ms == 0 {
            return Err(PostOfficeError::InvalidConfig(
                "tick_ms must be at least 1".to_owned(),
            ));
        }

        Ok(self)
    }

    /// Parse and validate a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, PostOfficeError> {
        serde_json::from_str::<Self>(json)?.validate()
    }

    /// Read, parse and validate a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PostOfficeError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[derive(Parser, Debug, Clone)]
pub struct CliArgs {
    /// A JSON configuration file; the other options override it.
    #[clap(long)]
    pub config: Option<std::path::PathBuf>,
    #[clap(long)]
    pub batch: Option<usize>,
    #[clap(long)]
    pub tick_ms: Option<u64>,
    /// Exit after this many round trips; run until interrupted if absent.
    #[clap(short, long)]
    pub round_trips: Option<usize>,
}

impl CliArgs {
    /// Build the [`PostOfficeConfig`] these arguments describe.
    pub fn post_office_config(&self) -> Result<PostOfficeConfig, PostOfficeError> {
        let mut config = match &self.config {
            Some(path) => PostOfficeConfig::from_file(path)?,
            None => PostOfficeConfig::default(),
        };

        if let Some(batch) = self.batch {
            config.batch = batch;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_ms = tick_ms;
        }

        config.validate()
    }
}
