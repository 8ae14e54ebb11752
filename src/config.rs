use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;

use crate::error::CurationError;
use crate::json::ToJson;

pub trait Configurable: Sized {
    //// Obtain the configuration
    fn config(&self) -> &Config;

    //// Obtain the configuration mutably
    fn config_mut(&mut self) -> &mut Config;

    ///Builder pattern to associate a configuration
    fn with_config(mut self, config: Config) -> Self {
        self.set_config(config);
        self
    }

    ///Setter to associate a configuration
    fn set_config(&mut self, config: Config) -> &mut Self;
}

/// This holds the configuration. A single configuration covers both the annotator versions
/// (how records are stored) and the diff engine (how they are compared).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Debug mode
    pub(crate) debug: bool,

    /// Generate pseudo-random public identifiers for records that were inserted without one.
    /// Each will consist of 21 URL-friendly ASCII symbols after a prefix of R
    pub(crate) generate_ids: bool,

    /// Diff the requested annotation types in parallel (only effective when compiled with the `parallel` feature)
    pub(crate) parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            generate_ids: false,
            parallel: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable debug mode. In debug mode, verbose output is emitted as `tracing` debug events
    pub fn with_debug(mut self, value: bool) -> Self {
        self.debug = value;
        self
    }

    /// Is debug mode enabled or not?
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Generate public IDs for records when missing.
    pub fn with_generate_ids(mut self, value: bool) -> Self {
        self.generate_ids = value;
        self
    }

    /// Is generation of public IDs when missing enabled or not?
    pub fn generate_ids(&self) -> bool {
        self.generate_ids
    }

    /// Enable/disable diffing of multiple annotation types in parallel.
    /// Results are the same either way.
    pub fn with_parallel(mut self, value: bool) -> Self {
        self.parallel = value;
        self
    }

    /// Are annotation types diffed in parallel?
    pub fn parallel(&self) -> bool {
        self.parallel && cfg!(feature = "parallel")
    }

    /// Loads configuration from a JSON file. Fields that are absent take their default value.
    pub fn from_file(filename: &str) -> Result<Self, CurationError> {
        let f = File::open(filename)
            .map_err(|e| CurationError::IOError(e, "Reading config from file, open failed"))?;
        let reader = BufReader::new(f);
        let deserializer = &mut serde_json::Deserializer::from_reader(reader);
        let result: Result<Self, _> = serde_path_to_error::deserialize(deserializer);
        result.map_err(|e| {
            let path = e.path().to_string();
            CurationError::JsonError(e.into_inner(), path, "Reading config from file")
        })
    }

    /// Loads configuration from a JSON string. Fields that are absent take their default value.
    pub fn from_json_str(json: &str) -> Result<Self, CurationError> {
        let deserializer = &mut serde_json::Deserializer::from_str(json);
        let result: Result<Self, _> = serde_path_to_error::deserialize(deserializer);
        result.map_err(|e| {
            let path = e.path().to_string();
            CurationError::JsonError(e.into_inner(), path, "Parsing config")
        })
    }
}

impl ToJson for Config {}
