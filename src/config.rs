//! Configuration management for helm-schema
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (helm-schema.toml)
//! - Environment variables (HELM_SCHEMA_*)
//!
//! Command-line flags are applied on top by the binary.
//!
//! ## Example config file (helm-schema.toml):
//! ```toml
//! chart_search_root = "charts"
//! dry_run = false
//! output_file = "values.schema.json"
//! value_files = ["values.yaml"]
//! skip_auto_generation = ["default"]
//! dependencies_filter = ["postgresql"]
//! log_level = "info"
//! ```

use std::path::{Path, PathBuf};

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::chart::DependencyFilter;
use crate::error::Result;
use crate::generate::{GeneratorOptions, SkipAutoGenerationConfig};
use crate::sink::Sink;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "HELM_SCHEMA";

/// Settings for one helm-schema run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Directory searched for charts
    pub chart_search_root: PathBuf,

    /// Print schemas to stdout instead of writing files
    pub dry_run: bool,

    /// Skip dependency ordering, condition patching and embedding
    pub no_dependencies: bool,

    /// Add a yaml-language-server schema reference to values files
    pub add_schema_reference: bool,

    /// Append a newline to generated schemas
    pub append_newline: bool,

    /// Schema file name written into each chart directory
    pub output_file: String,

    /// Values files to read, first existing one wins
    pub value_files: Vec<String>,

    /// Schema keywords not to generate automatically
    pub skip_auto_generation: Vec<String>,

    /// Only these subcharts are processed (empty = all)
    pub dependencies_filter: Vec<String>,

    pub log_level: String,

    /// Worker count, defaults to twice the available parallelism
    pub workers: Option<usize>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            chart_search_root: PathBuf::from("."),
            dry_run: false,
            no_dependencies: false,
            add_schema_reference: false,
            append_newline: false,
            output_file: "values.schema.json".to_string(),
            value_files: vec!["values.yaml".to_string()],
            skip_auto_generation: Vec::new(),
            dependencies_filter: Vec::new(),
            log_level: "info".to_string(),
            workers: None,
        }
    }
}

/// Twice the host's available parallelism
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        * 2
}

impl SchemaConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, with an optional explicit (required) config file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        for location in ["helm-schema", ".helm-schema"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(dirs) = directories::ProjectDirs::from("", "", "helm-schema") {
            let xdg_config = dirs.config_dir().join("helm-schema.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("value_files")
                .with_list_parse_key("skip_auto_generation")
                .with_list_parse_key("dependencies_filter"),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Resolved worker count
    pub fn workers(&self) -> usize {
        self.workers.filter(|n| *n > 0).unwrap_or_else(default_workers)
    }

    pub fn dependency_filter(&self) -> DependencyFilter {
        DependencyFilter::new(self.dependencies_filter.iter().cloned())
    }

    /// Generator options; fails on unknown skip-auto-generation keywords
    pub fn generator_options(&self) -> Result<GeneratorOptions> {
        Ok(GeneratorOptions {
            dry_run: self.dry_run,
            add_schema_reference: self.add_schema_reference,
            value_files: self.value_files.clone(),
            skip: SkipAutoGenerationConfig::new(&self.skip_auto_generation)?,
            output_file: self.output_file.clone(),
        })
    }

    pub fn sink(&self) -> Sink {
        Sink {
            dry_run: self.dry_run,
            append_newline: self.append_newline,
            output_file: self.output_file.clone(),
        }
    }
}
