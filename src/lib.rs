//! helm-schema
//!
//! Generates a JSON schema for the values of every Helm chart found below a
//! directory, and composes them along the charts' dependencies.
//!
//! ## Features
//!
//! - **Concurrent discovery**: Chart.yaml files are streamed to a worker pool
//! - **Dependency order**: charts are processed after the charts they depend on
//! - **Subchart embedding**: a dependency's schema is nested under its alias or name
//! - **Condition flags**: `condition:` paths become boolean properties in the subchart
//!
//! ## Layout
//!
//! ```text
//! chart/
//! ├── Chart.yaml
//! ├── values.yaml
//! ├── values.schema.json      <- written here
//! └── charts/
//!     └── db/
//!         ├── Chart.yaml
//!         ├── values.yaml
//!         └── values.schema.json
//! ```

pub mod chart;
pub mod compose;
pub mod config;
pub mod discovery;
pub mod error;
pub mod generate;
pub mod graph;
pub mod pipeline;
pub mod schema;
pub mod sink;

pub use chart::{ChartFile, Dependency, DependencyFilter};
pub use config::SchemaConfig;
pub use error::{HelmSchemaError, Result};
pub use generate::{
    ChartResult, GeneratorOptions, SchemaGenerator, SkipAutoGenerationConfig,
    ValuesSchemaGenerator,
};
pub use graph::{topo_sort, SortOutcome};
pub use pipeline::{collect_results, run, run_with_generator, RunReport};
pub use schema::Schema;
pub use sink::Sink;
