//! helm-schema CLI
//!
//! Generates values.schema.json files for every chart below a directory.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use helm_schema::SchemaConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "helm-schema")]
#[command(about = "Generate JSON schemas for Helm chart values")]
struct Cli {
    /// Directory to search for charts
    #[arg(short = 'c', long)]
    chart_search_root: Option<PathBuf>,

    /// Print schemas to stdout instead of writing files
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Don't embed dependency schemas or patch condition flags
    #[arg(short = 'n', long)]
    no_dependencies: bool,

    /// Add a yaml-language-server schema reference to values files
    #[arg(short = 'r', long)]
    add_schema_reference: bool,

    /// Append a newline to generated schemas
    #[arg(short = 'a', long)]
    append_newline: bool,

    /// Schema file name
    #[arg(short = 'o', long)]
    output_file: Option<String>,

    /// Values files to read, first existing one wins
    #[arg(short = 'f', long, value_delimiter = ',')]
    value_files: Vec<String>,

    /// Schema keywords not to generate (type, title, description, required, default, additionalProperties)
    #[arg(short = 's', long, value_delimiter = ',')]
    skip_auto_generation: Vec<String>,

    /// Only process these subcharts
    #[arg(short = 'i', long, value_delimiter = ',')]
    dependencies_filter: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Number of generation workers
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Config file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Flags override file and environment settings
    fn apply(self, config: &mut SchemaConfig) {
        if let Some(root) = self.chart_search_root {
            config.chart_search_root = root;
        }
        config.dry_run |= self.dry_run;
        config.no_dependencies |= self.no_dependencies;
        config.add_schema_reference |= self.add_schema_reference;
        config.append_newline |= self.append_newline;
        if let Some(output_file) = self.output_file {
            config.output_file = output_file;
        }
        if !self.value_files.is_empty() {
            config.value_files = self.value_files;
        }
        if !self.skip_auto_generation.is_empty() {
            config.skip_auto_generation = self.skip_auto_generation;
        }
        if !self.dependencies_filter.is_empty() {
            config.dependencies_filter = self.dependencies_filter;
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }
        if self.workers.is_some() {
            config.workers = self.workers;
        }
    }
}

fn load_config(mut cli: Cli) -> anyhow::Result<SchemaConfig> {
    let path = cli.config.take();
    let mut config = SchemaConfig::load_from(path.as_deref()).with_context(|| match &path {
        Some(path) => format!("failed to load config from {}", path.display()),
        None => "failed to load config".to_string(),
    })?;
    cli.apply(&mut config);
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match load_config(Cli::parse()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match helm_schema::run(&config, &mut std::io::stdout()).await {
        Ok(report) if report.is_success() => {
            info!(
                charts = report.results_processed,
                written = report.charts_written,
                "Done"
            );
            ExitCode::SUCCESS
        }
        Ok(report) => {
            error!(failed = report.failed_charts, "Some errors were found");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Execution error: {}", e);
            ExitCode::FAILURE
        }
    }
}
