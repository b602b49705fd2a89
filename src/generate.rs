//! Per-chart schema generation
//!
//! Workers hand every discovered `Chart.yaml` to a [`SchemaGenerator`] and get
//! back exactly one [`ChartResult`]. The bundled [`ValuesSchemaGenerator`]
//! infers a schema from the chart's default values document.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::debug;

use crate::chart::ChartFile;
use crate::error::{HelmSchemaError, Result};
use crate::schema::{Schema, DRAFT_07};

/// Outcome of generating one chart's schema
#[derive(Debug)]
pub struct ChartResult {
    /// Parsed descriptor, `None` when Chart.yaml could not be parsed
    pub chart: Option<ChartFile>,
    pub chart_path: PathBuf,
    pub schema: Schema,
    pub errors: Vec<HelmSchemaError>,
}

impl ChartResult {
    pub fn new(chart_path: impl Into<PathBuf>) -> Self {
        Self {
            chart: None,
            chart_path: chart_path.into(),
            schema: Schema::default(),
            errors: Vec::new(),
        }
    }

    /// A successful result for an already generated schema
    pub fn generated(chart_path: impl Into<PathBuf>, chart: ChartFile, schema: Schema) -> Self {
        Self {
            chart: Some(chart),
            chart_path: chart_path.into(),
            schema,
            errors: Vec::new(),
        }
    }

    /// True when generation succeeded and the result may take part in composition
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.chart.is_some()
    }

    pub fn chart_name(&self) -> Option<&str> {
        self.chart.as_ref().map(|c| c.name.as_str())
    }

    /// Directory holding the chart's Chart.yaml
    pub fn chart_dir(&self) -> &Path {
        self.chart_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Chart name when known, otherwise the Chart.yaml path
    pub fn label(&self) -> String {
        match self.chart_name() {
            Some(name) => format!("{} ({})", name, self.chart_path.display()),
            None => self.chart_path.display().to_string(),
        }
    }
}

/// Produces the schema for a single chart
pub trait SchemaGenerator: Send + Sync {
    fn generate(&self, chart_path: &Path) -> ChartResult;
}

impl<F> SchemaGenerator for F
where
    F: Fn(&Path) -> ChartResult + Send + Sync,
{
    fn generate(&self, chart_path: &Path) -> ChartResult {
        self(chart_path)
    }
}

/// Schema keywords the generator would otherwise fill in on its own
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipAutoGenerationConfig {
    pub type_: bool,
    pub title: bool,
    pub description: bool,
    pub required: bool,
    pub default: bool,
    pub additional_properties: bool,
}

impl SkipAutoGenerationConfig {
    /// Build from keyword names; unknown names are rejected
    pub fn new<S: AsRef<str>>(fields: &[S]) -> Result<Self> {
        let mut config = Self::default();
        for field in fields {
            match field.as_ref().trim() {
                "type" => config.type_ = true,
                "title" => config.title = true,
                "description" => config.description = true,
                "required" => config.required = true,
                "default" => config.default = true,
                "additionalProperties" => config.additional_properties = true,
                "" => {}
                other => return Err(HelmSchemaError::InvalidSkipField(other.to_string())),
            }
        }
        Ok(config)
    }
}

/// Options shared read-only by every worker
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub dry_run: bool,
    pub add_schema_reference: bool,
    /// Candidate values files, first existing one wins
    pub value_files: Vec<String>,
    pub skip: SkipAutoGenerationConfig,
    pub output_file: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            add_schema_reference: false,
            value_files: vec!["values.yaml".to_string()],
            skip: SkipAutoGenerationConfig::default(),
            output_file: "values.schema.json".to_string(),
        }
    }
}

/// Infers a chart's schema from its default values document
#[derive(Debug, Clone, Default)]
pub struct ValuesSchemaGenerator {
    options: GeneratorOptions,
}

impl ValuesSchemaGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    fn find_values_file(&self, chart_dir: &Path) -> Result<PathBuf> {
        self.options
            .value_files
            .iter()
            .map(|name| chart_dir.join(name))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| HelmSchemaError::NoValuesFile {
                chart_dir: chart_dir.to_path_buf(),
                candidates: self.options.value_files.clone(),
            })
    }

    fn schema_for_values(&self, values_path: &Path) -> Result<Schema> {
        let content =
            fs::read_to_string(values_path).map_err(|e| HelmSchemaError::io(values_path, e))?;
        let document: Value =
            serde_yaml::from_str(&content).map_err(|source| HelmSchemaError::ValuesParse {
                path: values_path.to_path_buf(),
                source,
            })?;

        let mut root = match document {
            Value::Null => self.object_node(&serde_yaml::Mapping::new()),
            other => self.infer(&other),
        };
        root.schema = Some(DRAFT_07.to_string());
        root.type_ = vec!["object".to_string()];
        root.default = None;
        Ok(root)
    }

    fn infer(&self, value: &Value) -> Schema {
        let mut node = match value {
            Value::Mapping(mapping) => return self.object_node(mapping),
            Value::Sequence(sequence) => {
                let mut node = Schema::typed("array");
                node.items = sequence.first().map(|first| Box::new(self.infer(first)));
                return self.finish(node);
            }
            Value::Tagged(tagged) => return self.infer(&tagged.value),
            Value::Null => Schema::typed("null"),
            Value::Bool(_) => Schema::typed("boolean"),
            Value::Number(n) if n.is_f64() => Schema::typed("number"),
            Value::Number(_) => Schema::typed("integer"),
            Value::String(_) => Schema::typed("string"),
        };
        if !self.options.skip.default {
            node.default = serde_json::to_value(value).ok();
        }
        self.finish(node)
    }

    fn object_node(&self, mapping: &serde_yaml::Mapping) -> Schema {
        let mut node = Schema::object();
        for (key, value) in mapping {
            let key = match key {
                Value::String(s) => s.clone(),
                other => serde_yaml::to_string(other)
                    .map(|s| s.trim_end().to_string())
                    .unwrap_or_default(),
            };
            let mut property = self.infer(value);
            if !self.options.skip.title {
                property.title = key.clone();
            }
            node.properties.insert(key, property);
        }
        if !self.options.skip.additional_properties {
            node.additional_properties = Some(false);
        }
        self.finish(node)
    }

    fn finish(&self, mut node: Schema) -> Schema {
        if self.options.skip.type_ {
            node.type_.clear();
        }
        node
    }

    fn add_schema_reference(&self, values_path: &Path) -> Result<()> {
        let reference = format!(
            "# yaml-language-server: $schema={}",
            self.options.output_file
        );
        let content =
            fs::read_to_string(values_path).map_err(|e| HelmSchemaError::io(values_path, e))?;
        if content.contains(&reference) {
            return Ok(());
        }
        fs::write(values_path, format!("{}\n{}", reference, content)).map_err(|source| {
            HelmSchemaError::Write {
                path: values_path.to_path_buf(),
                source,
            }
        })
    }
}

impl SchemaGenerator for ValuesSchemaGenerator {
    fn generate(&self, chart_path: &Path) -> ChartResult {
        let mut result = ChartResult::new(chart_path);

        match ChartFile::load(chart_path) {
            Ok(chart) => result.chart = Some(chart),
            Err(e) => {
                result.errors.push(e);
                return result;
            }
        }

        let values_path = match self.find_values_file(result.chart_dir()) {
            Ok(path) => path,
            Err(e) => {
                result.errors.push(e);
                return result;
            }
        };
        debug!(path = %values_path.display(), "Generating schema from values file");

        match self.schema_for_values(&values_path) {
            Ok(schema) => result.schema = schema,
            Err(e) => {
                result.errors.push(e);
                return result;
            }
        }

        if self.options.add_schema_reference && !self.options.dry_run {
            if let Err(e) = self.add_schema_reference(&values_path) {
                result.errors.push(e);
            }
        }

        result
    }
}
