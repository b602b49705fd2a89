//! Chart.yaml descriptors

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HelmSchemaError, Result};

/// Name of the chart definition file
pub const CHART_FILE_NAME: &str = "Chart.yaml";

/// Identity and dependency metadata parsed from a Chart.yaml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartFile {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

/// A dependency entry of a Chart.yaml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub alias: String,
    /// Dot-separated values path(s) toggling the dependency
    #[serde(default)]
    pub condition: String,
}

impl ChartFile {
    /// Parse a Chart.yaml document
    pub fn from_slice(data: &[u8], path: &Path) -> Result<Self> {
        serde_yaml::from_slice(data).map_err(|source| HelmSchemaError::ChartParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a Chart.yaml from disk
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|e| HelmSchemaError::io(path, e))?;
        Self::from_slice(&data, path)
    }
}

impl Dependency {
    /// Key under which the dependency's values live in the parent
    pub fn key(&self) -> &str {
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }

    /// Condition paths, split on `,` as Helm does
    pub fn conditions(&self) -> impl Iterator<Item = &str> {
        self.condition
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Optional set of chart names restricting which subcharts take part in a run.
///
/// An empty filter allows every chart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyFilter {
    names: BTreeSet<String>,
}

impl DependencyFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(Into::into)
                .filter(|n: &String| !n.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether a chart of this name passes the filter
    pub fn allows(&self, name: &str) -> bool {
        self.names.is_empty() || self.names.contains(name)
    }
}
