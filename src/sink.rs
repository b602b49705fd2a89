//! Schema output
//!
//! Writes each finished schema either to stdout (dry run) or next to its
//! Chart.yaml.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tracing::info;

use crate::error::{HelmSchemaError, Result};
use crate::generate::ChartResult;

/// Where finished schemas go
#[derive(Debug, Clone)]
pub struct Sink {
    pub dry_run: bool,
    pub append_newline: bool,
    /// File name written into each chart directory
    pub output_file: String,
}

impl Sink {
    /// Emit one result's schema.
    ///
    /// Dry runs write to `stdout` and return `None`; otherwise the schema file
    /// is (over)written and its path returned.
    pub fn emit<W: Write>(&self, result: &ChartResult, stdout: &mut W) -> Result<Option<PathBuf>> {
        let mut json = result.schema.to_json()?;
        if self.append_newline {
            json.push(b'\n');
        }

        if self.dry_run {
            info!("Printing jsonschema for {} chart", result.label());
            return self
                .print(&json, stdout)
                .map(|_| None)
                .map_err(|source| HelmSchemaError::Write {
                    path: PathBuf::from("<stdout>"),
                    source,
                });
        }

        let path = result.chart_dir().join(&self.output_file);
        fs::write(&path, &json).map_err(|source| HelmSchemaError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "Wrote jsonschema for {} chart", result.label());
        Ok(Some(path))
    }

    // Stdout always ends with exactly one newline.
    fn print<W: Write>(&self, json: &[u8], stdout: &mut W) -> std::io::Result<()> {
        stdout.write_all(json)?;
        if !self.append_newline {
            stdout.write_all(b"\n")?;
        }
        stdout.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartFile;
    use crate::schema::Schema;
    use tempfile::TempDir;

    fn result(dir: &std::path::Path) -> ChartResult {
        let mut schema = Schema::object();
        schema.properties.insert("replicas".into(), Schema::typed("integer"));
        ChartResult::generated(
            dir.join("Chart.yaml"),
            ChartFile {
                name: "app".into(),
                ..ChartFile::default()
            },
            schema,
        )
    }

    fn sink(dry_run: bool, append_newline: bool) -> Sink {
        Sink {
            dry_run,
            append_newline,
            output_file: "values.schema.json".into(),
        }
    }

    #[test]
    fn test_dry_run_prints_single_trailing_newline() {
        let dir = TempDir::new().unwrap();
        for append in [false, true] {
            let mut out = Vec::new();
            let written = sink(true, append).emit(&result(dir.path()), &mut out).unwrap();

            assert!(written.is_none());
            let text = String::from_utf8(out).unwrap();
            assert!(text.ends_with("}\n"));
            assert!(!text.ends_with("\n\n"));
        }
        assert!(!dir.path().join("values.schema.json").exists());
    }

    #[test]
    fn test_writes_next_to_chart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("values.schema.json");
        fs::write(&path, "stale").unwrap();

        let written = sink(false, false)
            .emit(&result(dir.path()), &mut std::io::sink())
            .unwrap();

        assert_eq!(written, Some(path.clone()));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["properties"]["replicas"]["type"], serde_json::json!(["integer"]));
    }

    #[test]
    fn test_append_newline_to_file() {
        let dir = TempDir::new().unwrap();
        sink(false, true)
            .emit(&result(dir.path()), &mut std::io::sink())
            .unwrap();
        let content = fs::read_to_string(dir.path().join("values.schema.json")).unwrap();
        assert!(content.ends_with("}\n"));
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        let err = sink(false, false)
            .emit(&result(&missing), &mut std::io::sink())
            .unwrap_err();
        assert!(matches!(err, HelmSchemaError::Write { .. }));
    }
}
