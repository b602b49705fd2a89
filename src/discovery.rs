//! Chart discovery
//!
//! Walks the search root for `Chart.yaml` files and streams their paths to the
//! worker pool. Failures on individual entries are reported on the error
//! channel and never stop the walk.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc::Sender;
use tracing::debug;
use walkdir::WalkDir;

use crate::chart::{ChartFile, DependencyFilter, CHART_FILE_NAME};
use crate::error::HelmSchemaError;

/// Walk `root` and send every matching chart definition to `paths`.
///
/// A `Chart.yaml` sitting directly in `root` is always sent; the filter only
/// applies to subcharts. Blocks on each send, so it must run on a blocking
/// thread. Returning drops `paths`, which closes the channel for the workers.
pub fn search_charts(
    root: &Path,
    filter: &DependencyFilter,
    paths: Sender<PathBuf>,
    errors: Sender<HelmSchemaError>,
) {
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                if errors.blocking_send(e.into()).is_err() {
                    return;
                }
                continue;
            }
        };

        if entry.file_type().is_dir() || entry.file_name() != CHART_FILE_NAME {
            continue;
        }

        let path = entry.into_path();
        match accept(root, &path, filter) {
            Ok(false) => continue,
            Ok(true) => {
                debug!(path = %path.display(), "Discovered chart");
                if paths.blocking_send(path).is_err() {
                    return;
                }
            }
            Err(e) => {
                if errors.blocking_send(e).is_err() {
                    return;
                }
            }
        }
    }
}

fn accept(root: &Path, path: &Path, filter: &DependencyFilter) -> Result<bool, HelmSchemaError> {
    if path.parent() == Some(root) || filter.is_empty() {
        return Ok(true);
    }
    let chart = ChartFile::load(path)?;
    Ok(filter.allows(&chart.name))
}
