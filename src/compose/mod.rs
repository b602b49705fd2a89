//! Schema composition
//!
//! Embeds every dependency's generated schema into its parent, under the
//! dependency's alias or name. Results must already be in dependency order
//! (see [`crate::graph::topo_sort`]); a dependency that was not processed
//! before its parent is reported and skipped.
//! When several charts share a name, the one processed last is embedded.

pub mod conditions;

pub use conditions::{
    apply_condition_patches, collect_condition_patches, patch_path, ConditionPatches,
    CONDITION_DESCRIPTION,
};

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::chart::{Dependency, DependencyFilter};
use crate::generate::ChartResult;
use crate::schema::Schema;

/// Embed dependency schemas into their parents, in slice order.
///
/// Only results processed earlier in the slice can be embedded. Embedded
/// subtrees are deep copies with every `required` list cleared, because a
/// subchart's values are optional from the parent's point of view.
pub fn compose_dependencies(results: &mut [ChartResult], filter: &DependencyFilter) {
    // chart name -> index of its already composed result
    let mut processed: HashMap<String, usize> = HashMap::with_capacity(results.len());

    for i in 0..results.len() {
        let (done, rest) = results.split_at_mut(i);
        let current = &mut rest[0];
        if !current.is_ok() {
            continue;
        }
        let ChartResult {
            chart: Some(chart),
            chart_path,
            schema,
            ..
        } = current
        else {
            continue;
        };

        debug!(chart = %chart.name, path = %chart_path.display(), "Composing schema");
        let mut embedded: HashSet<&str> = HashSet::new();

        for dep in chart.dependencies.iter().filter(|d| filter.allows(&d.name)) {
            if dep.name.is_empty() {
                warn!(path = %chart_path.display(), "Dependency without name found");
                continue;
            }

            let Some(dependency) = processed.get(&dep.name).map(|&j| &done[j]) else {
                warn!(
                    "Dependency ({}->{}) specified but no schema found. If you want to create \
                     jsonschemas for external dependencies, you need to run helm dependency \
                     build & untar the charts.",
                    chart.name, dep.name
                );
                continue;
            };
            debug!(
                chart = %chart.name,
                dependency = %dep.name,
                path = %dependency.chart_path.display(),
                "Found chart of dependency"
            );

            let key = dep.key();
            if !embedded.insert(key) {
                warn!(chart = %chart.name, key, "Dependency key collision, last dependency wins");
            }
            schema
                .properties
                .insert(key.to_string(), dependency_schema(dep, dependency));
        }

        processed.insert(chart.name.clone(), i);
    }
}

/// Object node wrapping a dependency's properties, detached from the original
fn dependency_schema(dep: &Dependency, dependency: &ChartResult) -> Schema {
    let description = dependency
        .chart
        .as_ref()
        .map(|c| c.description.clone())
        .unwrap_or_default();

    let mut node = Schema::object()
        .with_title(dep.name.as_str())
        .with_description(description);
    node.properties = dependency.schema.properties.clone();
    node.disable_required_properties();
    node
}
