//! Chart Dependency Graph
//!
//! Orders generation results so that every chart comes after the charts it
//! depends on. Composition looks dependency schemas up by name, so a
//! dependency has to be finalized before any of its dependents.
//!
//! Cycles are not fatal: the caller gets the unsorted results back together
//! with the charts forming the cycle and carries on in degraded mode.

pub mod analysis;

pub use analysis::cycle_members;

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::warn;

use crate::chart::DependencyFilter;
use crate::error::{HelmSchemaError, Result};
use crate::generate::ChartResult;

/// Outcome of ordering results by their dependencies
#[derive(Debug)]
pub enum SortOutcome {
    /// Dependencies first; failed results trail in their original order
    Sorted(Vec<ChartResult>),
    /// The graph has a cycle; `results` keeps the input order
    Cycle {
        cycle: Vec<String>,
        results: Vec<ChartResult>,
    },
}

impl SortOutcome {
    pub fn into_results(self) -> Vec<ChartResult> {
        match self {
            SortOutcome::Sorted(results) => results,
            SortOutcome::Cycle { results, .. } => results,
        }
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, SortOutcome::Cycle { .. })
    }
}

/// Dependency graph over successfully generated charts.
///
/// Edges point from a dependency to its dependent. Charts sharing a name share
/// one node; the last one in input order is the node's weight and the earlier
/// ones are kept in `shadowed`.
pub struct DependencyGraph {
    pub(crate) graph: DiGraph<usize, ()>,
    pub(crate) node_indices: HashMap<String, NodeIndex>,
    pub(crate) shadowed: HashMap<NodeIndex, Vec<usize>>,
}

impl DependencyGraph {
    /// Build the graph; node weights are indexes into `results`.
    pub fn build(results: &[ChartResult], filter: &DependencyFilter) -> Self {
        let mut graph: DiGraph<usize, ()> =
            DiGraph::with_capacity(results.len(), results.len() * 2);
        let mut node_indices: HashMap<String, NodeIndex> = HashMap::with_capacity(results.len());
        let mut shadowed: HashMap<NodeIndex, Vec<usize>> = HashMap::new();

        for (i, result) in results.iter().enumerate() {
            let Some(name) = result.chart_name().filter(|_| result.is_ok()) else {
                continue;
            };
            match node_indices.get(name) {
                Some(&existing) => {
                    let previous = std::mem::replace(&mut graph[existing], i);
                    warn!(
                        chart = name,
                        first = %results[previous].chart_path.display(),
                        second = %result.chart_path.display(),
                        "Chart defined twice, the last definition wins"
                    );
                    shadowed.entry(existing).or_default().push(previous);
                }
                None => {
                    node_indices.insert(name.to_string(), graph.add_node(i));
                }
            }
        }

        for result in results.iter().filter(|r| r.is_ok()) {
            let Some(&to) = result.chart_name().and_then(|name| node_indices.get(name)) else {
                continue;
            };
            let Some(chart) = result.chart.as_ref() else {
                continue;
            };
            for dep in &chart.dependencies {
                if dep.name.is_empty() || !filter.allows(&dep.name) {
                    continue;
                }
                if let Some(&from) = node_indices.get(&dep.name) {
                    graph.update_edge(from, to, ());
                }
            }
        }

        Self {
            graph,
            node_indices,
            shadowed,
        }
    }

    pub fn chart_count(&self) -> usize {
        self.node_indices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Order results so dependencies precede their dependents.
///
/// Results carrying errors are not part of the graph and are appended after
/// the sorted ones. A chart shadowed by a later chart of the same name is
/// placed right before it. A cycle yields [`SortOutcome::Cycle`] with the
/// results in their original order. An ordering that does not account for
/// every result exactly once is an error.
pub fn topo_sort(results: Vec<ChartResult>, filter: &DependencyFilter) -> Result<SortOutcome> {
    let deps = DependencyGraph::build(&results, filter);

    let order = match toposort(&deps.graph, None) {
        Ok(order) => order,
        Err(cycle) => {
            let cycle = cycle_members(&deps, cycle.node_id(), &results);
            return Ok(SortOutcome::Cycle { cycle, results });
        }
    };

    let total = results.len();
    let mut slots: Vec<Option<ChartResult>> = results.into_iter().map(Some).collect();
    let mut sorted = Vec::with_capacity(total);
    for node in order {
        let earlier = deps.shadowed.get(&node).map(Vec::as_slice).unwrap_or_default();
        for &i in earlier.iter().chain(std::iter::once(&deps.graph[node])) {
            if let Some(result) = slots[i].take() {
                sorted.push(result);
            }
        }
    }
    sorted.extend(slots.into_iter().flatten());

    if sorted.len() != total {
        return Err(HelmSchemaError::Sort(format!(
            "ordering produced {} of {} results",
            sorted.len(),
            total
        )));
    }

    Ok(SortOutcome::Sorted(sorted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartFile, Dependency};
    use crate::schema::Schema;

    fn chart(name: &str, deps: &[&str]) -> ChartResult {
        let chart = ChartFile {
            name: name.to_string(),
            dependencies: deps
                .iter()
                .map(|d| Dependency {
                    name: d.to_string(),
                    ..Dependency::default()
                })
                .collect(),
            ..ChartFile::default()
        };
        ChartResult::generated(format!("{}/Chart.yaml", name), chart, Schema::object())
    }

    fn names(results: &[ChartResult]) -> Vec<String> {
        results
            .iter()
            .map(|r| r.chart_name().unwrap_or("<failed>").to_string())
            .collect()
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_dependencies_come_first() {
        let results = vec![
            chart("app", &["db", "cache"]),
            chart("cache", &["common"]),
            chart("db", &["common"]),
            chart("common", &[]),
        ];
        let outcome = topo_sort(results, &DependencyFilter::default()).unwrap();
        assert!(!outcome.is_cycle());

        let order = names(&outcome.into_results());
        assert_eq!(order.len(), 4);
        assert!(position(&order, "common") < position(&order, "db"));
        assert!(position(&order, "common") < position(&order, "cache"));
        assert!(position(&order, "db") < position(&order, "app"));
        assert!(position(&order, "cache") < position(&order, "app"));
    }

    #[test]
    fn test_sort_is_deterministic() {
        let build = || {
            vec![
                chart("app", &["a", "b", "c"]),
                chart("a", &[]),
                chart("b", &[]),
                chart("c", &[]),
            ]
        };
        let first = names(&topo_sort(build(), &DependencyFilter::default()).unwrap().into_results());
        let second = names(&topo_sort(build(), &DependencyFilter::default()).unwrap().into_results());
        assert_eq!(first, second);
    }

    #[test]
    fn test_cycle_falls_back_to_input_order() {
        let results = vec![chart("a", &["b"]), chart("b", &["c"]), chart("c", &["a"]), chart("d", &[])];
        let outcome = topo_sort(results, &DependencyFilter::default()).unwrap();

        match outcome {
            SortOutcome::Cycle { cycle, results } => {
                assert_eq!(cycle, vec!["a", "b", "c"]);
                assert_eq!(names(&results), vec!["a", "b", "c", "d"]);
            }
            other => panic!("Expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let outcome = topo_sort(vec![chart("a", &["a"])], &DependencyFilter::default()).unwrap();
        assert!(outcome.is_cycle());
    }

    #[test]
    fn test_filtered_edges_are_ignored() {
        // Only "db" passes the filter, so the cycle through "cache" disappears.
        let results = vec![
            chart("app", &["db", "cache"]),
            chart("db", &[]),
            chart("cache", &["app"]),
        ];
        let outcome = topo_sort(results, &DependencyFilter::new(["db"])).unwrap();
        assert!(!outcome.is_cycle());

        let order = names(&outcome.into_results());
        assert!(position(&order, "db") < position(&order, "app"));
    }

    #[test]
    fn test_failed_results_are_kept() {
        let mut failed = ChartResult::new("broken/Chart.yaml");
        failed
            .errors
            .push(HelmSchemaError::InvalidSkipField("x".to_string()));
        let results = vec![failed, chart("app", &["db"]), chart("db", &[])];

        let order = names(&topo_sort(results, &DependencyFilter::default()).unwrap().into_results());
        assert_eq!(order, vec!["db", "app", "<failed>"]);
    }

    #[test]
    fn test_duplicate_chart_names_last_wins() {
        let mut first = chart("common", &[]);
        first.chart_path = "postgresql/charts/common/Chart.yaml".into();
        let mut second = chart("common", &["base"]);
        second.chart_path = "redis/charts/common/Chart.yaml".into();
        let results = vec![
            chart("app", &["common"]),
            first,
            second,
            chart("base", &[]),
        ];

        let graph = DependencyGraph::build(&results, &DependencyFilter::default());
        assert_eq!(graph.chart_count(), 3);
        let common = graph.node_indices["common"];
        assert_eq!(graph.graph[common], 2);
        assert_eq!(graph.shadowed[&common], vec![1]);

        let sorted = topo_sort(results, &DependencyFilter::default())
            .unwrap()
            .into_results();
        let paths: Vec<_> = sorted.iter().map(|r| r.chart_path.clone()).collect();
        assert_eq!(sorted.len(), 4);
        let base = paths.iter().position(|p| p.ends_with("base/Chart.yaml")).unwrap();
        let shadowed = paths
            .iter()
            .position(|p| p.starts_with("postgresql"))
            .unwrap();
        let winner = paths.iter().position(|p| p.starts_with("redis")).unwrap();
        let app = paths.iter().position(|p| p.ends_with("app/Chart.yaml")).unwrap();
        assert!(base < shadowed);
        assert_eq!(shadowed + 1, winner);
        assert!(winner < app);
    }

    #[test]
    fn test_graph_counts() {
        let results = vec![chart("app", &["db", "missing"]), chart("db", &[])];
        let graph = DependencyGraph::build(&results, &DependencyFilter::default());
        assert_eq!(graph.chart_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }
}
