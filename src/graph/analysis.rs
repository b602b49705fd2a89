//! Cycle analysis for the chart dependency graph

use petgraph::algo::kosaraju_scc;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use super::DependencyGraph;
use crate::generate::ChartResult;

/// Names of the charts in the strongly connected component containing `node`,
/// sorted for stable reporting.
pub fn cycle_members(
    graph: &DependencyGraph,
    node: NodeIndex,
    results: &[ChartResult],
) -> Vec<String> {
    let name_of = |idx: NodeIndex| {
        results[graph.graph[idx]]
            .chart_name()
            .unwrap_or_default()
            .to_string()
    };

    let component = kosaraju_scc(&graph.graph)
        .into_iter()
        .find(|scc| scc.contains(&node))
        .unwrap_or_else(|| vec![node]);

    // A lone node only forms a cycle through a self-edge.
    if component.len() == 1 {
        let self_ref = graph
            .graph
            .edges_directed(node, Direction::Outgoing)
            .any(|e| e.target() == node);
        if !self_ref {
            return Vec::new();
        }
    }

    let mut names: Vec<String> = component.into_iter().map(name_of).collect();
    names.sort();
    names
}
