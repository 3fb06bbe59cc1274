//! Summary statistics of a finished crawl and their text rendering.

use crate::topology::SocialGraph;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    /// Mean shortest-path length over all ordered node pairs. `None` when the
    /// graph is empty or disconnected.
    pub average_path_length: Option<f64>,
    /// Longest shortest path. `None` when the graph is empty or disconnected.
    pub diameter: Option<usize>,
}

impl GraphSummary {
    pub fn compute(graph: &SocialGraph) -> Self {
        let n = graph.node_count();
        let (average_path_length, diameter) = match path_stats(graph) {
            Some((total, pairs, longest)) => {
                let avg = if pairs == 0 { 0.0 } else { total as f64 / pairs as f64 };
                (Some(avg), Some(longest))
            }
            None => (None, None),
        };

        Self {
            node_count: n,
            edge_count: graph.edge_count(),
            average_path_length,
            diameter,
        }
    }

    /// Plain-text report in the `graph_data.txt` layout.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Node count: = {}", self.node_count);
        let _ = writeln!(out, "Edge count: = {}", self.edge_count);
        match self.average_path_length {
            Some(avg) => {
                let _ = writeln!(out, "Avg distance between nodes = {}", avg);
            }
            None => out.push_str("Avg distance between nodes = undefined (graph is not connected)\n"),
        }
        match self.diameter {
            Some(d) => {
                let _ = writeln!(out, "Diameter of graph = {}", d);
            }
            None => out.push_str("Diameter of graph = undefined (graph is not connected)\n"),
        }
        out
    }
}

/// BFS from every node. Returns (sum of distances, ordered pair count, eccentricity max),
/// or `None` for an empty or disconnected graph.
fn path_stats(graph: &SocialGraph) -> Option<(u64, u64, usize)> {
    let n = graph.node_count();
    if n == 0 {
        return None;
    }

    let mut total = 0u64;
    let mut longest = 0usize;
    let mut dist = vec![usize::MAX; n];
    let mut queue = VecDeque::new();

    for source in 0..n {
        dist.iter_mut().for_each(|d| *d = usize::MAX);
        dist[source] = 0;
        queue.push_back(source as u32);
        let mut reached = 1usize;

        while let Some(node) = queue.pop_front() {
            let d = dist[node as usize];
            for &next in graph.adjacent(node) {
                if dist[next as usize] == usize::MAX {
                    dist[next as usize] = d + 1;
                    reached += 1;
                    total += (d + 1) as u64;
                    longest = longest.max(d + 1);
                    queue.push_back(next);
                }
            }
        }

        if reached < n {
            return None;
        }
    }

    Some((total, (n as u64) * (n as u64 - 1), longest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AccountId;

    fn graph_of(edges: &[(u64, u64)]) -> SocialGraph {
        let mut graph = SocialGraph::new();
        for &(a, b) in edges {
            graph.add_edge(AccountId(a), AccountId(b));
        }
        graph
    }

    #[test]
    fn star_graph_statistics() {
        // 1 is the hub of 2, 3, 4
        let summary = GraphSummary::compute(&graph_of(&[(1, 2), (1, 3), (1, 4)]));
        assert_eq!(summary.node_count, 4);
        assert_eq!(summary.edge_count, 3);
        assert_eq!(summary.diameter, Some(2));
        // 6 pairs at distance 1, 6 at distance 2
        assert_eq!(summary.average_path_length, Some(1.5));
    }

    #[test]
    fn path_graph_statistics() {
        let summary = GraphSummary::compute(&graph_of(&[(1, 2), (2, 3)]));
        assert_eq!(summary.diameter, Some(2));
        // distances: 1,1,2 each counted in both directions
        let avg = summary.average_path_length.unwrap();
        assert!((avg - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn single_node_and_empty_graphs() {
        let mut single = SocialGraph::new();
        single.add_node(AccountId(9));
        let summary = GraphSummary::compute(&single);
        assert_eq!(summary.average_path_length, Some(0.0));
        assert_eq!(summary.diameter, Some(0));

        let empty = GraphSummary::compute(&SocialGraph::new());
        assert_eq!(empty.node_count, 0);
        assert_eq!(empty.diameter, None);
    }

    #[test]
    fn disconnected_graph_has_no_path_statistics() {
        let summary = GraphSummary::compute(&graph_of(&[(1, 2), (3, 4)]));
        assert_eq!(summary.average_path_length, None);
        assert_eq!(summary.diameter, None);
        assert!(summary.render().contains("undefined"));
    }

    #[test]
    fn render_uses_report_layout() {
        let summary = GraphSummary::compute(&graph_of(&[(1, 2)]));
        assert_eq!(
            summary.render(),
            "Node count: = 2\nEdge count: = 1\nAvg distance between nodes = 1\nDiameter of graph = 1\n"
        );
    }
}
