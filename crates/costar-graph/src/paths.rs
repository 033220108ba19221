//! All-pairs shortest paths and closeness centrality.
//!
//! Performers and productions share one dense index space: the graph is
//! projected into a petgraph `UnGraph` whose node indexes are the rows
//! and columns of an N x N distance table. Every role is a unit edge.
//!
//! Two strategies fill the table. `Dense` runs the triple-loop
//! Floyd-Warshall relaxation, O(N^3) time. `Bfs` runs one unit-weight
//! search per source over the projection, O(N * (N + E)), which is the
//! better choice for large sparse graphs. Both need the O(N^2) table, so
//! callers bound N through `PathOptions::max_nodes`.

use crate::error::{GraphError, Result};
use crate::graph::CastGraph;
use costar_core::NodeRef;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Instant;
use tracing::info;

/// Distance recorded for pairs with no connecting path.
pub const UNREACHABLE: u32 = u32::MAX;

/// Default cap on the number of nodes in one all-pairs run.
pub const DEFAULT_MAX_NODES: usize = 10_000;

/// How the distance table is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStrategy {
    /// Floyd-Warshall over the dense matrix.
    #[default]
    Dense,
    /// One breadth-first search per source node.
    Bfs,
}

impl FromStr for PathStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dense" | "floyd-warshall" => Ok(Self::Dense),
            "bfs" => Ok(Self::Bfs),
            other => Err(format!("unknown path strategy '{}'", other)),
        }
    }
}

impl std::fmt::Display for PathStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dense => write!(f, "dense"),
            Self::Bfs => write!(f, "bfs"),
        }
    }
}

/// Options for `CastGraph::shortest_paths`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathOptions {
    pub strategy: PathStrategy,
    pub max_nodes: usize,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            strategy: PathStrategy::Dense,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

/// Distance table and closeness scores for one graph.
///
/// Owns its table outright; nothing is written back onto the graph.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    nodes: Vec<NodeRef>,
    index: HashMap<NodeRef, usize>,
    /// Row-major N x N distances.
    dist: Vec<u32>,
    closeness: Vec<f64>,
}

impl CastGraph {
    /// Computes all-pairs shortest distances and closeness centrality.
    ///
    /// Fails with `TooLarge` before allocating anything when the graph has
    /// more than `options.max_nodes` nodes.
    pub fn shortest_paths(&self, options: &PathOptions) -> Result<ShortestPaths> {
        let n = self.performer_count() + self.production_count();
        if n > options.max_nodes {
            return Err(GraphError::TooLarge {
                nodes: n,
                limit: options.max_nodes,
            });
        }

        let start = Instant::now();
        let projection = project(self);
        let dist = match options.strategy {
            PathStrategy::Dense => floyd_warshall(&projection),
            PathStrategy::Bfs => per_source_search(&projection),
        };
        let closeness = closeness_from(&dist, n);

        let nodes: Vec<NodeRef> = projection.node_weights().copied().collect();
        let index = nodes.iter().enumerate().map(|(i, &node)| (node, i)).collect();

        info!(
            "Shortest paths over {} nodes ({}) in {}ms",
            n,
            options.strategy,
            start.elapsed().as_millis()
        );

        Ok(ShortestPaths {
            nodes,
            index,
            dist,
            closeness,
        })
    }
}

/// Projects the cast graph into one undirected graph, performers first.
fn project(graph: &CastGraph) -> UnGraph<NodeRef, ()> {
    let mut projection = UnGraph::with_capacity(
        graph.performer_count() + graph.production_count(),
        graph.role_count(),
    );

    let mut slots: HashMap<NodeRef, NodeIndex> = HashMap::new();
    for node in graph
        .performers()
        .map(|p| NodeRef::Performer(p.id))
        .chain(graph.productions().map(|m| NodeRef::Production(m.id)))
    {
        slots.insert(node, projection.add_node(node));
    }

    for performer in graph.performers() {
        let from = slots[&NodeRef::Performer(performer.id)];
        for production in &performer.productions {
            if let Some(&to) = slots.get(&NodeRef::Production(*production)) {
                projection.add_edge(from, to, ());
            }
        }
    }

    projection
}

fn floyd_warshall(projection: &UnGraph<NodeRef, ()>) -> Vec<u32> {
    let n = projection.node_count();
    let mut dist = vec![UNREACHABLE; n * n];

    for i in 0..n {
        dist[i * n + i] = 0;
    }
    for edge in projection.edge_references() {
        let (a, b) = (edge.source().index(), edge.target().index());
        dist[a * n + b] = 1;
        dist[b * n + a] = 1;
    }

    for k in 0..n {
        for i in 0..n {
            let ik = dist[i * n + k];
            if ik == UNREACHABLE {
                continue;
            }
            for j in 0..n {
                let kj = dist[k * n + j];
                if kj == UNREACHABLE {
                    continue;
                }
                let through = ik + kj;
                if through < dist[i * n + j] {
                    dist[i * n + j] = through;
                }
            }
        }
    }

    dist
}

fn per_source_search(projection: &UnGraph<NodeRef, ()>) -> Vec<u32> {
    let n = projection.node_count();
    let mut dist = vec![UNREACHABLE; n * n];

    for source in projection.node_indices() {
        let row = source.index() * n;
        let reached = petgraph::algo::dijkstra(projection, source, None, |_| 1u32);
        for (target, d) in reached {
            dist[row + target.index()] = d;
        }
    }

    dist
}

/// Closeness is reachable-count over distance-sum, other nodes only.
/// Nodes that reach nothing score 0.0.
fn closeness_from(dist: &[u32], n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let row = &dist[i * n..(i + 1) * n];
            let (reachable, sum) = row
                .iter()
                .enumerate()
                .filter(|&(j, &d)| j != i && d != UNREACHABLE)
                .fold((0u64, 0u64), |(r, s), (_, &d)| (r + 1, s + u64::from(d)));
            if sum == 0 {
                0.0
            } else {
                reachable as f64 / sum as f64
            }
        })
        .collect()
}

impl ShortestPaths {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes in table order: performers by id, then productions by id.
    pub fn nodes(&self) -> &[NodeRef] {
        &self.nodes
    }

    pub fn index_of(&self, node: impl Into<NodeRef>) -> Option<usize> {
        self.index.get(&node.into()).copied()
    }

    /// Raw table entry; `UNREACHABLE` when no path exists.
    pub fn distance_at(&self, i: usize, j: usize) -> u32 {
        self.dist[i * self.nodes.len() + j]
    }

    /// Shortest distance between two nodes, if both are known and connected.
    pub fn distance(&self, a: impl Into<NodeRef>, b: impl Into<NodeRef>) -> Option<u32> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        match self.distance_at(i, j) {
            UNREACHABLE => None,
            d => Some(d),
        }
    }

    /// Closeness of a node; 0.0 for isolated or unknown nodes.
    pub fn closeness(&self, node: impl Into<NodeRef>) -> f64 {
        self.index_of(node)
            .map(|i| self.closeness[i])
            .unwrap_or(0.0)
    }

    /// Closeness of a node, failing where the ratio is undefined.
    pub fn checked_closeness(&self, node: impl Into<NodeRef>) -> Result<f64> {
        let node = node.into();
        let i = self
            .index_of(node)
            .ok_or_else(|| GraphError::not_found("node", node))?;
        let score = self.closeness[i];
        if score == 0.0 {
            return Err(GraphError::UndefinedRatio {
                context: format!("closeness of {} (no reachable nodes)", node),
            });
        }
        Ok(score)
    }

    /// All closeness scores in table order.
    pub fn closeness_scores(&self) -> impl Iterator<Item = (NodeRef, f64)> + '_ {
        self.nodes.iter().copied().zip(self.closeness.iter().copied())
    }

    /// The `limit` most central nodes, highest first.
    pub fn top_closeness(&self, limit: usize) -> Vec<(NodeRef, f64)> {
        let mut ranked: Vec<(NodeRef, f64)> = self.closeness_scores().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(limit);
        ranked
    }

    /// Percentage of nodes per closeness decile (`closeness * 10`,
    /// truncated), eleven buckets.
    pub fn closeness_distribution(&self) -> [u32; 11] {
        let mut buckets = [0usize; 11];
        for &score in &self.closeness {
            let bucket = ((score * 10.0) as usize).min(10);
            buckets[bucket] += 1;
        }

        let total = self.closeness.len();
        let mut percent = [0u32; 11];
        if total > 0 {
            for (slot, count) in percent.iter_mut().zip(buckets) {
                *slot = (100 * count / total) as u32;
            }
        }
        percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costar_core::{Performer, PerformerId, Production, ProductionId};

    /// X - M1 - Y - M2 - Z
    fn chain() -> (CastGraph, [PerformerId; 3], [ProductionId; 2]) {
        let mut graph = CastGraph::new();
        let m1 = graph.add_production(Production::new("M1", 2000, 7.0, 1)).unwrap();
        let m2 = graph.add_production(Production::new("M2", 2001, 7.0, 1)).unwrap();
        let x = graph.add_performer(Performer::new("X")).unwrap();
        let y = graph.add_performer(Performer::new("Y")).unwrap();
        let z = graph.add_performer(Performer::new("Z")).unwrap();
        graph.add_role(x, m1).unwrap();
        graph.add_role(y, m1).unwrap();
        graph.add_role(y, m2).unwrap();
        graph.add_role(z, m2).unwrap();
        (graph, [x, y, z], [m1, m2])
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_chain_distances() {
        let (graph, [x, y, z], [m1, m2]) = chain();
        let paths = graph.shortest_paths(&PathOptions::default()).unwrap();

        assert_eq!(paths.node_count(), 5);
        assert_eq!(paths.distance(x, z), Some(4));
        assert_eq!(paths.distance(x, y), Some(2));
        assert_eq!(paths.distance(x, m1), Some(1));
        assert_eq!(paths.distance(z, m2), Some(1));
        assert_eq!(paths.distance(m1, m2), Some(2));
        assert_eq!(paths.distance(y, y), Some(0));
    }

    #[test]
    fn test_table_is_a_metric() {
        let (mut graph, _, _) = chain();
        graph.add_performer(Performer::new("Loner")).unwrap();
        let paths = graph.shortest_paths(&PathOptions::default()).unwrap();
        let n = paths.node_count();

        for i in 0..n {
            assert_eq!(paths.distance_at(i, i), 0);
            for j in 0..n {
                assert_eq!(paths.distance_at(i, j), paths.distance_at(j, i));
                for k in 0..n {
                    let (ik, kj) = (paths.distance_at(i, k), paths.distance_at(k, j));
                    if ik != UNREACHABLE && kj != UNREACHABLE {
                        assert!(paths.distance_at(i, j) <= ik + kj);
                    }
                }
            }
        }
    }

    #[test]
    fn test_closeness_values() {
        let (graph, [x, y, _], _) = chain();
        let paths = graph.shortest_paths(&PathOptions::default()).unwrap();

        // X reaches M1, Y, M2, Z at 1, 2, 3, 4.
        assert!(approx(paths.closeness(x), 4.0 / 10.0));
        // Y reaches M1, M2 at 1 and X, Z at 2.
        assert!(approx(paths.closeness(y), 4.0 / 6.0));

        for (_, score) in paths.closeness_scores() {
            assert!(score > 0.0 && score <= 1.0);
        }
        assert_eq!(paths.top_closeness(1)[0].0, NodeRef::Performer(y));
    }

    #[test]
    fn test_isolated_node_closeness() {
        let (mut graph, _, _) = chain();
        let loner = graph.add_performer(Performer::new("Loner")).unwrap();
        let paths = graph.shortest_paths(&PathOptions::default()).unwrap();

        assert_eq!(paths.closeness(loner), 0.0);
        assert!(matches!(
            paths.checked_closeness(loner),
            Err(GraphError::UndefinedRatio { .. })
        ));
        assert_eq!(paths.distance(loner, PerformerId::new(1)), None);
    }

    #[test]
    fn test_strategies_agree() {
        let (mut graph, _, [_, m2]) = chain();
        let w = graph.add_performer(Performer::new("W")).unwrap();
        graph.add_role(w, m2).unwrap();
        graph.add_performer(Performer::new("Loner")).unwrap();

        let dense = graph.shortest_paths(&PathOptions::default()).unwrap();
        let bfs = graph
            .shortest_paths(&PathOptions {
                strategy: PathStrategy::Bfs,
                ..PathOptions::default()
            })
            .unwrap();

        assert_eq!(dense.nodes(), bfs.nodes());
        for i in 0..dense.node_count() {
            for j in 0..dense.node_count() {
                assert_eq!(dense.distance_at(i, j), bfs.distance_at(i, j));
            }
        }
    }

    #[test]
    fn test_too_large() {
        let (graph, _, _) = chain();
        let err = graph
            .shortest_paths(&PathOptions {
                strategy: PathStrategy::Dense,
                max_nodes: 4,
            })
            .unwrap_err();
        assert_eq!(err, GraphError::TooLarge { nodes: 5, limit: 4 });
    }

    #[test]
    fn test_empty_graph() {
        let paths = CastGraph::new()
            .shortest_paths(&PathOptions::default())
            .unwrap();
        assert_eq!(paths.node_count(), 0);
        assert_eq!(paths.closeness_distribution(), [0; 11]);
    }

    #[test]
    fn test_distribution_buckets() {
        let (graph, _, _) = chain();
        let paths = graph.shortest_paths(&PathOptions::default()).unwrap();
        // X, Z: 0.4; M1, M2: 4/7; Y: 4/6.
        let dist = paths.closeness_distribution();
        assert_eq!(dist[4], 40);
        assert_eq!(dist[5], 40);
        assert_eq!(dist[6], 20);
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("BFS".parse::<PathStrategy>().unwrap(), PathStrategy::Bfs);
        assert_eq!("dense".parse::<PathStrategy>().unwrap(), PathStrategy::Dense);
        assert!("astar".parse::<PathStrategy>().is_err());
    }
}
