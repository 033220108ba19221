//! Costar Graph - Bipartite cast graph and collaboration analytics
//!
//! This crate owns the performer/production graph and the analyses run
//! over it: component extraction, consistency repair after narrowing,
//! all-pairs shortest paths with closeness centrality, and triadic
//! closure between time windows.
//!
//! # Architecture
//!
//! Nodes live in id-keyed maps and roles are stored on both sides as
//! identifier sets, with indexes for:
//! - Performer lookup by name
//! - Production lookup by (name, year)
//!
//! A graph is either live (`CastGraph`) or stored (`StoredGraph`); the
//! stored form is what `GraphStore` writes to disk.
//!
//! # Example
//!
//! ```
//! use costar_graph::{CastGraph, PathOptions};
//! use costar_core::{Performer, Production};
//!
//! let mut graph = CastGraph::new();
//! let film = graph.add_production(Production::new("Night Train", 1961, 7.2, 800)).unwrap();
//! let jane = graph.add_performer(Performer::new("Doe, Jane")).unwrap();
//! graph.add_role(jane, film).unwrap();
//!
//! let paths = graph.shortest_paths(&PathOptions::default()).unwrap();
//! assert_eq!(paths.distance(jane, film), Some(1));
//! ```

mod builder;
mod cleanup;
pub mod cohesion;
mod component;
mod edge;
mod error;
mod filter;
mod graph;
mod ids;
pub mod paths;
mod snapshot;
mod store;

pub use builder::{BuildReport, GraphBuilder, SkippedRole};
pub use cleanup::CleanupReport;
pub use cohesion::{
    closure_series, triadic_closure, ClosureRatio, ClosureRow, ClosureSchedule, CoStarProjection,
    YearWindow,
};
pub use edge::RoleEdge;
pub use error::{GraphError, Result};
pub use filter::{stars_percentile, PerformerFilter, ProductionFilter};
pub use graph::{CastGraph, GraphStats};
pub use ids::IdAllocator;
pub use paths::{PathOptions, PathStrategy, ShortestPaths, UNREACHABLE};
pub use snapshot::{StoredGraph, SNAPSHOT_VERSION};
pub use store::{GraphStore, StoreError};
