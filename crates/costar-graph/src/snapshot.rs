//! Acyclic snapshot form of a cast graph.
//!
//! `CastGraph::store` consumes a live graph and produces a `StoredGraph`:
//! plain node lists whose edges are identifier sets, with no lookup
//! indexes. `StoredGraph::restore` is the inverse and the only way back
//! to a live graph, so a graph can never be stored twice in a row.

use crate::error::{GraphError, Result};
use crate::graph::CastGraph;
use crate::ids::IdAllocator;
use costar_core::{Performer, PerformerId, Production, ProductionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Snapshot format version written by this crate.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A graph in its stored state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredGraph {
    pub version: u32,
    pub ids: IdAllocator,
    pub performers: Vec<Performer>,
    pub productions: Vec<Production>,
}

impl CastGraph {
    /// Moves the graph into its stored state.
    pub fn store(self) -> StoredGraph {
        StoredGraph {
            version: SNAPSHOT_VERSION,
            ids: self.ids,
            performers: self.performers.into_values().collect(),
            productions: self.productions.into_values().collect(),
        }
    }

    /// Stores a copy of the graph, leaving this one live.
    pub fn to_stored(&self) -> StoredGraph {
        self.clone().store()
    }
}

impl StoredGraph {
    /// Reconstructs a live graph.
    ///
    /// Every edge must point at a node present in the snapshot and be
    /// mirrored on the other side; otherwise restore fails with
    /// `InvariantViolation` naming the node.
    pub fn restore(self) -> Result<CastGraph> {
        if self.version != SNAPSHOT_VERSION {
            return Err(GraphError::violation(
                "snapshot",
                format!(
                    "unsupported version {} (expected {})",
                    self.version, SNAPSHOT_VERSION
                ),
            ));
        }

        let mut ids = self.ids;
        let mut performers: BTreeMap<PerformerId, Performer> = BTreeMap::new();
        for performer in self.performers {
            if !performer.id.is_assigned() {
                return Err(GraphError::violation(&performer.name, "unassigned id"));
            }
            ids.observe_performer(performer.id);
            let id = performer.id;
            if performers.insert(id, performer).is_some() {
                return Err(GraphError::violation(id, "duplicate id"));
            }
        }

        let mut productions: BTreeMap<ProductionId, Production> = BTreeMap::new();
        for production in self.productions {
            if !production.id.is_assigned() {
                return Err(GraphError::violation(&production.name, "unassigned id"));
            }
            ids.observe_production(production.id);
            let id = production.id;
            if productions.insert(id, production).is_some() {
                return Err(GraphError::violation(id, "duplicate id"));
            }
        }

        let graph = CastGraph::from_parts(performers, productions, ids);
        graph.check_invariants()?;

        debug!(
            "Restored snapshot: {} performers, {} productions, {} roles",
            graph.performer_count(),
            graph.production_count(),
            graph.role_count()
        );
        Ok(graph)
    }
}
