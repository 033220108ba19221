//! Connected-component extraction.
//!
//! Breadth-first traversal from a seed performer, alternating between
//! the performer frontier and the production frontier until nothing new
//! is discovered. The result is an independent graph holding copies of
//! the visited nodes.

use crate::error::{GraphError, Result};
use crate::filter::ProductionFilter;
use crate::graph::CastGraph;
use costar_core::{Performer, PerformerId, Production, ProductionId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

impl CastGraph {
    /// Returns the component containing `seed` as a new graph.
    ///
    /// The result always contains the seed and is closed: no edge joins
    /// a node inside it to a node outside. Identifiers are preserved.
    pub fn extract_component(&self, seed: PerformerId) -> Result<CastGraph> {
        self.extract_component_filtered(seed, &ProductionFilter::All)
    }

    /// Like `extract_component`, but only walks through productions the
    /// filter keeps.
    pub fn extract_component_filtered(
        &self,
        seed: PerformerId,
        filter: &ProductionFilter,
    ) -> Result<CastGraph> {
        if !self.performers.contains_key(&seed) {
            return Err(GraphError::not_found("performer", seed));
        }

        let passable = match filter {
            ProductionFilter::All => None,
            other => Some(other.select(self)),
        };
        let can_enter = |m: &ProductionId| {
            self.productions.contains_key(m)
                && passable.as_ref().map_or(true, |keep| keep.contains(m))
        };

        let mut performers_seen: BTreeSet<PerformerId> = BTreeSet::new();
        let mut productions_seen: BTreeSet<ProductionId> = BTreeSet::new();
        let mut performer_queue: VecDeque<PerformerId> = VecDeque::from([seed]);
        let mut production_queue: VecDeque<ProductionId> = VecDeque::new();

        while !performer_queue.is_empty() || !production_queue.is_empty() {
            while let Some(current) = performer_queue.pop_front() {
                if !performers_seen.insert(current) {
                    continue;
                }
                if let Some(performer) = self.performers.get(&current) {
                    production_queue.extend(
                        performer
                            .productions
                            .iter()
                            .filter(|m| !productions_seen.contains(*m) && can_enter(*m)),
                    );
                }
            }

            while let Some(current) = production_queue.pop_front() {
                if !productions_seen.insert(current) {
                    continue;
                }
                if let Some(production) = self.productions.get(&current) {
                    performer_queue.extend(production.performers.iter().filter(|p| {
                        !performers_seen.contains(*p) && self.performers.contains_key(*p)
                    }));
                }
            }
        }

        let performers: BTreeMap<PerformerId, Performer> = performers_seen
            .iter()
            .filter_map(|id| self.performers.get(id))
            .map(|p| {
                let mut copy = p.clone();
                copy.productions.retain(|m| productions_seen.contains(m));
                (copy.id, copy)
            })
            .collect();
        let productions: BTreeMap<ProductionId, Production> = productions_seen
            .iter()
            .filter_map(|id| self.productions.get(id))
            .map(|m| {
                let mut copy = m.clone();
                copy.performers.retain(|p| performers_seen.contains(p));
                (copy.id, copy)
            })
            .collect();

        debug!(
            "Component of {}: {} performers, {} productions",
            seed,
            performers.len(),
            productions.len()
        );

        Ok(CastGraph::from_parts(performers, productions, self.ids.clone()))
    }
}
