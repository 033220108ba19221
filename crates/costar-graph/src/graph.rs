//! Core graph data structure.
//!
//! The CastGraph owns both node sets and the lookup indexes. Roles are
//! stored on both sides as identifier sets, so the graph never needs
//! shared ownership between performers and productions.

use crate::edge::RoleEdge;
use crate::error::{GraphError, Result};
use crate::ids::IdAllocator;
use costar_core::{NodeRef, Performer, PerformerId, Production, ProductionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// The bipartite performer/production graph.
///
/// Node sets are keyed by identifier and iterate in id order, which keeps
/// every analysis deterministic.
#[derive(Debug, Clone, Default)]
pub struct CastGraph {
    pub(crate) performers: BTreeMap<PerformerId, Performer>,
    pub(crate) productions: BTreeMap<ProductionId, Production>,

    /// Maps performer names to ids.
    performer_index: HashMap<String, PerformerId>,

    /// Maps (name, year) to production ids. Last insert wins.
    production_index: HashMap<(String, i32), ProductionId>,

    pub(crate) ids: IdAllocator,
}

impl CastGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a graph from node sets and rebuilds the lookup indexes.
    pub(crate) fn from_parts(
        performers: BTreeMap<PerformerId, Performer>,
        productions: BTreeMap<ProductionId, Production>,
        ids: IdAllocator,
    ) -> Self {
        let mut graph = Self {
            performers,
            productions,
            performer_index: HashMap::new(),
            production_index: HashMap::new(),
            ids,
        };
        graph.rebuild_indexes();
        graph
    }

    /// Rebuilds both indexes in id order, so collisions resolve to the
    /// most recently inserted node.
    pub(crate) fn rebuild_indexes(&mut self) {
        self.performer_index = self
            .performers
            .values()
            .map(|p| (p.name.clone(), p.id))
            .collect();
        self.production_index = self
            .productions
            .values()
            .map(|m| ((m.name.clone(), m.year), m.id))
            .collect();
    }

    /// Inserts a production and returns its freshly assigned id.
    ///
    /// A production with the same (name, year) as an existing one replaces
    /// it in the lookup index; the earlier node stays in the graph.
    pub fn add_production(&mut self, mut production: Production) -> Result<ProductionId> {
        if production.name.is_empty() {
            return Err(GraphError::InvalidEntity {
                kind: "production",
                reason: format!("empty name (year {})", production.year),
            });
        }

        if !production.stars.is_finite() {
            return Err(GraphError::InvalidEntity {
                kind: "production",
                reason: format!(
                    "'{}' ({}) has non-finite rating {}",
                    production.name, production.year, production.stars
                ),
            });
        }

        let id = self.ids.next_production();
        production.id = id;
        production.performers.clear();

        let key = (production.name.clone(), production.year);
        if let Some(previous) = self.production_index.insert(key, id) {
            warn!(
                "Duplicate production '{}' ({}): index now points at {} instead of {}",
                production.name, production.year, id, previous
            );
        }

        debug!("Added {} as {}", production, id);
        self.productions.insert(id, production);
        Ok(id)
    }

    /// Inserts a performer and returns its freshly assigned id.
    pub fn add_performer(&mut self, mut performer: Performer) -> Result<PerformerId> {
        if performer.name.is_empty() {
            return Err(GraphError::InvalidEntity {
                kind: "performer",
                reason: "empty name".to_string(),
            });
        }

        let id = self.ids.next_performer();
        performer.id = id;
        performer.productions.clear();

        if let Some(previous) = self.performer_index.insert(performer.name.clone(), id) {
            warn!(
                "Duplicate performer '{}': index now points at {} instead of {}",
                performer.name, id, previous
            );
        }

        debug!("Added {} as {}", performer, id);
        self.performers.insert(id, performer);
        Ok(id)
    }

    /// Links a performer and a production on both sides. Idempotent.
    pub fn add_role(&mut self, performer: PerformerId, production: ProductionId) -> Result<()> {
        if !self.productions.contains_key(&production) {
            return Err(GraphError::not_found("production", production));
        }
        let actor = self
            .performers
            .get_mut(&performer)
            .ok_or_else(|| GraphError::not_found("performer", performer))?;
        actor.productions.insert(production);

        if let Some(work) = self.productions.get_mut(&production) {
            work.performers.insert(performer);
        }
        Ok(())
    }

    /// Looks up a performer by name.
    pub fn lookup_performer(&self, name: &str) -> Result<PerformerId> {
        self.performer_index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::not_found("performer", name))
    }

    /// Looks up a production by name and a year given as text.
    ///
    /// Fails with `InvalidYear` when the year does not parse as an integer,
    /// and with `NotFound` when the pair is unknown.
    pub fn lookup_production(&self, name: &str, year: &str) -> Result<ProductionId> {
        let parsed: i32 = year.trim().parse().map_err(|_| GraphError::InvalidYear {
            name: name.to_string(),
            year: year.to_string(),
        })?;

        self.find_production(name, parsed)
            .ok_or_else(|| GraphError::not_found("production", format!("{} {}", name, parsed)))
    }

    /// Typed-year variant of `lookup_production`.
    pub fn find_production(&self, name: &str, year: i32) -> Option<ProductionId> {
        self.production_index.get(&(name.to_string(), year)).copied()
    }

    pub fn performer(&self, id: PerformerId) -> Option<&Performer> {
        self.performers.get(&id)
    }

    pub fn production(&self, id: ProductionId) -> Option<&Production> {
        self.productions.get(&id)
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        match node {
            NodeRef::Performer(id) => self.performers.contains_key(&id),
            NodeRef::Production(id) => self.productions.contains_key(&id),
        }
    }

    /// Iterates over performers in id order.
    pub fn performers(&self) -> impl Iterator<Item = &Performer> {
        self.performers.values()
    }

    /// Iterates over productions in id order.
    pub fn productions(&self) -> impl Iterator<Item = &Production> {
        self.productions.values()
    }

    /// Neighbours of a node on the other side of the bipartition.
    pub fn neighbors(&self, node: NodeRef) -> Vec<NodeRef> {
        match node {
            NodeRef::Performer(id) => self
                .performers
                .get(&id)
                .map(|p| p.productions.iter().map(|&m| NodeRef::Production(m)).collect())
                .unwrap_or_default(),
            NodeRef::Production(id) => self
                .productions
                .get(&id)
                .map(|m| m.performers.iter().map(|&p| NodeRef::Performer(p)).collect())
                .unwrap_or_default(),
        }
    }

    /// Removes a performer from the node set.
    ///
    /// If the name index pointed at it, the entry falls back to the highest
    /// remaining id with the same name, matching `rebuild_indexes`.
    /// Productions that list this performer keep the dangling id until
    /// `cleanup` runs.
    pub fn remove_performer(&mut self, id: PerformerId) -> Option<Performer> {
        let performer = self.performers.remove(&id)?;
        if self.performer_index.get(&performer.name) == Some(&id) {
            let survivor = self
                .performers
                .values()
                .rev()
                .find(|p| p.name == performer.name)
                .map(|p| p.id);
            match survivor {
                Some(other) => {
                    self.performer_index.insert(performer.name.clone(), other);
                }
                None => {
                    self.performer_index.remove(&performer.name);
                }
            }
        }
        Some(performer)
    }

    /// Removes a production from the node set.
    ///
    /// If the (name, year) index pointed at it, the entry falls back to the
    /// highest remaining id with the same key, matching `rebuild_indexes`.
    /// Performers that list this production keep the dangling id until
    /// `cleanup` runs.
    pub fn remove_production(&mut self, id: ProductionId) -> Option<Production> {
        let production = self.productions.remove(&id)?;
        let key = (production.name.clone(), production.year);
        if self.production_index.get(&key) == Some(&id) {
            let survivor = self
                .productions
                .values()
                .rev()
                .find(|m| m.name == production.name && m.year == production.year)
                .map(|m| m.id);
            match survivor {
                Some(other) => {
                    self.production_index.insert(key, other);
                }
                None => {
                    self.production_index.remove(&key);
                }
            }
        }
        Some(production)
    }

    /// Keeps only performers matching the predicate. Returns how many were removed.
    pub fn retain_performers<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Performer) -> bool,
    {
        let doomed: Vec<PerformerId> = self
            .performers
            .values()
            .filter(|p| !keep(p))
            .map(|p| p.id)
            .collect();
        for id in &doomed {
            self.performers.remove(id);
        }
        if !doomed.is_empty() {
            self.rebuild_indexes();
        }
        doomed.len()
    }

    /// Keeps only productions matching the predicate. Returns how many were removed.
    pub fn retain_productions<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Production) -> bool,
    {
        let doomed: Vec<ProductionId> = self
            .productions
            .values()
            .filter(|m| !keep(m))
            .map(|m| m.id)
            .collect();
        for id in &doomed {
            self.productions.remove(id);
        }
        if !doomed.is_empty() {
            self.rebuild_indexes();
        }
        doomed.len()
    }

    /// Verifies edge symmetry, edge targets, and non-empty names.
    pub fn check_invariants(&self) -> Result<()> {
        for performer in self.performers.values() {
            if performer.name.is_empty() {
                return Err(GraphError::violation(performer.id, "empty name"));
            }
            for production in &performer.productions {
                let mirrored = self
                    .productions
                    .get(production)
                    .map(|m| m.performers.contains(&performer.id));
                match mirrored {
                    None => {
                        return Err(GraphError::violation(
                            performer.id,
                            format!("references missing production {}", production),
                        ))
                    }
                    Some(false) => {
                        return Err(GraphError::violation(
                            performer.id,
                            format!("edge to {} is not mirrored", production),
                        ))
                    }
                    Some(true) => {}
                }
            }
        }

        for production in self.productions.values() {
            if production.name.is_empty() {
                return Err(GraphError::violation(production.id, "empty name"));
            }
            for performer in &production.performers {
                let mirrored = self
                    .performers
                    .get(performer)
                    .map(|p| p.productions.contains(&production.id));
                if mirrored != Some(true) {
                    return Err(GraphError::violation(
                        production.id,
                        format!("edge to {} is missing or not mirrored", performer),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Returns every role as a flat edge list, ordered by performer then production.
    pub fn role_edges(&self) -> Vec<RoleEdge> {
        self.performers
            .values()
            .flat_map(|p| p.productions.iter().map(move |&m| RoleEdge::new(p.id, m)))
            .collect()
    }

    pub fn performer_count(&self) -> usize {
        self.performers.len()
    }

    pub fn production_count(&self) -> usize {
        self.productions.len()
    }

    /// Number of roles, counted from the performer side.
    pub fn role_count(&self) -> usize {
        self.performers.values().map(|p| p.productions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.performers.is_empty() && self.productions.is_empty()
    }

    /// Total node count plus edge entries on both sides.
    ///
    /// Any removal strictly lowers this number.
    pub(crate) fn footprint(&self) -> usize {
        self.performers.len()
            + self.productions.len()
            + self.role_count()
            + self
                .productions
                .values()
                .map(|m| m.performers.len())
                .sum::<usize>()
    }

    /// The identifier allocator for this graph.
    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }
}

/// Graph statistics for status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub performers: usize,
    pub productions: usize,
    pub roles: usize,
}

impl CastGraph {
    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            performers: self.performer_count(),
            productions: self.production_count(),
            roles: self.role_count(),
        }
    }
}
