//! Consistency repair after ad hoc node removal.
//!
//! Callers narrow a graph by removing nodes directly, which can leave
//! edges pointing at nodes that no longer exist. `cleanup` drops those
//! edges, then drops nodes left without any edge, and repeats until a
//! pass changes nothing. One removal can isolate a neighbour whose
//! removal isolates another, so a single pass is not enough.

use crate::filter::{PerformerFilter, ProductionFilter};
use crate::graph::CastGraph;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What a cleanup run removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Passes run, including the final pass that changed nothing.
    pub passes: usize,
    pub performers_removed: usize,
    pub productions_removed: usize,
    /// Roles removed, counted from the performer side.
    pub edges_removed: usize,
}

impl CleanupReport {
    pub fn is_noop(&self) -> bool {
        self.performers_removed == 0 && self.productions_removed == 0 && self.edges_removed == 0
    }

    fn absorb(&mut self, other: CleanupReport) {
        self.passes += other.passes;
        self.performers_removed += other.performers_removed;
        self.productions_removed += other.productions_removed;
        self.edges_removed += other.edges_removed;
    }
}

impl CastGraph {
    /// Restores edge symmetry and removes isolated nodes, in place.
    ///
    /// This mutates the graph it is called on; take a `clone()` first
    /// if the unpruned graph is still needed.
    pub fn cleanup(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        let roles_before = self.role_count();

        loop {
            let before = self.footprint();
            report.passes += 1;

            // Keep only edges whose target exists and lists us back.
            let productions = &self.productions;
            for performer in self.performers.values_mut() {
                let id = performer.id;
                performer.productions.retain(|m| {
                    productions
                        .get(m)
                        .is_some_and(|work| work.performers.contains(&id))
                });
            }
            let performers = &self.performers;
            for production in self.productions.values_mut() {
                let id = production.id;
                production.performers.retain(|p| {
                    performers
                        .get(p)
                        .is_some_and(|actor| actor.productions.contains(&id))
                });
            }

            report.productions_removed += self.retain_productions(|m| !m.performers.is_empty());
            report.performers_removed += self.retain_performers(|p| !p.productions.is_empty());

            let after = self.footprint();
            debug!("Cleanup pass {}: footprint {} -> {}", report.passes, before, after);
            if after == before {
                break;
            }
        }

        report.edges_removed = roles_before.saturating_sub(self.role_count());
        report
    }

    /// Keeps the productions and performers selected by the filters, then
    /// cleans up. Mutates in place.
    ///
    /// Productions are narrowed first, so `PerformerFilter::MinRoles`
    /// counts only roles in surviving productions.
    pub fn narrow(
        &mut self,
        productions: &ProductionFilter,
        performers: &PerformerFilter,
    ) -> CleanupReport {
        let keep = productions.select(self);
        let dropped_productions = self.retain_productions(|m| keep.contains(&m.id));
        let mut report = self.cleanup();
        report.productions_removed += dropped_productions;

        let keep = performers.select(self);
        let roles_before = self.role_count();
        let dropped_performers = self.retain_performers(|p| keep.contains(&p.id));
        let mut second = self.cleanup();
        second.performers_removed += dropped_performers;
        second.edges_removed = roles_before.saturating_sub(self.role_count());
        report.absorb(second);

        info!(
            "Narrowed graph to {} performers, {} productions ({} performers, {} productions removed)",
            self.performer_count(),
            self.production_count(),
            report.performers_removed,
            report.productions_removed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costar_core::{Performer, PerformerId, Production, ProductionId};

    /// X - M1 - Y - M2 - Z, plus W only in M2.
    fn chain() -> (CastGraph, [PerformerId; 4], [ProductionId; 2]) {
        let mut graph = CastGraph::new();
        let m1 = graph
            .add_production(Production::new("M1", 2000, 8.0, 100))
            .unwrap();
        let m2 = graph
            .add_production(Production::new("M2", 2001, 4.0, 50))
            .unwrap();
        let x = graph.add_performer(Performer::new("X")).unwrap();
        let y = graph.add_performer(Performer::new("Y")).unwrap();
        let z = graph.add_performer(Performer::new("Z")).unwrap();
        let w = graph.add_performer(Performer::new("W")).unwrap();
        graph.add_role(x, m1).unwrap();
        graph.add_role(y, m1).unwrap();
        graph.add_role(y, m2).unwrap();
        graph.add_role(z, m2).unwrap();
        graph.add_role(w, m2).unwrap();
        (graph, [x, y, z, w], [m1, m2])
    }

    #[test]
    fn test_cleanup_on_consistent_graph_is_noop() {
        let (mut graph, _, _) = chain();
        let report = graph.cleanup();
        assert!(report.is_noop());
        assert_eq!(report.passes, 1);
    }

    #[test]
    fn test_removing_production_prunes_isolated_performers() {
        let (mut graph, [x, y, z, w], [m1, m2]) = chain();
        graph.remove_production(m2);

        let report = graph.cleanup();
        assert_eq!(report.performers_removed, 2);
        assert_eq!(report.edges_removed, 3);
        assert!(graph.performer(z).is_none());
        assert!(graph.performer(w).is_none());
        assert!(graph.performer(x).is_some());
        assert_eq!(
            graph.performer(y).unwrap().productions.iter().copied().collect::<Vec<_>>(),
            vec![m1]
        );
        graph.check_invariants().unwrap();
    }

    #[test]
    fn test_cascading_removal() {
        // Removing both X and Y leaves M1 castless.
        let (mut graph, [x, y, _, _], [m1, m2]) = chain();
        graph.remove_performer(x);
        graph.remove_performer(y);

        let report = graph.cleanup();
        assert!(graph.production(m1).is_none());
        assert!(graph.production(m2).is_some());
        assert_eq!(report.productions_removed, 1);
        assert!(graph.lookup_production("M1", "2000").is_err());
        graph.check_invariants().unwrap();
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let (mut graph, [_, y, _, _], _) = chain();
        graph.remove_performer(y);
        graph.cleanup();
        let stats = graph.stats();

        let second = graph.cleanup();
        assert!(second.is_noop());
        assert_eq!(graph.stats(), stats);
    }

    #[test]
    fn test_cleanup_repairs_one_sided_edges() {
        let (mut graph, [x, _, _, _], [m1, _]) = chain();
        graph.performers.get_mut(&x).unwrap().productions.remove(&m1);

        graph.cleanup();
        graph.check_invariants().unwrap();
        assert!(graph.performer(x).is_none());
    }

    #[test]
    fn test_narrow_to_top_rated() {
        let (mut graph, [x, y, _, _], [m1, _]) = chain();
        let report = graph.narrow(&ProductionFilter::TopRated(1), &PerformerFilter::All);

        assert_eq!(report.productions_removed, 1);
        assert_eq!(report.performers_removed, 2);
        assert_eq!(graph.production_count(), 1);
        assert!(graph.production(m1).is_some());
        assert!(graph.performer(x).is_some());
        assert!(graph.performer(y).is_some());
        graph.check_invariants().unwrap();
    }

    #[test]
    fn test_narrow_by_performer() {
        let (mut graph, [_, y, _, _], _) = chain();
        let report = graph.narrow(&ProductionFilter::All, &PerformerFilter::MinRoles(2));

        assert_eq!(graph.performer_count(), 1);
        assert!(graph.performer(y).is_some());
        assert_eq!(report.performers_removed, 3);
        graph.check_invariants().unwrap();
    }
}
