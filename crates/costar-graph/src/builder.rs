//! Graph builder for constructing the cast graph from roster records.
//!
//! The builder takes production and role records and resolves the roles
//! into edges. A role that names an unknown production or carries an
//! unusable year is skipped and reported rather than aborting the build.

use crate::error::{GraphError, Result};
use crate::graph::CastGraph;
use costar_core::{Performer, Production, ProductionRecord, RoleRecord, Roster};
use serde::Serialize;
use tracing::{debug, warn};

/// A role the builder could not attach.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRole {
    pub role: RoleRecord,
    pub reason: String,
}

/// Outcome of a build.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    pub productions: usize,
    pub performers: usize,
    pub roles: usize,
    pub skipped: Vec<SkippedRole>,
}

/// Builds a CastGraph from roster records.
///
/// The builder handles the two-pass process:
/// 1. Add all productions to the graph
/// 2. Resolve roles into edges, creating performers on first sight
pub struct GraphBuilder {
    graph: CastGraph,
    pending_roles: Vec<RoleRecord>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            graph: CastGraph::new(),
            pending_roles: Vec::new(),
        }
    }

    /// Adds productions. Fails on the first production without a name.
    pub fn add_productions(&mut self, records: Vec<ProductionRecord>) -> Result<()> {
        for record in records {
            self.graph.add_production(Production::new(
                record.name,
                record.year,
                record.stars,
                record.votes,
            ))?;
        }
        Ok(())
    }

    /// Queues roles for resolution in `build`.
    pub fn add_roles(&mut self, roles: Vec<RoleRecord>) {
        self.pending_roles.extend(roles);
    }

    /// Adds a whole roster.
    pub fn add_roster(&mut self, roster: Roster) -> Result<()> {
        self.add_productions(roster.productions)?;
        self.add_roles(roster.roles);
        Ok(())
    }

    /// Resolves queued roles into edges.
    ///
    /// This is the second pass after all productions are added.
    pub fn resolve_roles(&mut self) -> Vec<SkippedRole> {
        let mut skipped = Vec::new();

        for role in std::mem::take(&mut self.pending_roles) {
            match self.attach(&role) {
                Ok(()) => {}
                Err(err) => {
                    warn!(
                        "Skipping role {} in '{}' ({}): {}",
                        role.performer, role.production, role.year, err
                    );
                    skipped.push(SkippedRole {
                        role,
                        reason: err.to_string(),
                    });
                }
            }
        }

        skipped
    }

    fn attach(&mut self, role: &RoleRecord) -> Result<()> {
        let production = self.graph.lookup_production(&role.production, &role.year)?;

        let performer = match self.graph.lookup_performer(&role.performer) {
            Ok(id) => id,
            Err(GraphError::NotFound { .. }) => {
                let performer = Performer::new(role.performer.clone())
                    .with_gender(role.gender.unwrap_or_default());
                self.graph.add_performer(performer)?
            }
            Err(other) => return Err(other),
        };

        self.graph.add_role(performer, production)
    }

    /// Finishes building and returns the graph with a report.
    pub fn build(mut self) -> (CastGraph, BuildReport) {
        let skipped = self.resolve_roles();
        let report = BuildReport {
            productions: self.graph.production_count(),
            performers: self.graph.performer_count(),
            roles: self.graph.role_count(),
            skipped,
        };
        debug!(
            "Built graph: {} productions, {} performers, {} roles, {} skipped",
            report.productions,
            report.performers,
            report.roles,
            report.skipped.len()
        );
        (self.graph, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costar_core::Gender;

    fn record(name: &str, year: i32) -> ProductionRecord {
        ProductionRecord {
            name: name.to_string(),
            year,
            stars: 7.0,
            votes: 100,
        }
    }

    #[test]
    fn test_builder_resolves_roles() {
        let mut builder = GraphBuilder::new();
        builder
            .add_productions(vec![record("Harbor Lights", 1954), record("Night Train", 1961)])
            .unwrap();
        builder.add_roles(vec![
            RoleRecord::new("Doe, Jane", "Harbor Lights", 1954),
            RoleRecord::new("Doe, Jane", "Night Train", 1961),
            RoleRecord::new("Roe, Rick", "Night Train", "1961"),
        ]);

        let (graph, report) = builder.build();
        assert_eq!(report.productions, 2);
        assert_eq!(report.performers, 2);
        assert_eq!(report.roles, 3);
        assert!(report.skipped.is_empty());
        graph.check_invariants().unwrap();
    }

    #[test]
    fn test_builder_skips_unresolvable_roles() {
        let mut builder = GraphBuilder::new();
        builder.add_productions(vec![record("Solo", 2001)]).unwrap();
        builder.add_roles(vec![
            RoleRecord::new("A", "Solo", 2001),
            RoleRecord::new("B", "Solo", "20O1"),
            RoleRecord::new("C", "Missing", 2001),
        ]);

        let (graph, report) = builder.build();
        assert_eq!(report.roles, 1);
        assert_eq!(report.skipped.len(), 2);
        assert!(graph.lookup_performer("B").is_err());
        assert!(report.skipped[0].reason.contains("Non-integer year"));
        assert!(report.skipped[1].reason.contains("Unknown production"));
    }

    #[test]
    fn test_builder_rejects_unnamed_production() {
        let mut builder = GraphBuilder::new();
        let err = builder.add_productions(vec![record("", 2001)]).unwrap_err();
        assert!(matches!(err, GraphError::InvalidEntity { .. }));
    }

    #[test]
    fn test_builder_keeps_gender() {
        let mut builder = GraphBuilder::new();
        builder
            .add_roster(Roster {
                productions: vec![record("Duet", 1980)],
                roles: vec![RoleRecord {
                    gender: Some(Gender::Female),
                    ..RoleRecord::new("Doe, Jane", "Duet", 1980)
                }],
            })
            .unwrap();

        let (graph, _) = builder.build();
        let id = graph.lookup_performer("Doe, Jane").unwrap();
        assert_eq!(graph.performer(id).unwrap().gender, Gender::Female);
    }
}
