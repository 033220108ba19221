//! Role edges.
//!
//! Inside the graph a role is stored twice, once in the performer's
//! production set and once in the production's performer set. This type
//! is the flattened form used for export.

use costar_core::{PerformerId, ProductionId};
use serde::{Deserialize, Serialize};

/// A performer appearing in a production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleEdge {
    pub performer: PerformerId,
    pub production: ProductionId,
}

impl RoleEdge {
    pub fn new(performer: PerformerId, production: ProductionId) -> Self {
        Self {
            performer,
            production,
        }
    }
}

impl std::fmt::Display for RoleEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -- {}", self.performer, self.production)
    }
}
