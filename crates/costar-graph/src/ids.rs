//! Identifier assignment.
//!
//! Each graph owns one allocator. Identifiers are monotonic and never
//! reused, even after nodes are pruned, and the allocator travels with
//! snapshots so a restored graph keeps issuing fresh ids.

use costar_core::{PerformerId, ProductionId};
use serde::{Deserialize, Serialize};

/// Issues performer and production identifiers for one graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    last_performer: u32,
    last_production: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_performer(&mut self) -> PerformerId {
        self.last_performer += 1;
        PerformerId::new(self.last_performer)
    }

    pub fn next_production(&mut self) -> ProductionId {
        self.last_production += 1;
        ProductionId::new(self.last_production)
    }

    /// Raises the watermark so `id` is never issued again.
    pub fn observe_performer(&mut self, id: PerformerId) {
        self.last_performer = self.last_performer.max(id.raw());
    }

    pub fn observe_production(&mut self, id: ProductionId) {
        self.last_production = self.last_production.max(id.raw());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_performer(), PerformerId::new(1));
        assert_eq!(ids.next_performer(), PerformerId::new(2));
        assert_eq!(ids.next_production(), ProductionId::new(1));
    }

    #[test]
    fn test_observe_skips_past_seen_ids() {
        let mut ids = IdAllocator::new();
        ids.observe_production(ProductionId::new(40));
        ids.observe_production(ProductionId::new(3));
        assert_eq!(ids.next_production(), ProductionId::new(41));
    }
}
