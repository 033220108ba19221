//! Node types for the cast graph.
//!
//! A performer appears in productions; a production features performers.
//! Edges between the two kinds are stored on both sides as identifier sets,
//! so the entities never hold references to each other.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of a performer, unique within one graph.
///
/// Issued by the graph on insertion. The zero value marks a performer
/// that has not been inserted yet.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PerformerId(u32);

impl PerformerId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    /// True once the id has been issued by a graph.
    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for PerformerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}", self.0)
    }
}

/// Identifier of a production, unique within one graph.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ProductionId(u32);

impl ProductionId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ProductionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.0)
    }
}

/// Either kind of node, used where both kinds share one index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRef {
    Performer(PerformerId),
    Production(ProductionId),
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Performer(id) => id.fmt(f),
            Self::Production(id) => id.fmt(f),
        }
    }
}

impl From<PerformerId> for NodeRef {
    fn from(id: PerformerId) -> Self {
        Self::Performer(id)
    }
}

impl From<ProductionId> for NodeRef {
    fn from(id: ProductionId) -> Self {
        Self::Production(id)
    }
}

/// Gender as recorded by the source listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unspecified,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unspecified => "unspecified",
        };
        write!(f, "{}", s)
    }
}

/// A cast member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    /// Assigned by the graph on insertion.
    pub id: PerformerId,

    /// Display name. Must be non-empty.
    pub name: String,

    pub gender: Gender,

    /// Productions this performer appears in.
    pub productions: BTreeSet<ProductionId>,
}

impl Performer {
    /// Creates a performer that has not been inserted into a graph yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PerformerId::default(),
            name: name.into(),
            gender: Gender::Unspecified,
            productions: BTreeSet::new(),
        }
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    /// Number of productions this performer appears in.
    pub fn role_count(&self) -> usize {
        self.productions.len()
    }
}

impl fmt::Display for Performer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Performer<{}>", self.name)
    }
}

/// A creative work: film, episode, or stage run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Production {
    /// Assigned by the graph on insertion.
    pub id: ProductionId,

    pub name: String,

    /// Release year. Together with `name` this is the lookup key.
    pub year: i32,

    /// Quality score (rating).
    pub stars: f64,

    /// Popularity (vote count).
    pub votes: u32,

    /// Performers appearing in this production.
    pub performers: BTreeSet<PerformerId>,
}

impl Production {
    /// Creates a production that has not been inserted into a graph yet.
    pub fn new(name: impl Into<String>, year: i32, stars: f64, votes: u32) -> Self {
        Self {
            id: ProductionId::default(),
            name: name.into(),
            year,
            stars,
            votes,
            performers: BTreeSet::new(),
        }
    }

    pub fn cast_size(&self) -> usize {
        self.performers.len()
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Production<{} {} {} {}>",
            self.name, self.year, self.stars, self.votes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(PerformerId::new(7).to_string(), "A7");
        assert_eq!(ProductionId::new(3).to_string(), "M3");
        assert_eq!(NodeRef::from(ProductionId::new(3)).to_string(), "M3");
    }

    #[test]
    fn test_new_nodes_are_unassigned() {
        let performer = Performer::new("Doe, Jane").with_gender(Gender::Female);
        assert!(!performer.id.is_assigned());
        assert_eq!(performer.gender, Gender::Female);

        let production = Production::new("Harbor Lights", 1954, 6.8, 410);
        assert!(!production.id.is_assigned());
        assert_eq!(production.cast_size(), 0);
        assert_eq!(production.to_string(), "Production<Harbor Lights 1954 6.8 410>");
    }

    #[test]
    fn test_node_ref_ordering_groups_kinds() {
        let a = NodeRef::from(PerformerId::new(9));
        let m = NodeRef::from(ProductionId::new(1));
        assert!(a < m);
    }
}
