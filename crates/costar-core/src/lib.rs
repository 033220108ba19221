//! Costar Core - Entities of the cast graph
//!
//! This crate defines the two node kinds of the bipartite cast graph,
//! performers and productions, together with their typed identifiers.
//! It also provides the roster records that ingestion hands to the
//! graph builder.
//!
//! The graph container itself lives in `costar-graph`; the types here
//! carry no behaviour beyond construction and display.
//!
//! # Example
//!
//! ```
//! use costar_core::{Performer, Production};
//!
//! let performer = Performer::new("Grimwood, Matt");
//! let production = Production::new("The Long Take", 1998, 7.4, 12_000);
//! assert_eq!(production.year, 1998);
//! assert!(performer.productions.is_empty());
//! ```

mod error;
mod node;
pub mod roster;

pub use error::{Result, RosterError};
pub use node::{Gender, NodeRef, Performer, PerformerId, Production, ProductionId};
pub use roster::{ProductionRecord, RoleRecord, Roster};
