use crate::error::GraphError;
use crate::graph::CastGraph;
use crate::snapshot::StoredGraph;
use sled::Db;
use std::path::Path;
use thiserror::Error;
use tracing::info;

const GRAPH_KEY: &str = "main_graph";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sled(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("Snapshot rejected: {0}")]
    Snapshot(#[from] GraphError),
}

/// Persists one graph snapshot in a sled database.
pub struct GraphStore {
    db: Db,
}

impl GraphStore {
    /// Opens or creates a graph store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Saves a snapshot of the graph, replacing any previous one.
    ///
    /// The snapshot is serialized using bincode and stored under a fixed key.
    pub fn save_graph(&self, graph: &CastGraph) -> Result<(), StoreError> {
        self.save_snapshot(&graph.to_stored())
    }

    /// Saves an already stored graph.
    pub fn save_snapshot(&self, snapshot: &StoredGraph) -> Result<(), StoreError> {
        let bytes = bincode::serialize(snapshot)?;
        let size = bytes.len();
        self.db.insert(GRAPH_KEY, bytes)?;
        self.db.flush()?;
        info!(
            "Saved snapshot: {} performers, {} productions ({} bytes)",
            snapshot.performers.len(),
            snapshot.productions.len(),
            size
        );
        Ok(())
    }

    /// Loads and restores the graph, if one has been saved.
    pub fn load_graph(&self) -> Result<Option<CastGraph>, StoreError> {
        if let Some(bytes) = self.db.get(GRAPH_KEY)? {
            let snapshot: StoredGraph = bincode::deserialize(&bytes)?;
            Ok(Some(snapshot.restore()?))
        } else {
            Ok(None)
        }
    }

    /// Clears the stored graph.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.db.remove(GRAPH_KEY)?;
        self.db.flush()?;
        Ok(())
    }
}
