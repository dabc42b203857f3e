//! Rating persistence.
//!
//! Ratings are kept per namespace (typically one per corpus) so several corpora can
//! share one store.

use crate::error::Result;
use crate::index::DocId;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Document id -> rating. Explicit feedback is 0 or 1, implicit feedback is always 1.
pub type Ratings = BTreeMap<DocId, f64>;

pub trait RatingStore: Send + Sync {
    /// Ratings saved under `namespace`, empty when there are none.
    fn load_ratings(&self, namespace: &str) -> Result<Ratings>;
    fn save_ratings(&self, namespace: &str, ratings: &Ratings) -> Result<()>;
}

/// Ratings in an embedded sled database. Each namespace is one bincode value in the
/// `ratings` tree, so a save replaces the whole map atomically.
pub struct SledRatingStore {
    tree: sled::Tree,
}

impl SledRatingStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Self::from_db(&db)
    }

    /// Store backed by a throwaway database, removed when dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(&db)
    }

    fn from_db(db: &sled::Db) -> Result<Self> {
        Ok(Self { tree: db.open_tree("ratings")? })
    }
}

impl RatingStore for SledRatingStore {
    fn load_ratings(&self, namespace: &str) -> Result<Ratings> {
        match self.tree.get(namespace.as_bytes())? {
            Some(bytes) => Ok(bincode::deserialize(&bytes)?),
            None => Ok(Ratings::new()),
        }
    }

    fn save_ratings(&self, namespace: &str, ratings: &Ratings) -> Result<()> {
        let bytes = bincode::serialize(ratings)?;
        self.tree.insert(namespace.as_bytes(), bytes)?;
        self.tree.flush()?;
        tracing::debug!(namespace, count = ratings.len(), "saved ratings");
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRatingStore {
    namespaces: Mutex<HashMap<String, Ratings>>,
}

impl MemoryRatingStore {
    pub fn new() -> Self { Self::default() }
}

impl RatingStore for MemoryRatingStore {
    fn load_ratings(&self, namespace: &str) -> Result<Ratings> {
        Ok(self.namespaces.lock().get(namespace).cloned().unwrap_or_default())
    }

    fn save_ratings(&self, namespace: &str, ratings: &Ratings) -> Result<()> {
        self.namespaces.lock().insert(namespace.to_string(), ratings.clone());
        Ok(())
    }
}
