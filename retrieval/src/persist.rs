use crate::config::INDEX_FORMAT_VERSION;
use crate::error::Result;
use crate::index::{Document, TermIndex, TermVector};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// Everything needed to restore a built corpus without re-reading the documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub index: TermIndex,
    pub documents: Vec<Document>,
    pub vectors: Vec<TermVector>,
}

/// Storage for a built index. `load` returns `None` when nothing has been saved yet.
pub trait IndexStore: Send + Sync {
    fn load(&self) -> Result<Option<IndexSnapshot>>;
    fn save(&self, snapshot: &IndexSnapshot) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn dictionary(&self) -> PathBuf { self.root.join("dictionary.bin") }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn vectors(&self) -> PathBuf { self.root.join("vectors.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Index kept as bincode files in one directory, with a JSON `meta.json` header.
///
/// `meta.json` is written last, so a directory without it is treated as empty.
pub struct FileIndexStore {
    paths: IndexPaths,
}

impl FileIndexStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { paths: IndexPaths::new(root) }
    }

    pub fn root(&self) -> &Path { &self.paths.root }

    pub fn load_meta(&self) -> Result<MetaFile> {
        let mut f = File::open(self.paths.meta())?;
        let mut buf = String::new();
        f.read_to_string(&mut buf)?;
        let meta: MetaFile = serde_json::from_str(&buf)?;
        Ok(meta)
    }

    fn save_meta(&self, meta: &MetaFile) -> Result<()> {
        let mut f = File::create(self.paths.meta())?;
        let json = serde_json::to_string_pretty(meta)?;
        f.write_all(json.as_bytes())?;
        Ok(())
    }
}

fn save_bin<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut f = File::create(path)?;
    let bytes = bincode::serialize(value)?;
    f.write_all(&bytes)?;
    Ok(())
}

fn load_bin<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(bincode::deserialize(&buf)?)
}

impl IndexStore for FileIndexStore {
    fn load(&self) -> Result<Option<IndexSnapshot>> {
        let meta = match self.load_meta() {
            Ok(meta) => meta,
            Err(crate::Error::Io(e)) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        if meta.version != INDEX_FORMAT_VERSION {
            tracing::warn!(found = meta.version, expected = INDEX_FORMAT_VERSION, "index format mismatch, rebuilding");
            return Ok(None);
        }
        let index: TermIndex = load_bin(&self.paths.dictionary())?;
        let documents: Vec<Document> = load_bin(&self.paths.docs())?;
        let vectors: Vec<TermVector> = load_bin(&self.paths.vectors())?;
        Ok(Some(IndexSnapshot { index, documents, vectors }))
    }

    fn save(&self, snapshot: &IndexSnapshot) -> Result<()> {
        create_dir_all(&self.paths.root)?;
        save_bin(&self.paths.dictionary(), &snapshot.index)?;
        save_bin(&self.paths.docs(), &snapshot.documents)?;
        save_bin(&self.paths.vectors(), &snapshot.vectors)?;
        let meta = MetaFile {
            num_docs: snapshot.documents.len() as u32,
            num_terms: snapshot.index.len() as u32,
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            version: INDEX_FORMAT_VERSION,
        };
        self.save_meta(&meta)?;
        tracing::info!(root = %self.paths.root.display(), num_docs = meta.num_docs, "saved index");
        Ok(())
    }
}

/// In-process index store.
#[derive(Default)]
pub struct MemoryIndexStore {
    snapshot: Mutex<Option<IndexSnapshot>>,
}

impl MemoryIndexStore {
    pub fn new() -> Self { Self::default() }
}

impl IndexStore for MemoryIndexStore {
    fn load(&self) -> Result<Option<IndexSnapshot>> {
        Ok(self.snapshot.lock().clone())
    }

    fn save(&self, snapshot: &IndexSnapshot) -> Result<()> {
        *self.snapshot.lock() = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn snapshot() -> IndexSnapshot {
        let documents = vec![Document::new(7, "seven", vec!["cat".into(), "dog".into()])];
        let mut index = TermIndex::new();
        let vectors = documents.iter().map(|d| index.add_document(&d.tokens)).collect();
        IndexSnapshot { index, documents, vectors }
    }

    #[test]
    fn empty_directory_is_not_found() {
        let dir = tempdir().unwrap();
        let store = FileIndexStore::new(dir.path().join("index"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileIndexStore::new(dir.path());
        let snap = snapshot();
        store.save(&snap).unwrap();
        assert_eq!(store.load().unwrap(), Some(snap));
        let meta = store.load_meta().unwrap();
        assert_eq!(meta.num_docs, 1);
        assert_eq!(meta.num_terms, 2);
        assert_eq!(meta.version, INDEX_FORMAT_VERSION);
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryIndexStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&snapshot()).unwrap();
        assert_eq!(store.load().unwrap(), Some(snapshot()));
    }
}
