use crate::error::{Error, Result};
use crate::index::{DocId, Document, TermId, TermIndex, TermVector};
use std::collections::{BTreeSet, HashMap};

/// Ordered documents with their cached term-frequency vectors.
///
/// Documents, vectors and per-document maximum counts are parallel arrays; the position
/// map resolves an external id to its slot. Nothing here is mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
    vectors: Vec<TermVector>,
    max_counts: Vec<u32>,
    positions: HashMap<DocId, usize>,
}

impl DocumentStore {
    pub fn new(documents: Vec<Document>, vectors: Vec<TermVector>) -> Result<Self> {
        debug_assert_eq!(documents.len(), vectors.len());
        let mut positions = HashMap::with_capacity(documents.len());
        for (pos, doc) in documents.iter().enumerate() {
            if positions.insert(doc.id, pos).is_some() {
                return Err(Error::DuplicateDocument(doc.id));
            }
        }
        let max_counts = vectors.iter().map(|v| v.values().copied().max().unwrap_or(0)).collect();
        Ok(Self { documents, vectors, max_counts, positions })
    }

    pub fn get(&self, doc_id: DocId) -> Option<&Document> {
        self.positions.get(&doc_id).map(|&pos| &self.documents[pos])
    }

    pub fn vector(&self, doc_id: DocId) -> Option<&TermVector> {
        self.positions.get(&doc_id).map(|&pos| &self.vectors[pos])
    }

    pub fn contains(&self, doc_id: DocId) -> bool { self.positions.contains_key(&doc_id) }

    pub fn iter(&self) -> impl Iterator<Item = (&Document, &TermVector)> {
        self.documents.iter().zip(self.vectors.iter())
    }

    pub fn documents(&self) -> &[Document] { &self.documents }

    pub fn vectors(&self) -> &[TermVector] { &self.vectors }

    pub fn ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.documents.iter().map(|d| d.id)
    }

    pub fn len(&self) -> usize { self.documents.len() }

    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    /// Occurrences of a term in a document. Unknown terms or documents count 0.
    pub fn frequency(&self, tid: TermId, doc_id: DocId) -> u32 {
        self.vector(doc_id).and_then(|v| v.get(&tid).copied()).unwrap_or(0)
    }

    /// Highest term count in a document, 0 for empty or unknown documents.
    pub fn max_count(&self, doc_id: DocId) -> u32 {
        self.positions.get(&doc_id).map_or(0, |&pos| self.max_counts[pos])
    }

    /// Most frequent token of a document and its count, `("", 0)` for an empty one.
    /// Ties resolve to the smallest term id.
    pub fn max_frequency<'a>(&self, index: &'a TermIndex, doc_id: DocId) -> (&'a str, u32) {
        let best = self.vector(doc_id).and_then(|v| {
            v.iter().fold(None, |best: Option<(TermId, u32)>, (&tid, &count)| match best {
                Some((_, c)) if c >= count => best,
                _ => Some((tid, count)),
            })
        });
        match best {
            Some((tid, count)) => (index.id_to_token(tid).unwrap_or(""), count),
            None => ("", 0),
        }
    }

    /// Distinct term ids of a document.
    pub fn distinct_terms(&self, doc_id: DocId) -> BTreeSet<TermId> {
        self.vector(doc_id).map(|v| v.keys().copied().collect()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (TermIndex, DocumentStore) {
        let docs = vec![
            Document::new(10, "a", vec!["cat".into(), "dog".into(), "dog".into()]),
            Document::new(20, "b", vec![]),
        ];
        let mut index = TermIndex::new();
        let vectors = docs.iter().map(|d| index.add_document(&d.tokens)).collect();
        (index, DocumentStore::new(docs, vectors).unwrap())
    }

    #[test]
    fn lookups_by_external_id() {
        let (_, store) = store();
        assert_eq!(store.get(10).map(|d| d.title.as_str()), Some("a"));
        assert!(store.get(30).is_none());
        assert_eq!(store.frequency(1, 10), 2);
        assert_eq!(store.frequency(1, 20), 0);
        assert_eq!(store.frequency(7, 30), 0);
    }

    #[test]
    fn max_frequency_of_empty_document() {
        let (index, store) = store();
        assert_eq!(store.max_frequency(&index, 10), ("dog", 2));
        assert_eq!(store.max_frequency(&index, 20), ("", 0));
        assert_eq!(store.max_count(10), 2);
        assert_eq!(store.max_count(20), 0);
        assert_eq!(store.max_count(30), 0);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let docs = vec![Document::new(1, "a", vec![]), Document::new(1, "b", vec![])];
        let err = DocumentStore::new(docs, vec![TermVector::new(), TermVector::new()]).unwrap_err();
        assert!(matches!(err, Error::DuplicateDocument(1)));
    }
}
