//! Corpus-wide statistics shared by every ranking model.
//!
//! A [`Corpus`] is built once from a finished list of documents and is read-only
//! afterwards, so one instance can be shared across threads behind an `Arc`.

use crate::documents::DocumentStore;
use crate::error::Result;
use crate::index::{DocId, Document, TermId, TermIndex, TermVector};
use crate::persist::{IndexSnapshot, IndexStore};

/// Supplies the documents of a corpus, already normalized into tokens.
pub trait DocumentSource {
    fn documents(&self) -> Result<Vec<Document>>;
}

impl DocumentSource for Vec<Document> {
    fn documents(&self) -> Result<Vec<Document>> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    index: TermIndex,
    documents: DocumentStore,
    max_idf: f64,
}

impl Corpus {
    /// Assign token ids, derive term vectors and document frequencies in one pass.
    pub fn build(documents: Vec<Document>) -> Result<Self> {
        let mut index = TermIndex::new();
        let vectors: Vec<TermVector> = documents.iter().map(|d| index.add_document(&d.tokens)).collect();
        let documents = DocumentStore::new(documents, vectors)?;
        tracing::info!(num_docs = documents.len(), num_terms = index.len(), "built corpus index");
        Ok(Self::assemble(index, documents))
    }

    pub fn from_snapshot(snapshot: IndexSnapshot) -> Result<Self> {
        let IndexSnapshot { index, documents, vectors } = snapshot;
        let documents = DocumentStore::new(documents, vectors)?;
        Ok(Self::assemble(index, documents))
    }

    pub fn snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            index: self.index.clone(),
            documents: self.documents.documents().to_vec(),
            vectors: self.documents.vectors().to_vec(),
        }
    }

    /// Load the index from `store`, or build it from `source` and save it right away
    /// when the store has nothing yet.
    pub fn open<S, D>(store: &S, source: &D) -> Result<Self>
    where
        S: IndexStore + ?Sized,
        D: DocumentSource + ?Sized,
    {
        if let Some(snapshot) = store.load()? {
            let corpus = Self::from_snapshot(snapshot)?;
            tracing::info!(num_docs = corpus.num_docs(), "loaded corpus index from store");
            return Ok(corpus);
        }
        let corpus = Self::build(source.documents()?)?;
        store.save(&corpus.snapshot())?;
        Ok(corpus)
    }

    fn assemble(index: TermIndex, documents: DocumentStore) -> Self {
        let mut corpus = Self { index, documents, max_idf: 0.0 };
        corpus.max_idf = (0..corpus.index.len() as TermId)
            .map(|tid| corpus.idf(tid))
            .fold(0.0, f64::max);
        corpus
    }

    pub fn index(&self) -> &TermIndex { &self.index }

    pub fn documents(&self) -> &DocumentStore { &self.documents }

    pub fn document(&self, doc_id: DocId) -> Option<&Document> { self.documents.get(doc_id) }

    pub fn num_docs(&self) -> usize { self.documents.len() }

    pub fn token_to_id(&self, token: &str) -> Option<TermId> { self.index.token_to_id(token) }

    pub fn frequency(&self, tid: TermId, doc_id: DocId) -> u32 { self.documents.frequency(tid, doc_id) }

    /// Frequency of a token by its text; tokens missing from the index count 0.
    pub fn token_frequency(&self, token: &str, doc_id: DocId) -> u32 {
        self.token_to_id(token).map_or(0, |tid| self.frequency(tid, doc_id))
    }

    pub fn max_frequency(&self, doc_id: DocId) -> (&str, u32) {
        self.documents.max_frequency(&self.index, doc_id)
    }

    /// `frequency / max_frequency` of the document, 0 for an empty document.
    pub fn tf(&self, tid: TermId, doc_id: DocId) -> f64 {
        let max = self.documents.max_count(doc_id);
        if max == 0 {
            return 0.0;
        }
        self.frequency(tid, doc_id) as f64 / max as f64
    }

    /// `log2(N / df)`, 0 for terms no document contains.
    pub fn idf(&self, tid: TermId) -> f64 {
        let df = self.index.document_frequency(tid);
        if df == 0 {
            return 0.0;
        }
        (self.num_docs() as f64 / df as f64).log2()
    }

    pub fn max_idf(&self) -> f64 { self.max_idf }

    /// idf scaled into `[0, 1]` by the largest idf of the corpus.
    pub fn normalized_idf(&self, tid: TermId) -> f64 {
        if self.max_idf == 0.0 {
            return 0.0;
        }
        self.idf(tid) / self.max_idf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: DocId, text: &str) -> Document {
        Document::new(id, format!("doc{id}"), text.split_whitespace().map(str::to_string).collect())
    }

    #[test]
    fn tf_idf_statistics() {
        let corpus = Corpus::build(vec![doc(1, "cat dog dog"), doc(2, "cat"), doc(3, "")]).unwrap();
        let cat = corpus.token_to_id("cat").unwrap();
        let dog = corpus.token_to_id("dog").unwrap();
        assert_eq!(corpus.tf(dog, 1), 1.0);
        assert_eq!(corpus.tf(cat, 1), 0.5);
        assert_eq!(corpus.tf(cat, 3), 0.0);
        assert!((corpus.idf(dog) - 3f64.log2()).abs() < 1e-12);
        assert!((corpus.idf(cat) - 1.5f64.log2()).abs() < 1e-12);
        assert_eq!(corpus.max_idf(), corpus.idf(dog));
        assert_eq!(corpus.normalized_idf(dog), 1.0);
        assert_eq!(corpus.token_frequency("bird", 1), 0);
    }

    #[test]
    fn universal_terms_have_zero_max_idf() {
        let corpus = Corpus::build(vec![doc(1, "cat"), doc(2, "cat")]).unwrap();
        assert_eq!(corpus.max_idf(), 0.0);
        assert_eq!(corpus.normalized_idf(0), 0.0);
    }

    #[test]
    fn empty_corpus() {
        let corpus = Corpus::build(Vec::new()).unwrap();
        assert_eq!(corpus.num_docs(), 0);
        assert_eq!(corpus.max_idf(), 0.0);
    }

    #[test]
    fn snapshot_round_trip_keeps_statistics() {
        let corpus = Corpus::build(vec![doc(1, "cat dog"), doc(2, "cat")]).unwrap();
        let restored = Corpus::from_snapshot(corpus.snapshot()).unwrap();
        assert_eq!(restored.index(), corpus.index());
        assert_eq!(restored.max_idf(), corpus.max_idf());
        assert_eq!(restored.document(2), corpus.document(2));
    }
}
