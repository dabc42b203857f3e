//! Feedback-driven document recommender.
//!
//! Predicts interest in unrated documents from the ratings of similar documents
//! (Jaccard over distinct terms), using a mean-plus-deviation baseline. Ratings come
//! from explicit feedback and from the implicit feedback of the extended boolean model.

use crate::corpus::Corpus;
use crate::error::Result;
use crate::index::{DocId, Document};
use crate::ratings::{RatingStore, Ratings};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::sync::Arc;

/// Groups documents into neighborhoods; the recommender only asks it for candidates.
pub trait NeighborOracle: Send + Sync {
    fn neighbors(&self, doc_id: DocId) -> Vec<DocId>;
}

pub struct Recommender {
    corpus: Arc<Corpus>,
    store: Arc<dyn RatingStore>,
    namespace: String,
    neighbors: Option<Arc<dyn NeighborOracle>>,
    // single writer: add_rating/add_ratings hold the write lock until the store has the update
    ratings: RwLock<Ratings>,
}

impl Recommender {
    /// Create a recommender over `corpus`, loading the ratings saved under `namespace`.
    pub fn new(corpus: Arc<Corpus>, store: Arc<dyn RatingStore>, namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let ratings = store.load_ratings(&namespace)?;
        tracing::info!(namespace = %namespace, count = ratings.len(), "loaded ratings");
        Ok(Self { corpus, store, namespace, neighbors: None, ratings: RwLock::new(ratings) })
    }

    /// Restrict candidate pools to the oracle's neighbors instead of the whole corpus.
    pub fn with_neighbors(mut self, oracle: Arc<dyn NeighborOracle>) -> Self {
        self.neighbors = Some(oracle);
        self
    }

    pub fn namespace(&self) -> &str { &self.namespace }

    pub fn corpus(&self) -> &Corpus { &self.corpus }

    pub fn ratings(&self) -> Ratings { self.ratings.read().clone() }

    pub fn rating(&self, doc_id: DocId) -> Option<f64> { self.ratings.read().get(&doc_id).copied() }

    pub fn is_empty(&self) -> bool { self.ratings.read().is_empty() }

    /// Average of all ratings, `None` when nothing has been rated.
    pub fn mean_rating(&self) -> Option<f64> { mean(&self.ratings.read()) }

    pub fn deviation(&self, doc_id: DocId) -> Option<f64> {
        let ratings = self.ratings.read();
        mean(&ratings).map(|m| deviation(&ratings, doc_id, m))
    }

    pub fn baseline(&self, doc_id: DocId) -> Option<f64> {
        let ratings = self.ratings.read();
        mean(&ratings).map(|m| baseline(&ratings, doc_id, m))
    }

    /// Jaccard similarity of the distinct term sets of two documents.
    /// 0 when both are empty or unknown.
    pub fn similarity(&self, a: DocId, b: DocId) -> f64 {
        let documents = self.corpus.documents();
        let (va, vb) = match (documents.vector(a), documents.vector(b)) {
            (Some(va), Some(vb)) => (va, vb),
            _ => return 0.0,
        };
        let (small, large) = if va.len() <= vb.len() { (va, vb) } else { (vb, va) };
        let intersection = small.keys().filter(|tid| large.contains_key(tid)).count();
        let union = va.len() + vb.len() - intersection;
        if union == 0 {
            return 0.0;
        }
        intersection as f64 / union as f64
    }

    /// Predicted rating of a document, `None` when nothing has been rated.
    pub fn expected_rating(&self, doc_id: DocId) -> Option<f64> {
        let ratings = self.ratings.read();
        mean(&ratings).map(|m| self.expected(&ratings, doc_id, m))
    }

    fn expected(&self, ratings: &Ratings, doc_id: DocId, mean: f64) -> f64 {
        let pool: Vec<DocId> = match &self.neighbors {
            Some(oracle) => oracle.neighbors(doc_id),
            None => self.corpus.documents().ids().collect(),
        };
        let (num, den) = pool
            .iter()
            .filter_map(|n| ratings.get(n).map(|&r| (*n, r)))
            .fold((0.0, 0.0), |(num, den), (n, r)| {
                let sim = self.similarity(doc_id, n);
                (num + sim * (r + baseline(ratings, n, mean)), den + sim)
            });
        if den == 0.0 {
            return 0.0;
        }
        baseline(ratings, doc_id, mean) + num / den
    }

    /// The `k` unrated documents with the lowest predicted rating, lowest first.
    /// Empty when nothing has been rated yet.
    pub fn recommend(&self, k: usize) -> Vec<DocId> {
        let ratings = self.ratings.read();
        let Some(m) = mean(&ratings) else {
            return Vec::new();
        };
        let mut scored: Vec<(DocId, f64)> = self
            .corpus
            .documents()
            .documents()
            .par_iter()
            .filter(|d| !ratings.contains_key(&d.id))
            .map(|d| (d.id, self.expected(&ratings, d.id, m)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        tracing::debug!(k, returned = scored.len(), "computed recommendations");
        scored.into_iter().map(|(id, _)| id).collect()
    }

    pub fn recommend_documents(&self, k: usize) -> Vec<&Document> {
        self.recommend(k).into_iter().filter_map(|id| self.corpus.document(id)).collect()
    }

    /// Record one rating. The store has the update when this returns `Ok`;
    /// on a store failure the in-memory map is left unchanged.
    pub fn add_rating(&self, doc_id: DocId, rating: f64) -> Result<()> {
        self.add_ratings([(doc_id, rating)])
    }

    pub fn add_ratings<I>(&self, ratings: I) -> Result<()>
    where
        I: IntoIterator<Item = (DocId, f64)>,
    {
        let mut guard = self.ratings.write();
        let before = guard.clone();
        guard.extend(ratings);
        if let Err(e) = self.store.save_ratings(&self.namespace, &guard) {
            *guard = before;
            return Err(e);
        }
        tracing::info!(namespace = %self.namespace, count = guard.len(), "persisted ratings");
        Ok(())
    }
}

fn mean(ratings: &Ratings) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    Some(ratings.values().sum::<f64>() / ratings.len() as f64)
}

/// Unrated documents count as rated 0.
fn deviation(ratings: &Ratings, doc_id: DocId, mean: f64) -> f64 {
    ratings.get(&doc_id).copied().unwrap_or(0.0) - mean
}

fn baseline(ratings: &Ratings, doc_id: DocId, mean: f64) -> f64 {
    mean + deviation(ratings, doc_id, mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ratings::MemoryRatingStore;

    fn doc(id: DocId, text: &str) -> Document {
        Document::new(id, format!("doc{id}"), text.split_whitespace().map(str::to_string).collect())
    }

    fn recommender() -> Recommender {
        let corpus = Corpus::build(vec![
            doc(1, "cat dog"),
            doc(2, "cat"),
            doc(3, "fish"),
            doc(4, "cat dog fish"),
        ])
        .unwrap();
        Recommender::new(Arc::new(corpus), Arc::new(MemoryRatingStore::new()), "test").unwrap()
    }

    #[test]
    fn jaccard_similarity() {
        let rec = recommender();
        assert_eq!(rec.similarity(1, 2), 0.5);
        assert_eq!(rec.similarity(1, 3), 0.0);
        assert_eq!(rec.similarity(1, 1), 1.0);
        assert!((rec.similarity(1, 4) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(rec.similarity(1, 99), 0.0);
    }

    #[test]
    fn statistics_need_ratings() {
        let rec = recommender();
        assert!(rec.mean_rating().is_none());
        assert!(rec.expected_rating(1).is_none());
        assert!(rec.recommend(5).is_empty());
    }

    #[test]
    fn baseline_and_deviation() {
        let rec = recommender();
        rec.add_ratings([(1, 1.0), (3, 0.0)]).unwrap();
        assert_eq!(rec.mean_rating(), Some(0.5));
        assert_eq!(rec.deviation(1), Some(0.5));
        assert_eq!(rec.deviation(2), Some(-0.5));
        assert_eq!(rec.baseline(1), Some(1.0));
        assert_eq!(rec.baseline(2), Some(0.0));
    }

    #[test]
    fn expected_rating_weights_by_similarity() {
        let rec = recommender();
        rec.add_ratings([(1, 1.0), (3, 0.0)]).unwrap();
        // doc 2 only resembles doc 1: 0 + 0.5 * (1 + 1) / 0.5
        assert_eq!(rec.expected_rating(2), Some(2.0));
        // doc 4: sims 2/3 (doc 1) and 1/3 (doc 3)
        let expected = (2.0 / 3.0 * 2.0) / (2.0 / 3.0 + 1.0 / 3.0);
        assert!((rec.expected_rating(4).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn no_similar_rated_documents_predicts_zero() {
        let rec = recommender();
        rec.add_rating(3, 1.0).unwrap();
        assert_eq!(rec.expected_rating(2), Some(0.0));
    }

    #[test]
    fn recommend_lowest_predictions_first() {
        let rec = recommender();
        rec.add_rating(1, 1.0).unwrap();
        // predictions: doc 2 -> 2.0, doc 3 -> 0.0 (no overlap), doc 4 -> 2.0
        assert_eq!(rec.recommend(5), vec![3, 2, 4]);
        assert_eq!(rec.recommend(1), vec![3]);
        assert_eq!(rec.recommend_documents(1)[0].id, 3);
    }

    struct FixedNeighbors(Vec<DocId>);

    impl NeighborOracle for FixedNeighbors {
        fn neighbors(&self, _doc_id: DocId) -> Vec<DocId> {
            self.0.clone()
        }
    }

    #[test]
    fn neighbor_oracle_limits_candidates() {
        let rec = recommender().with_neighbors(Arc::new(FixedNeighbors(vec![3])));
        rec.add_ratings([(1, 1.0), (3, 1.0)]).unwrap();
        // doc 1 is rated and similar but outside the neighborhood
        assert_eq!(rec.expected_rating(2), Some(0.0));
    }

    struct FailingStore;

    impl RatingStore for FailingStore {
        fn load_ratings(&self, _namespace: &str) -> Result<Ratings> {
            Ok(Ratings::new())
        }

        fn save_ratings(&self, _namespace: &str, _ratings: &Ratings) -> Result<()> {
            Err(Error::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn failed_save_leaves_ratings_unchanged() {
        let corpus = Arc::new(Corpus::build(vec![doc(1, "cat")]).unwrap());
        let rec = Recommender::new(corpus, Arc::new(FailingStore), "test").unwrap();
        assert!(rec.add_rating(1, 1.0).is_err());
        assert!(rec.is_empty());
    }
}
