use super::{sort_ranking, Ranking, RankingModel};
use crate::config::{VECTOR_QUERY_SMOOTHING, VECTOR_RELEVANCE_THRESHOLD};
use crate::corpus::Corpus;
use crate::error::Result;
use crate::index::{DocId, TermId, TermVector};
use crate::tokenizer::Analyzer;
use rayon::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorParams {
    /// `a` in the query weight `(a + (1 - a) * tf) * idf`.
    pub smoothing: f64,
    /// Results must score strictly above this similarity.
    pub threshold: f64,
}

impl Default for VectorParams {
    fn default() -> Self {
        Self { smoothing: VECTOR_QUERY_SMOOTHING, threshold: VECTOR_RELEVANCE_THRESHOLD }
    }
}

/// TF-IDF vector space model ranked by cosine similarity over the query's terms.
pub struct VectorModel {
    corpus: Arc<Corpus>,
    analyzer: Analyzer,
    params: VectorParams,
}

impl VectorModel {
    pub fn new(corpus: Arc<Corpus>, analyzer: Analyzer) -> Self {
        Self { corpus, analyzer, params: VectorParams::default() }
    }

    pub fn with_params(mut self, params: VectorParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> VectorParams { self.params }

    /// Bag-of-words of a query against the corpus dictionary; unknown words are dropped.
    pub fn query_vector(&self, query: &str) -> TermVector {
        self.corpus.index().doc2bow(&self.analyzer.analyze(query))
    }

    /// Smoothed query weights, one per query term.
    pub fn query_weights(&self, query: &TermVector) -> Vec<(TermId, f64)> {
        let max_freq = query.values().copied().max().unwrap_or(0);
        if max_freq == 0 {
            return Vec::new();
        }
        let a = self.params.smoothing;
        query
            .iter()
            .map(|(&tid, &freq)| {
                let tf = freq as f64 / max_freq as f64;
                (tid, (a + (1.0 - a) * tf) * self.corpus.idf(tid))
            })
            .collect()
    }

    /// Cosine similarity between a document and weighted query terms, in `[0, 1]`.
    /// 0 when either side has no weight.
    pub fn similarity(&self, doc_id: DocId, query_weights: &[(TermId, f64)]) -> f64 {
        let (mut dot, mut doc_norm, mut query_norm) = (0.0, 0.0, 0.0);
        for &(tid, wq) in query_weights {
            let wd = self.corpus.tf(tid, doc_id) * self.corpus.idf(tid);
            dot += wd * wq;
            doc_norm += wd * wd;
            query_norm += wq * wq;
        }
        if doc_norm == 0.0 || query_norm == 0.0 {
            return 0.0;
        }
        (dot / (doc_norm.sqrt() * query_norm.sqrt())).min(1.0)
    }

    pub fn rank_vector(&self, query: &TermVector) -> Ranking {
        let weights = self.query_weights(query);
        if weights.is_empty() {
            return Vec::new();
        }
        let threshold = self.params.threshold;
        let mut ranking: Ranking = self
            .corpus
            .documents()
            .documents()
            .par_iter()
            .map(|doc| (doc.id, self.similarity(doc.id, &weights)))
            .filter(|&(_, score)| score > threshold)
            .collect();
        sort_ranking(&mut ranking);
        ranking
    }
}

impl RankingModel for VectorModel {
    fn name(&self) -> &'static str { "vector" }

    fn corpus(&self) -> &Corpus { &self.corpus }

    fn ranking_function(&self, query: &str) -> Result<Ranking> {
        let ranking = self.rank_vector(&self.query_vector(query));
        tracing::debug!(model = self.name(), hits = ranking.len(), "ranked query");
        Ok(ranking)
    }
}
