use super::{sort_ranking, Ranking, RankingModel};
use crate::corpus::Corpus;
use crate::error::Result;
use crate::index::{DocId, Document};
use crate::query::{Conjunction, Dnf, Literal, QueryCompiler};
use crate::recommend::Recommender;
use crate::tokenizer::Analyzer;
use rayon::prelude::*;
use std::sync::Arc;

/// Extended boolean (p-norm, p = 2) model.
///
/// Term weights are `tf * idf / max_idf`, both factors in `[0, 1]`. A conjunction
/// scores `1 - sqrt(sum((1 - w_i)^2) / n)` and a disjunction `sqrt(sum(W_j^2) / m)`,
/// so partial matches rank between non-matches and full matches.
///
/// Negation is crisp: a negated literal weighs 1 when the term has zero weight in the
/// document and 0 otherwise.
pub struct ExtendedBooleanModel {
    corpus: Arc<Corpus>,
    compiler: QueryCompiler,
    recommender: Option<Arc<Recommender>>,
}

impl ExtendedBooleanModel {
    pub fn new(corpus: Arc<Corpus>, analyzer: Analyzer) -> Self {
        Self { corpus, compiler: QueryCompiler::new(analyzer), recommender: None }
    }

    pub fn with_compiler(corpus: Arc<Corpus>, compiler: QueryCompiler) -> Self {
        Self { corpus, compiler, recommender: None }
    }

    /// Feed the top result of every [`RankingModel::query`] to `recommender` as a rating of 1.
    pub fn with_recommender(mut self, recommender: Arc<Recommender>) -> Self {
        self.recommender = Some(recommender);
        self
    }

    pub fn recommender(&self) -> Option<&Arc<Recommender>> { self.recommender.as_ref() }

    /// Weight of a token in a document, 0 for tokens missing from the index.
    pub fn term_weight(&self, token: &str, doc_id: DocId) -> f64 {
        self.corpus
            .token_to_id(token)
            .map_or(0.0, |tid| self.corpus.tf(tid, doc_id) * self.corpus.normalized_idf(tid))
    }

    pub fn literal_weight(&self, literal: &Literal, doc_id: DocId) -> f64 {
        let w = self.term_weight(&literal.token, doc_id);
        if !literal.negated {
            w
        } else if w == 0.0 {
            1.0
        } else {
            0.0
        }
    }

    pub fn conjunction_weight(&self, conjunction: &Conjunction, doc_id: DocId) -> f64 {
        match conjunction.literals.as_slice() {
            [] => 0.0,
            [only] => self.literal_weight(only, doc_id),
            literals => {
                let distance: f64 = literals.iter().map(|l| (1.0 - self.literal_weight(l, doc_id)).powi(2)).sum();
                1.0 - (distance / literals.len() as f64).sqrt()
            }
        }
    }

    pub fn dnf_weight(&self, dnf: &Dnf, doc_id: DocId) -> f64 {
        match dnf {
            Dnf::Empty | Dnf::Never => 0.0,
            Dnf::Always => 1.0,
            Dnf::Clauses(clauses) => match clauses.as_slice() {
                [] => 0.0,
                [only] => self.conjunction_weight(only, doc_id),
                clauses => {
                    let sum: f64 = clauses.iter().map(|c| self.conjunction_weight(c, doc_id).powi(2)).sum();
                    (sum / clauses.len() as f64).sqrt()
                }
            },
        }
    }

    /// Rank against an already compiled query; documents scoring 0 are left out.
    pub fn rank_dnf(&self, dnf: &Dnf) -> Ranking {
        let mut ranking: Ranking = self
            .corpus
            .documents()
            .documents()
            .par_iter()
            .map(|doc| (doc.id, self.dnf_weight(dnf, doc.id)))
            .filter(|&(_, score)| score > 0.0)
            .collect();
        sort_ranking(&mut ranking);
        ranking
    }

    /// Record the best document of `ranking` as relevant (rating 1).
    pub fn record_feedback(&self, ranking: &[(DocId, f64)]) -> Result<()> {
        match (&self.recommender, ranking.first()) {
            (Some(recommender), Some(&(top, _))) => recommender.add_rating(top, 1.0),
            _ => Ok(()),
        }
    }

    /// Record the first `n` documents of `ranking` as relevant (rating 1).
    pub fn pseudo_feedback(&self, ranking: &[(DocId, f64)], n: usize) -> Result<()> {
        match &self.recommender {
            Some(recommender) => recommender.add_ratings(ranking.iter().take(n).map(|&(id, _)| (id, 1.0))),
            None => Ok(()),
        }
    }
}

impl RankingModel for ExtendedBooleanModel {
    fn name(&self) -> &'static str { "extended-boolean" }

    fn corpus(&self) -> &Corpus { &self.corpus }

    fn ranking_function(&self, query: &str) -> Result<Ranking> {
        let dnf = self.compiler.compile(query)?;
        let ranking = self.rank_dnf(&dnf);
        tracing::debug!(model = self.name(), hits = ranking.len(), "ranked query");
        Ok(ranking)
    }

    /// Ranks like `ranking_function`, then records the best document as implicit
    /// feedback in the attached recommender.
    fn query(&self, query: &str) -> Result<Vec<&Document>> {
        let ranking = self.ranking_function(query)?;
        self.record_feedback(&ranking)?;
        Ok(self.documents_for(&ranking))
    }
}
