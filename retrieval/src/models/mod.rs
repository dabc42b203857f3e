//! Ranking models sharing the corpus statistics layer.
//!
//! Each model turns a free-text query into a relevance-ordered list of
//! `(doc_id, score)` pairs. [`Model`] is the closed set of models, picked by
//! [`ModelKind`] when the model is constructed.

mod boolean;
mod extended_boolean;
mod vector;

pub use boolean::BooleanModel;
pub use extended_boolean::ExtendedBooleanModel;
pub use vector::{VectorModel, VectorParams};

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::index::{DocId, Document};
use crate::recommend::Recommender;
use crate::tokenizer::Analyzer;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// `(doc_id, score)` pairs, best first.
pub type Ranking = Vec<(DocId, f64)>;

pub trait RankingModel: Send + Sync {
    fn name(&self) -> &'static str;

    fn corpus(&self) -> &Corpus;

    /// Score every document against `query`. Free of side effects.
    fn ranking_function(&self, query: &str) -> Result<Ranking>;

    /// Documents matching `query`, best first.
    fn query(&self, query: &str) -> Result<Vec<&Document>> {
        let ranking = self.ranking_function(query)?;
        Ok(self.documents_for(&ranking))
    }

    fn documents_for(&self, ranking: &[(DocId, f64)]) -> Vec<&Document> {
        ranking.iter().filter_map(|(id, _)| self.corpus().document(*id)).collect()
    }
}

/// Order by descending score, ties by ascending document id.
pub(crate) fn sort_ranking(ranking: &mut Ranking) {
    ranking.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelKind {
    Boolean,
    #[default]
    ExtendedBoolean,
    Vector,
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "boolean" => Ok(ModelKind::Boolean),
            "extended" | "extended-boolean" | "extended_boolean" => Ok(ModelKind::ExtendedBoolean),
            "vector" => Ok(ModelKind::Vector),
            _ => Err(Error::UnknownModel(s.to_string())),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelKind::Boolean => "boolean",
            ModelKind::ExtendedBoolean => "extended-boolean",
            ModelKind::Vector => "vector",
        })
    }
}

pub enum Model {
    Boolean(BooleanModel),
    ExtendedBoolean(ExtendedBooleanModel),
    Vector(VectorModel),
}

impl Model {
    pub fn new(kind: ModelKind, corpus: Arc<Corpus>, analyzer: Analyzer) -> Self {
        match kind {
            ModelKind::Boolean => Model::Boolean(BooleanModel::new(corpus, analyzer)),
            ModelKind::ExtendedBoolean => Model::ExtendedBoolean(ExtendedBooleanModel::new(corpus, analyzer)),
            ModelKind::Vector => Model::Vector(VectorModel::new(corpus, analyzer)),
        }
    }

    /// Attach the recommender fed by implicit feedback. Only the extended boolean
    /// model records feedback; the others ignore it.
    pub fn with_recommender(self, recommender: Arc<Recommender>) -> Self {
        match self {
            Model::ExtendedBoolean(m) => Model::ExtendedBoolean(m.with_recommender(recommender)),
            other => other,
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Boolean(_) => ModelKind::Boolean,
            Model::ExtendedBoolean(_) => ModelKind::ExtendedBoolean,
            Model::Vector(_) => ModelKind::Vector,
        }
    }

    pub fn recommender(&self) -> Option<&Arc<Recommender>> {
        match self {
            Model::ExtendedBoolean(m) => m.recommender(),
            _ => None,
        }
    }

    /// Up to `k` documents from the attached recommender; empty without one or
    /// before anything has been rated.
    pub fn recommendations(&self, k: usize) -> Vec<&Document> {
        self.recommender().map_or_else(Vec::new, |r| r.recommend_documents(k))
    }

    fn inner(&self) -> &dyn RankingModel {
        match self {
            Model::Boolean(m) => m as &dyn RankingModel,
            Model::ExtendedBoolean(m) => m,
            Model::Vector(m) => m,
        }
    }
}

impl RankingModel for Model {
    fn name(&self) -> &'static str { self.inner().name() }

    fn corpus(&self) -> &Corpus { self.inner().corpus() }

    fn ranking_function(&self, query: &str) -> Result<Ranking> {
        self.inner().ranking_function(query)
    }

    fn query(&self, query: &str) -> Result<Vec<&Document>> {
        self.inner().query(query)
    }
}
