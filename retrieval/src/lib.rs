//! Retrieval and ranking core.
//!
//! Builds term statistics over a corpus of tokenized documents, compiles boolean
//! queries into disjunctive normal form and ranks documents with a boolean, an
//! extended boolean or a vector space model. A recommender folds explicit and
//! implicit relevance feedback into predictions for unseen documents.
//!
//! ```
//! use retrieval::{Analyzer, Corpus, Document, Model, ModelKind, RankingModel};
//! use std::sync::Arc;
//!
//! let analyzer = Analyzer::default();
//! let docs = vec![
//!     Document::new(1, "first", analyzer.analyze("cat dog")),
//!     Document::new(2, "second", analyzer.analyze("cat")),
//! ];
//! let corpus = Arc::new(Corpus::build(docs).unwrap());
//! let model = Model::new(ModelKind::Boolean, corpus, analyzer);
//! let hits = model.query("cat and dog").unwrap();
//! assert_eq!(hits[0].id, 1);
//! ```

pub mod config;
pub mod corpus;
pub mod documents;
pub mod error;
pub mod index;
pub mod models;
pub mod persist;
pub mod query;
pub mod ratings;
pub mod recommend;
pub mod tokenizer;

pub use corpus::{Corpus, DocumentSource};
pub use documents::DocumentStore;
pub use error::{Error, Result};
pub use index::{DocId, Document, TermId, TermIndex, TermVector};
pub use models::{
    BooleanModel, ExtendedBooleanModel, Model, ModelKind, Ranking, RankingModel, VectorModel, VectorParams,
};
pub use persist::{FileIndexStore, IndexSnapshot, IndexStore, MemoryIndexStore};
pub use query::{Conjunction, Dnf, Expr, Literal, QueryCompiler};
pub use ratings::{MemoryRatingStore, RatingStore, Ratings, SledRatingStore};
pub use recommend::{NeighborOracle, Recommender};
pub use tokenizer::Analyzer;
