use super::{sort_ranking, Ranking, RankingModel};
use crate::corpus::Corpus;
use crate::error::Result;
use crate::query::{Dnf, QueryCompiler};
use crate::tokenizer::Analyzer;
use rayon::prelude::*;
use std::sync::Arc;

/// Exact boolean matching: a document either satisfies the query (score 1) or is left out.
pub struct BooleanModel {
    corpus: Arc<Corpus>,
    compiler: QueryCompiler,
}

impl BooleanModel {
    pub fn new(corpus: Arc<Corpus>, analyzer: Analyzer) -> Self {
        Self { corpus, compiler: QueryCompiler::new(analyzer) }
    }

    pub fn with_compiler(corpus: Arc<Corpus>, compiler: QueryCompiler) -> Self {
        Self { corpus, compiler }
    }

    /// Rank against an already compiled query.
    pub fn rank_dnf(&self, dnf: &Dnf) -> Ranking {
        if matches!(dnf, Dnf::Empty | Dnf::Never) {
            return Vec::new();
        }
        let index = self.corpus.index();
        let documents = self.corpus.documents();
        let mut ranking: Ranking = documents
            .documents()
            .par_iter()
            .zip(documents.vectors().par_iter())
            .filter(|(_, vector)| {
                let present = |token: &str| index.token_to_id(token).map_or(false, |tid| vector.contains_key(&tid));
                dnf.evaluate(&present)
            })
            .map(|(doc, _)| (doc.id, 1.0))
            .collect();
        sort_ranking(&mut ranking);
        ranking
    }
}

impl RankingModel for BooleanModel {
    fn name(&self) -> &'static str { "boolean" }

    fn corpus(&self) -> &Corpus { &self.corpus }

    fn ranking_function(&self, query: &str) -> Result<Ranking> {
        let dnf = self.compiler.compile(query)?;
        let ranking = self.rank_dnf(&dnf);
        tracing::debug!(model = self.name(), hits = ranking.len(), "ranked query");
        Ok(ranking)
    }
}
