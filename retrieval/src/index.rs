use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type TermId = u32;
pub type DocId = u32;

/// Bag-of-words of one document: term id -> occurrence count.
pub type TermVector = BTreeMap<TermId, u32>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// External id, unique within a corpus.
    pub id: DocId,
    pub title: String,
    /// Normalized tokens, in order of appearance.
    pub tokens: Vec<String>,
}

impl Document {
    pub fn new(id: DocId, title: impl Into<String>, tokens: Vec<String>) -> Self {
        Self { id, title: title.into(), tokens }
    }
}

/// Token dictionary and document-frequency table of a corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermIndex {
    dictionary: HashMap<String, TermId>,
    terms: Vec<String>,
    df: Vec<u32>,
}

impl TermIndex {
    pub fn new() -> Self { Self::default() }

    /// Assign ids to the tokens of one document, in order of first occurrence, and
    /// count the document once for every distinct token it contains.
    pub fn add_document(&mut self, tokens: &[String]) -> TermVector {
        let mut vector = TermVector::new();
        for token in tokens {
            let tid = match self.dictionary.get(token) {
                Some(&tid) => tid,
                None => {
                    let tid = self.terms.len() as TermId;
                    self.dictionary.insert(token.clone(), tid);
                    self.terms.push(token.clone());
                    self.df.push(0);
                    tid
                }
            };
            *vector.entry(tid).or_insert(0) += 1;
        }
        for tid in vector.keys() {
            self.df[*tid as usize] += 1;
        }
        vector
    }

    /// Bag-of-words of a token sequence against this dictionary. Unknown tokens are dropped.
    pub fn doc2bow<S: AsRef<str>>(&self, tokens: &[S]) -> TermVector {
        let mut vector = TermVector::new();
        for token in tokens {
            if let Some(tid) = self.token_to_id(token.as_ref()) {
                *vector.entry(tid).or_insert(0) += 1;
            }
        }
        vector
    }

    pub fn token_to_id(&self, token: &str) -> Option<TermId> {
        self.dictionary.get(token).copied()
    }

    pub fn id_to_token(&self, tid: TermId) -> Option<&str> {
        self.terms.get(tid as usize).map(String::as_str)
    }

    /// Number of documents containing the term; 0 for unknown ids.
    pub fn document_frequency(&self, tid: TermId) -> u32 {
        self.df.get(tid as usize).copied().unwrap_or(0)
    }

    pub fn dfs(&self) -> &[u32] { &self.df }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
}
