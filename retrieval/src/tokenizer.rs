use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        // Contractions are split on the apostrophe by RE, so their fragments are listed too.
        let words: &[&str] = &[
            "a","about","above","after","again","against","ain","all","am","an","and","any","are","aren","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","couldn","d","did","didn","do","does","doesn","doing","don","down","during",
            "each","few","for","from","further",
            "had","hadn","has","hasn","have","haven","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","isn","it","its","itself","just",
            "ll","m","ma","me","mightn","more","most","mustn","my","myself",
            "needn","no","nor","not","now","o","of","off","on","once","only","or","other","our","ours","ourselves","out","over","own",
            "re","s","same","shan","she","should","shouldn","so","some","such",
            "t","than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","ve","very",
            "was","wasn","we","were","weren","what","when","where","which","while","who","whom","why","will","with","won","wouldn",
            "y","you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// NFKC normalization followed by lowercasing.
pub fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

/// Split text into lowercase word units: NFKC normalization, then runs of letters and digits.
/// Everything else (punctuation, symbols, whitespace) acts as a separator.
pub fn words(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    RE.find_iter(&normalized).map(|m| m.as_str().to_string()).collect()
}

/// Text normalization shared by ingestion and query processing.
///
/// Both sides of a search must agree on the same analyzer, otherwise stemmed
/// document tokens never meet unstemmed query tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analyzer {
    pub stemming: bool,
    pub remove_stopwords: bool,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self { stemming: false, remove_stopwords: true }
    }
}

impl Analyzer {
    pub fn new(stemming: bool) -> Self {
        Self { stemming, ..Self::default() }
    }

    /// Tokenize text into normalized tokens: lowercase, punctuation stripped,
    /// stopwords removed and stemmed according to the configuration.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        words(text)
            .into_iter()
            .filter(|w| !self.filters(w))
            .map(|w| self.stem(&w))
            .collect()
    }

    pub fn stem(&self, token: &str) -> String {
        if self.stemming { STEMMER.stem(token).to_string() } else { token.to_string() }
    }

    pub fn filters(&self, token: &str) -> bool {
        self.remove_stopwords && is_stopword(token)
    }
}
