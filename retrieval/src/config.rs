//! Tuning constants for the ranking models and stores.
//!
//! Runtime knobs live on the structs that use them (`Analyzer`, `VectorParams`);
//! these are their defaults.

/// Smoothing constant `a` of the vector model query weight `(a + (1 - a) * tf) * idf`.
pub const VECTOR_QUERY_SMOOTHING: f64 = 0.4;

/// Vector model results must score strictly above this cosine similarity.
pub const VECTOR_RELEVANCE_THRESHOLD: f64 = 0.3;

/// Number of documents returned by a recommendation request when none is given.
pub const DEFAULT_RECOMMENDATIONS: usize = 5;

/// Upper bound on the number of conjunctions produced when expanding a query into DNF.
///
/// Distribution of AND over OR is exponential in the worst case; queries beyond this
/// are rejected instead of expanded.
pub const MAX_DNF_CLAUSES: usize = 4096;

/// Version stamped into `meta.json` of an on-disk index.
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Rating namespace used when the caller does not name one.
pub const DEFAULT_RATINGS_NAMESPACE: &str = "default";
