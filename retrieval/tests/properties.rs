use retrieval::{
    Analyzer, Corpus, Dnf, Document, DocumentSource, ExtendedBooleanModel, FileIndexStore, IndexStore,
    MemoryIndexStore, Model, ModelKind, QueryCompiler, RankingModel, VectorModel,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::tempdir;

const TEXTS: &[&str] = &[
    "the cat sat on the mat with another cat",
    "dogs chase cats around the garden",
    "a fish swims in the garden pond",
    "birds and cats rarely get along",
    "",
    "the dog sleeps while the cat watches the fish",
];

const QUERIES: &[&str] = &[
    "cat",
    "cat dog",
    "cat or fish",
    "cat and not dog",
    "not (cat or garden) or fish",
    "(cat or dog) and (garden or pond)",
    "cat or (cat and mat)",
    "not not fish and (birds or not pond)",
    "garden and not garden",
    "cat or not cat",
    "(a1 or b1) and (c1 or not a1) and not (b1 and c1)",
    "",
];

fn docs() -> Vec<Document> {
    let analyzer = Analyzer::default();
    TEXTS
        .iter()
        .enumerate()
        .map(|(i, text)| Document::new(i as u32 + 1, format!("doc{}", i + 1), analyzer.analyze(text)))
        .collect()
}

fn corpus() -> Arc<Corpus> {
    Arc::new(Corpus::build(docs()).unwrap())
}

#[test]
fn indexing_is_idempotent() {
    let a = Corpus::build(docs()).unwrap();
    let b = Corpus::build(docs()).unwrap();
    assert_eq!(a.snapshot(), b.snapshot());
    assert_eq!(a.index().dfs(), b.index().dfs());
}

#[test]
fn term_vectors_sum_to_document_length() {
    let corpus = corpus();
    for (doc, vector) in corpus.documents().iter() {
        assert_eq!(vector.values().sum::<u32>() as usize, doc.tokens.len());
    }
}

#[test]
fn tf_is_bounded() {
    let corpus = corpus();
    for tid in 0..corpus.index().len() as u32 {
        for id in corpus.documents().ids() {
            let tf = corpus.tf(tid, id);
            assert!((0.0..=1.0).contains(&tf));
            if corpus.document(id).unwrap().tokens.is_empty() {
                assert_eq!(tf, 0.0);
            }
        }
    }
}

#[test]
fn idf_decreases_with_document_frequency() {
    let corpus = corpus();
    let n = corpus.index().len() as u32;
    for t1 in 0..n {
        for t2 in 0..n {
            let (df1, df2) = (corpus.index().document_frequency(t1), corpus.index().document_frequency(t2));
            if df1 < df2 {
                assert!(corpus.idf(t1) >= corpus.idf(t2));
            }
        }
        assert!(corpus.idf(t1) <= corpus.max_idf());
    }
}

#[test]
fn dnf_is_equivalent_to_parsed_expression() {
    let compiler = QueryCompiler::default();
    for q in QUERIES {
        let dnf = compiler.compile(q).unwrap();
        let Some(expr) = compiler.parse(q).unwrap() else {
            assert_eq!(dnf, Dnf::Empty);
            continue;
        };
        let tokens: Vec<&str> = expr.tokens().into_iter().collect();
        assert!(dnf.tokens().iter().all(|t| tokens.contains(t)), "{q}");
        for mask in 0u32..1 << tokens.len() {
            let assignment = |t: &str| tokens.iter().position(|&x| x == t).map_or(false, |i| mask & (1 << i) != 0);
            assert_eq!(dnf.evaluate(&assignment), expr.evaluate(&assignment), "{q} under {mask:b}");
        }
    }
}

#[test]
fn empty_query_matches_nothing() {
    let corpus = corpus();
    for kind in [ModelKind::Boolean, ModelKind::ExtendedBoolean, ModelKind::Vector] {
        let model = Model::new(kind, corpus.clone(), Analyzer::default());
        assert!(model.ranking_function("").unwrap().is_empty(), "{kind}");
        assert!(model.ranking_function("   ").unwrap().is_empty(), "{kind}");
    }
}

#[test]
fn extended_boolean_scores_are_bounded() {
    let corpus = corpus();
    let model = ExtendedBooleanModel::new(corpus.clone(), Analyzer::default());
    let compiler = QueryCompiler::default();
    for q in QUERIES {
        let dnf = compiler.compile(q).unwrap();
        for id in corpus.documents().ids() {
            let score = model.dnf_weight(&dnf, id);
            assert!((0.0..=1.0).contains(&score), "{q} on {id}: {score}");
        }
    }
}

#[test]
fn extended_boolean_full_match_scores_one() {
    let docs = vec![
        Document::new(1, "a", vec!["cat".into(), "dog".into()]),
        Document::new(2, "b", vec!["fish".into()]),
        Document::new(3, "c", vec!["bird".into()]),
    ];
    let model = ExtendedBooleanModel::new(Arc::new(Corpus::build(docs).unwrap()), Analyzer::default());
    let ranking = model.ranking_function("cat and dog").unwrap();
    assert_eq!(ranking[0], (1, 1.0));
    let ranking = model.ranking_function("cat and not fish").unwrap();
    assert_eq!(ranking[0], (1, 1.0));
}

#[test]
fn cosine_similarity_is_bounded() {
    let corpus = corpus();
    let model = VectorModel::new(corpus.clone(), Analyzer::default());
    for q in ["cat", "cat cat dog", "garden pond fish", "zebra", "birds cats"] {
        let weights = model.query_weights(&model.query_vector(q));
        for (doc, vector) in corpus.documents().iter() {
            let sim = model.similarity(doc.id, &weights);
            assert!((0.0..=1.0).contains(&sim), "{q} on {}: {sim}", doc.id);
            if weights.iter().all(|(tid, _)| !vector.contains_key(tid)) {
                assert_eq!(sim, 0.0);
            }
        }
    }
}

#[test]
fn open_builds_then_loads() {
    let store = MemoryIndexStore::new();
    assert!(store.load().unwrap().is_none());
    let built = Corpus::open(&store, &docs()).unwrap();
    assert!(store.load().unwrap().is_some());

    struct Unreachable;
    impl DocumentSource for Unreachable {
        fn documents(&self) -> retrieval::Result<Vec<Document>> {
            panic!("index should come from the store")
        }
    }
    let loaded = Corpus::open(&store, &Unreachable).unwrap();
    assert_eq!(loaded.snapshot(), built.snapshot());
}

#[test]
fn open_with_file_store() {
    let dir = tempdir().unwrap();
    let store = FileIndexStore::new(dir.path().join("index"));
    let built = Corpus::open(&store, &docs()).unwrap();
    let loaded = Corpus::open(&store, &Vec::<Document>::new()).unwrap();
    assert_eq!(loaded.num_docs(), TEXTS.len());
    assert_eq!(loaded.max_idf(), built.max_idf());
    let found: BTreeSet<u32> = Model::new(ModelKind::Boolean, Arc::new(loaded), Analyzer::default())
        .ranking_function("cats and garden")
        .unwrap()
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(found, BTreeSet::from([2]));
}
