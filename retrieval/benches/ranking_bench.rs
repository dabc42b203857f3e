use criterion::{criterion_group, criterion_main, Criterion};
use retrieval::{Analyzer, Corpus, Document, Model, ModelKind, RankingModel};
use std::sync::Arc;

const VOCAB: &[&str] = &[
    "wing", "flow", "pressure", "boundary", "layer", "shock", "wave", "heat", "transfer", "mach",
    "number", "supersonic", "laminar", "turbulent", "plate", "cylinder", "drag", "lift", "jet", "nozzle",
];

fn synthetic_corpus(n: u32) -> Corpus {
    let mut state: u64 = 0x2545_f491;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };
    let docs = (0..n)
        .map(|id| {
            let len = 20 + next() % 80;
            let tokens = (0..len).map(|_| VOCAB[next() % VOCAB.len()].to_string()).collect();
            Document::new(id, format!("doc{id}"), tokens)
        })
        .collect();
    Corpus::build(docs).expect("unique ids")
}

fn bench_models(c: &mut Criterion) {
    let corpus = Arc::new(synthetic_corpus(2_000));
    for kind in [ModelKind::Boolean, ModelKind::ExtendedBoolean, ModelKind::Vector] {
        let model = Model::new(kind, corpus.clone(), Analyzer::default());
        c.bench_function(&format!("{kind}_query"), |b| {
            b.iter(|| model.ranking_function("(shock or wave) and boundary layer not laminar"))
        });
    }
}

fn bench_build(c: &mut Criterion) {
    c.bench_function("build_corpus_2000", |b| b.iter(|| synthetic_corpus(2_000)));
}

criterion_group!(benches, bench_models, bench_build);
criterion_main!(benches);
