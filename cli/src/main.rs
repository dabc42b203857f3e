use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use retrieval::config::{DEFAULT_RATINGS_NAMESPACE, DEFAULT_RECOMMENDATIONS};
use retrieval::{
    Analyzer, Corpus, DocId, Document, DocumentSource, FileIndexStore, IndexStore, Model, ModelKind, RankingModel,
    Recommender, SledRatingStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

mod ingest;

use ingest::JsonSource;

#[derive(Parser)]
#[command(name = "retrieval-cli")]
#[command(about = "Index documents, run ranked queries and collect relevance feedback", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IndexArgs {
    /// Index directory
    #[arg(long, default_value = "./index")]
    index: PathBuf,
    /// Stem tokens; must match the setting the index was built with
    #[arg(long, default_value_t = false)]
    stemming: bool,
}

impl IndexArgs {
    fn analyzer(&self) -> Analyzer { Analyzer::new(self.stemming) }
}

/// An index to open, built from `--input` first when it does not exist yet.
#[derive(Args)]
struct SourceArgs {
    #[command(flatten)]
    index: IndexArgs,
    /// Input JSON/JSONL file or directory, used when the index does not exist yet
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(Args)]
struct RatingArgs {
    /// Ratings database path
    #[arg(long, default_value = "./ratings.db")]
    ratings: PathBuf,
    #[arg(long, default_value = DEFAULT_RATINGS_NAMESPACE)]
    namespace: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or rebuild) the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        index: IndexArgs,
    },
    /// Rank documents against a query
    Query {
        query: String,
        /// boolean, extended-boolean or vector
        #[arg(long, default_value_t = ModelKind::default())]
        model: ModelKind,
        /// Maximum number of results to print
        #[arg(short, default_value_t = 10)]
        k: usize,
        /// Also rate the top N results as relevant (extended boolean only)
        #[arg(long)]
        pseudo_feedback: Option<usize>,
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        ratings: RatingArgs,
    },
    /// Record an explicit rating for a document
    Rate {
        doc_id: DocId,
        rating: f64,
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        ratings: RatingArgs,
    },
    /// Print recommended documents based on recorded ratings
    Recommend {
        #[arg(short, default_value_t = DEFAULT_RECOMMENDATIONS)]
        k: usize,
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        ratings: RatingArgs,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, index } => build_index(input, &index),
        Commands::Query { query, model, k, pseudo_feedback, source, ratings } => {
            run_query(&query, model, k, pseudo_feedback, &source, &ratings)
        }
        Commands::Rate { doc_id, rating, source, ratings } => {
            let recommender = open_recommender(open_corpus(&source)?, &ratings)?;
            if recommender.corpus().document(doc_id).is_none() {
                bail!("unknown document id {doc_id}");
            }
            recommender.add_rating(doc_id, rating)?;
            println!("rated [{doc_id}] {rating}");
            Ok(())
        }
        Commands::Recommend { k, source, ratings } => {
            let recommender = open_recommender(open_corpus(&source)?, &ratings)?;
            print_recommendations(&recommender.recommend_documents(k));
            Ok(())
        }
    }
}

fn build_index(input: PathBuf, index: &IndexArgs) -> Result<()> {
    let source = JsonSource::new(Some(input), index.analyzer());
    let corpus = Corpus::build(source.documents()?)?;
    let store = FileIndexStore::new(&index.index);
    store.save(&corpus.snapshot())?;
    println!(
        "Indexed {} docs, {} terms into {}",
        corpus.num_docs(),
        corpus.index().len(),
        store.root().display()
    );
    Ok(())
}

fn open_corpus(args: &SourceArgs) -> Result<Arc<Corpus>> {
    let store = FileIndexStore::new(&args.index.index);
    let source = JsonSource::new(args.input.clone(), args.index.analyzer());
    Ok(Arc::new(Corpus::open(&store, &source)?))
}

fn open_recommender(corpus: Arc<Corpus>, args: &RatingArgs) -> Result<Arc<Recommender>> {
    let store = Arc::new(SledRatingStore::open(&args.ratings)?);
    Ok(Arc::new(Recommender::new(corpus, store, args.namespace.clone())?))
}

fn run_query(
    query: &str,
    kind: ModelKind,
    k: usize,
    pseudo_feedback: Option<usize>,
    source: &SourceArgs,
    ratings: &RatingArgs,
) -> Result<()> {
    let corpus = open_corpus(source)?;
    let mut model = Model::new(kind, corpus.clone(), source.index.analyzer());
    if kind == ModelKind::ExtendedBoolean {
        model = model.with_recommender(open_recommender(corpus, ratings)?);
    }

    let ranking = match model.ranking_function(query) {
        Ok(ranking) => ranking,
        Err(e) if e.is_invalid_query() => {
            tracing::warn!(query, error = %e, "rejected query");
            bail!("{e}; check the operators and parentheses and try again");
        }
        Err(e) => return Err(e.into()),
    };

    if ranking.is_empty() {
        println!("no matching documents");
    }
    for (rank, (doc_id, score)) in ranking.iter().take(k).enumerate() {
        let title = model.corpus().document(*doc_id).map_or("", |d| d.title.as_str());
        println!("{}. [{}] {} ({:.4})", rank + 1, doc_id, title, score);
    }

    if let Model::ExtendedBoolean(extended) = &model {
        extended.record_feedback(&ranking)?;
        if let Some(n) = pseudo_feedback {
            extended.pseudo_feedback(&ranking, n)?;
        }
        println!();
        print_recommendations(&model.recommendations(DEFAULT_RECOMMENDATIONS));
    }
    Ok(())
}

fn print_recommendations(docs: &[&Document]) {
    if docs.is_empty() {
        println!("no recommendations yet");
        return;
    }
    println!("Recommended:");
    for doc in docs {
        println!("  [{}] {}", doc.id, doc.title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_and_query_share_index_flags() {
        let cli = Cli::try_parse_from(["retrieval-cli", "build", "--input", "docs", "--index", "idx", "--stemming"]).unwrap();
        match cli.command {
            Commands::Build { input, index } => {
                assert_eq!(input, PathBuf::from("docs"));
                assert_eq!(index.index, PathBuf::from("idx"));
                assert!(index.stemming);
            }
            _ => panic!("expected build"),
        }

        let cli = Cli::try_parse_from(["retrieval-cli", "query", "cat", "--index", "idx", "--model", "vector"]).unwrap();
        match cli.command {
            Commands::Query { query, model, source, .. } => {
                assert_eq!(query, "cat");
                assert_eq!(model, ModelKind::Vector);
                assert_eq!(source.index.index, PathBuf::from("idx"));
                assert!(!source.index.stemming);
                assert!(source.input.is_none());
            }
            _ => panic!("expected query"),
        }
    }

    #[test]
    fn build_requires_input() {
        assert!(Cli::try_parse_from(["retrieval-cli", "build"]).is_err());
    }
}
