use anyhow::{bail, Result};
use clap::Parser;
use litsim_core::corpus::{read_corpus, CorpusRecord};
use litsim_core::normalize::normalize_text;
use litsim_core::persist::{save_space, ArtifactPaths, SpaceMeta, VectorSpace};
use litsim_core::vector::{NgramKind, Representation, Vectorizer};
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "litsim-vectorizer")]
#[command(about = "Build persisted vector spaces from the corpus tables", long_about = None)]
struct Cli {
    /// Base path holding corpus/ and vectors/
    #[arg(long, default_value = ".")]
    basepath: String,
    /// Corpus to vectorize: arxiv, pubmed, or both
    #[arg(long, default_value = "both")]
    corpus: String,
    /// Text field to vectorize: Title, Abstract, or Both
    #[arg(long, default_value = "Both")]
    field: String,
    /// Representation: tfidf, frequency, binary, or all
    #[arg(long, default_value = "all")]
    rep: String,
    /// N-gram kind: unigram, bigram, or both
    #[arg(long, default_value = "both")]
    ngrams: String,
}

fn field_text(record: &CorpusRecord, field: &str) -> String {
    if field == "Title" {
        record.title.clone()
    } else {
        record.abstract_text.clone()
    }
}

fn build_spaces(cli: &Cli) -> Result<()> {
    let corpora: Vec<&str> = match cli.corpus.as_str() {
        "both" => vec!["arxiv", "pubmed"],
        "arxiv" => vec!["arxiv"],
        "pubmed" => vec!["pubmed"],
        other => bail!("unknown corpus {other:?}, expected arxiv, pubmed, or both"),
    };
    let fields: Vec<&str> = match cli.field.as_str() {
        "Both" => vec!["Title", "Abstract"],
        "Title" => vec!["Title"],
        "Abstract" => vec!["Abstract"],
        other => bail!("unknown field {other:?}, expected Title, Abstract, or Both"),
    };
    let reps: Vec<Representation> = if cli.rep == "all" {
        vec![Representation::Tfidf, Representation::Frequency, Representation::Binary]
    } else {
        vec![Representation::parse(&cli.rep)?]
    };
    let kind = NgramKind::parse(&cli.ngrams)?;

    let paths = ArtifactPaths::new(&cli.basepath);
    for corpus in corpora {
        let table = paths.corpus_table(corpus);
        if !table.exists() {
            warn!(corpus, path = %table.display(), "corpus table not found, skipping");
            continue;
        }
        let (_header, records) = read_corpus(&table)?;

        for &field in &fields {
            let docs: Vec<String> = records
                .iter()
                .map(|r| normalize_text(&field_text(r, field)))
                .collect();

            for &rep in &reps {
                let (vectorizer, matrix, feature_names) = Vectorizer::fit(&docs, rep, kind);
                let (ngram_min, ngram_max) = kind.range();
                let space = VectorSpace {
                    vectorizer,
                    matrix,
                    feature_names,
                    doc_ids: (0..records.len() as u32).collect(),
                    meta: SpaceMeta {
                        corpus: corpus.to_string(),
                        field: field.to_string(),
                        rep: rep.as_str().to_string(),
                        ngram_min,
                        ngram_max,
                        built_at: time::OffsetDateTime::now_utc()
                            .format(&Rfc3339)
                            .unwrap_or_default(),
                    },
                };
                let written = save_space(&paths, &space)?;
                info!(
                    corpus,
                    field,
                    rep = rep.as_str(),
                    ngrams = kind.code(),
                    docs = space.matrix.rows(),
                    features = space.feature_names.len(),
                    path = %written.display(),
                    "vector space written"
                );
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    build_spaces(&cli)
}
