use anyhow::{bail, Result};
use clap::Parser;
use litsim_core::vector::{NgramKind, Representation};
use litsim_retriever::retrieve;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "litsim-retriever")]
#[command(about = "Retrieve the most similar corpus articles for a citation file")]
struct Cli {
    /// Query file (.bib or .ris)
    #[arg(long)]
    file: String,
    /// Field to compare: Title or Abstract
    #[arg(long, default_value = "Abstract")]
    field: String,
    /// Representation: tfidf, frequency, or binary
    #[arg(long, default_value = "tfidf")]
    vector: String,
    /// N-gram kind: unigram, bigram, or both
    #[arg(long, default_value = "unigram")]
    ngrams: String,
    /// Base path holding corpus/ and vectors/
    #[arg(long, default_value = ".")]
    basepath: String,
    /// Output file prefix (without extension)
    #[arg(long, default_value = "similar_articles")]
    output: String,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    if !args.field.eq_ignore_ascii_case("title") && !args.field.eq_ignore_ascii_case("abstract") {
        bail!("unknown field {:?}, expected Title or Abstract", args.field);
    }
    let rep = Representation::parse(&args.vector)?;
    let ngrams = NgramKind::parse(&args.ngrams)?;

    match retrieve(
        Path::new(&args.file),
        &args.field,
        rep,
        ngrams,
        Path::new(&args.basepath),
        &args.output,
    )? {
        Some((results, outputs)) => {
            info!(
                results = results.len(),
                txt = %outputs.txt.display(),
                tsv = %outputs.tsv.display(),
                "retrieval complete"
            );
        }
        None => info!("no output written"),
    }
    Ok(())
}
