use anyhow::{bail, Result};
use clap::Parser;
use litsim_core::corpus::{write_corpus, ARXIV_HEADER, PUBMED_HEADER};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

mod arxiv;
mod http;
mod pubmed;

use http::HttpClient;

#[derive(Parser, Debug)]
#[command(name = "litsim-scraper")]
#[command(about = "Collect the arXiv and PubMed literature corpora into TSV tables")]
struct Cli {
    /// Source to collect: arxiv, pubmed, or both
    #[arg(long, default_value = "both")]
    repo: String,
    /// Exact number of records per arXiv section
    #[arg(long, default_value_t = 100)]
    arxiv_per_section: usize,
    /// arXiv API page size
    #[arg(long, default_value_t = 200)]
    arxiv_page_size: usize,
    /// Exact total number of PubMed records
    #[arg(long, default_value_t = 300)]
    pubmed_total: usize,
    /// PubMed listing page size
    #[arg(long, default_value_t = 100)]
    pubmed_page_size: usize,
    /// Output path for the arXiv corpus table
    #[arg(long, default_value = "./corpus/arxiv_raw_corpus.csv")]
    arxiv_out: String,
    /// Output path for the PubMed corpus table
    #[arg(long, default_value = "./corpus/pubmed_raw_corpus.csv")]
    pubmed_out: String,
    /// Enable DEBUG logging
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    fmt().with_env_filter(filter).init();

    if !matches!(args.repo.as_str(), "arxiv" | "pubmed" | "both") {
        bail!("unknown repo {:?}, expected arxiv, pubmed, or both", args.repo);
    }

    let http = HttpClient::new()?;

    if matches!(args.repo.as_str(), "arxiv" | "both") {
        info!(per_section = args.arxiv_per_section, "collecting arXiv sections");
        let rows = arxiv::collect_arxiv(&http, args.arxiv_per_section, args.arxiv_page_size)?;
        write_corpus(&args.arxiv_out, &rows, &ARXIV_HEADER)?;
        info!(rows = rows.len(), out = %args.arxiv_out, "arXiv corpus written");
    }

    if matches!(args.repo.as_str(), "pubmed" | "both") {
        info!(total = args.pubmed_total, page_size = args.pubmed_page_size, "collecting PubMed");
        let rows = pubmed::collect_pubmed(&http, args.pubmed_total, args.pubmed_page_size)?;
        write_corpus(&args.pubmed_out, &rows, &PUBMED_HEADER)?;
        info!(rows = rows.len(), out = %args.pubmed_out, "PubMed corpus written");
    }

    Ok(())
}
