use anyhow::{bail, Result};
use lazy_static::lazy_static;
use litsim_core::corpus::read_corpus;
use litsim_core::normalize::normalize_text;
use litsim_core::persist::{load_space, ArtifactPaths};
use litsim_core::vector::{cosine_against_rows, NgramKind, Representation};
use regex::Regex;
use std::cmp::Ordering;
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// The two corpora queried, in merge-stability order.
pub const CORPORA: [&str; 2] = ["arxiv", "pubmed"];
const TOP_N: usize = 10;

lazy_static! {
    static ref BIB_TITLE_RE: Regex =
        Regex::new(r#"(?i)title\s*=\s*[{"](.+?)[}"]"#).expect("valid regex");
    static ref BIB_ABSTRACT_RE: Regex =
        Regex::new(r#"(?i)abstract\s*=\s*[{"](.+?)[}"]"#).expect("valid regex");
}

/// One ranked hit of the merged result list.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub corpus: String,
    pub title: String,
    pub doi: String,
    pub date: String,
    pub similarity: f32,
}

/// Paths of the two emitted artifacts.
#[derive(Debug)]
pub struct RetrievalOutputs {
    pub txt: PathBuf,
    pub tsv: PathBuf,
}

/// Extract `title=`/`abstract=` values from a brace- or quote-delimited
/// citation file.
pub fn read_bibtex(path: &Path) -> Result<(String, String)> {
    let content = std::fs::read_to_string(path)?;
    let title = BIB_TITLE_RE
        .captures(&content)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();
    let abstract_text = BIB_ABSTRACT_RE
        .captures(&content)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();
    Ok((title, abstract_text))
}

/// Extract `TI  -`/`AB  -` prefixed lines from a tag-formatted citation
/// file. The last occurrence of each tag wins.
pub fn read_ris(path: &Path) -> Result<(String, String)> {
    let mut title = String::new();
    let mut abstract_text = String::new();
    for line in BufReader::new(File::open(path)?).lines() {
        let line = line?;
        if let Some(rest) = line.strip_prefix("TI  -") {
            title = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("AB  -") {
            abstract_text = rest.trim().to_string();
        }
    }
    Ok((title, abstract_text))
}

/// Dispatch on the query file extension. Anything but `.bib` or `.ris` is a
/// hard input error.
pub fn read_query(path: &Path) -> Result<(String, String)> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("bib") => read_bibtex(path),
        Some("ris") => read_ris(path),
        _ => bail!("unsupported query format {:?}, use .bib or .ris", path.display()),
    }
}

/// Top-k row indices by descending similarity, ties broken by ascending row
/// index.
fn top_indices(sims: &[f32], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..sims.len()).collect();
    order.sort_by(|&a, &b| {
        sims[b]
            .partial_cmp(&sims[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    order.truncate(k);
    order
}

/// Rank the normalized query against every available corpus and merge into a
/// single top-10 list. A corpus whose artifact or table is missing is logged
/// and skipped; it never fails the overall query.
pub fn rank(
    normalized_query: &str,
    field: &str,
    rep: Representation,
    ngrams: NgramKind,
    base_path: &Path,
) -> Result<Vec<RetrievalResult>> {
    let paths = ArtifactPaths::new(base_path);
    let mut results: Vec<RetrievalResult> = Vec::new();

    for corpus in CORPORA {
        let space = match load_space(&paths, corpus, field, rep, ngrams) {
            Ok(space) => space,
            Err(err) => {
                warn!(corpus, error = %err, "skipping corpus");
                continue;
            }
        };
        let table = paths.corpus_table(corpus);
        if !table.exists() {
            warn!(corpus, path = %table.display(), "corpus table not found, skipping corpus");
            continue;
        }
        let (_header, records) = read_corpus(&table)?;

        let query_vec = space.vectorizer.transform(normalized_query);
        let sims = cosine_against_rows(&query_vec, &space.matrix);
        for idx in top_indices(&sims, TOP_N) {
            if let Some(row) = records.get(idx) {
                results.push(RetrievalResult {
                    corpus: corpus.to_string(),
                    title: row.title.clone(),
                    doi: row.doi.clone(),
                    date: row.date.clone(),
                    similarity: sims[idx],
                });
            }
        }
    }

    // Stable sort: equal scores keep corpus order and per-corpus rank order.
    results.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal));
    results.truncate(TOP_N);
    Ok(results)
}

/// Write the human-readable report and the machine-readable table at
/// `{prefix}.txt` / `{prefix}.tsv`.
pub fn write_outputs(
    prefix: &str,
    query_file: &Path,
    field: &str,
    rep: Representation,
    ngrams: NgramKind,
    results: &[RetrievalResult],
) -> Result<RetrievalOutputs> {
    let txt_path = PathBuf::from(format!("{prefix}.txt"));
    let tsv_path = PathBuf::from(format!("{prefix}.tsv"));
    if let Some(dir) = txt_path.parent() {
        if !dir.as_os_str().is_empty() {
            create_dir_all(dir)?;
        }
    }

    let query_name = query_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut txt = BufWriter::new(File::create(&txt_path)?);
    writeln!(txt, "Query file: {query_name}")?;
    writeln!(
        txt,
        "Field: {field} | Vectorization: {} | N-grams: {}",
        rep.as_str().to_uppercase(),
        ngrams.as_str()
    )?;
    writeln!(txt)?;
    writeln!(txt, "Top {TOP_N} most similar articles (arXiv + PubMed):")?;
    writeln!(txt)?;
    for (i, r) in results.iter().enumerate() {
        writeln!(
            txt,
            "{}. [{}] {} (similarity: {:.3})",
            i + 1,
            r.corpus.to_uppercase(),
            r.title,
            r.similarity
        )?;
        writeln!(txt, "   DOI: {}", r.doi)?;
        writeln!(txt, "   Date: {}", r.date)?;
        writeln!(txt)?;
    }
    txt.flush()?;

    let mut tsv = BufWriter::new(File::create(&tsv_path)?);
    writeln!(
        tsv,
        "CorpusDocument\tVectorRepresentation\tExtractedFeatures\tComparisonContent\tSimilarityValue\tCorpus\tDOI\tDate"
    )?;
    for r in results {
        writeln!(
            tsv,
            "{}\t{}\t{}\t{}\t{:.3}\t{}\t{}\t{}",
            r.title,
            rep.as_str(),
            ngrams.as_str(),
            field,
            r.similarity,
            r.corpus,
            r.doi,
            r.date
        )?;
    }
    tsv.flush()?;

    Ok(RetrievalOutputs { txt: txt_path, tsv: tsv_path })
}

/// Full retrieval operation: read the query file, pick the requested field,
/// normalize, rank across corpora, and emit both outputs. Returns `None`
/// without writing anything when the selected field is empty — a non-fatal
/// outcome, unlike an unsupported file format.
pub fn retrieve(
    query_file: &Path,
    field: &str,
    rep: Representation,
    ngrams: NgramKind,
    base_path: &Path,
    output_prefix: &str,
) -> Result<Option<(Vec<RetrievalResult>, RetrievalOutputs)>> {
    let (title, abstract_text) = read_query(query_file)?;
    let query_text = if field.eq_ignore_ascii_case("title") { title } else { abstract_text };
    if query_text.trim().is_empty() {
        warn!(field, "no text found in the selected query field");
        return Ok(None);
    }

    let normalized = normalize_text(&query_text);
    let results = rank(&normalized, field, rep, ngrams, base_path)?;
    let outputs = write_outputs(output_prefix, query_file, field, rep, ngrams, &results)?;
    Ok(Some((results, outputs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bibtex_fields_in_braces_or_quotes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("query.bib");
        std::fs::write(
            &path,
            "@article{key,\n  Title = {Sparse Retrieval},\n  abstract = \"Dense vs sparse.\",\n}\n",
        )
        .expect("write");
        let (title, abstract_text) = read_bibtex(&path).expect("read");
        assert_eq!(title, "Sparse Retrieval");
        assert_eq!(abstract_text, "Dense vs sparse.");
    }

    #[test]
    fn ris_last_tag_occurrence_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("query.ris");
        std::fs::write(&path, "TY  - JOUR\nTI  - First\nTI  - Second\nAB  - Summary\nER  -\n")
            .expect("write");
        let (title, abstract_text) = read_ris(&path).expect("read");
        assert_eq!(title, "Second");
        assert_eq!(abstract_text, "Summary");
    }

    #[test]
    fn unsupported_extension_is_a_hard_error() {
        let err = read_query(Path::new("query.docx")).expect_err("must fail");
        assert!(err.to_string().contains("unsupported query format"));
    }

    #[test]
    fn ties_break_by_ascending_row_index() {
        let sims = vec![0.5, 0.9, 0.5, 0.1];
        assert_eq!(top_indices(&sims, 3), vec![1, 0, 2]);
    }

    #[test]
    fn top_indices_bounded_by_k() {
        let sims = vec![0.1; 30];
        assert_eq!(top_indices(&sims, 10).len(), 10);
    }
}
