use anyhow::{anyhow, Result};
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Column set for the arXiv corpus table.
pub const ARXIV_HEADER: [&str; 6] = ["DOI", "Title", "Authors", "Abstract", "Section", "Date"];
/// Column set for the PubMed corpus table.
pub const PUBMED_HEADER: [&str; 6] = ["DOI", "Title", "Authors", "Abstract", "Journal", "Date"];

/// One normalized bibliographic entry. `category` holds the arXiv section
/// long name or the PubMed journal title depending on the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusRecord {
    pub doi: String,
    pub title: String,
    pub authors: String,
    pub abstract_text: String,
    pub category: String,
    pub date: String,
}

/// Join trimmed, non-empty author names with ", ".
pub fn normalize_authors(authors: &[String]) -> String {
    authors
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn clean_field(value: &str) -> String {
    value
        .replace('\n', " ")
        .replace('\r', " ")
        .replace('\t', " ")
        .trim()
        .to_string()
}

/// Write the corpus as a tab-separated table with a fixed header, one row per
/// record. Embedded newlines and tabs are flattened to spaces so every record
/// stays on one line. Parent directories are created as needed.
pub fn write_corpus<P: AsRef<Path>>(path: P, records: &[CorpusRecord], header: &[&str]) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        create_dir_all(dir)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", header.join("\t"))?;
    for r in records {
        let row = [
            clean_field(&r.doi),
            clean_field(&r.title),
            clean_field(&r.authors),
            clean_field(&r.abstract_text),
            clean_field(&r.category),
            clean_field(&r.date),
        ];
        writeln!(out, "{}", row.join("\t"))?;
    }
    out.flush()?;
    Ok(())
}

/// Read a persisted corpus table back. Returns the header columns and the
/// rows in file order. Short rows are padded with empty fields.
pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<(Vec<String>, Vec<CorpusRecord>)> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();
    let header_line = lines
        .next()
        .ok_or_else(|| anyhow!("empty corpus table: {}", path.display()))??;
    let header: Vec<String> = header_line.split('\t').map(str::to_string).collect();

    let mut records = Vec::new();
    for line in lines {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let mut cols: Vec<&str> = line.split('\t').collect();
        cols.resize(6, "");
        records.push(CorpusRecord {
            doi: cols[0].to_string(),
            title: cols[1].to_string(),
            authors: cols[2].to_string(),
            abstract_text: cols[3].to_string(),
            category: cols[4].to_string(),
            date: cols[5].to_string(),
        });
    }
    Ok((header, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authors_joined_and_trimmed() {
        let authors = vec![" Ada Lovelace ".to_string(), "".to_string(), "Alan Turing".to_string()];
        assert_eq!(normalize_authors(&authors), "Ada Lovelace, Alan Turing");
    }

    #[test]
    fn fields_are_flattened() {
        assert_eq!(clean_field("line one\nline\ttwo\r"), "line one line two");
    }
}
