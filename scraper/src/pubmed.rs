use crate::http::HttpClient;
use anyhow::Result;
use lazy_static::lazy_static;
use litsim_core::corpus::{normalize_authors, CorpusRecord};
use litsim_core::dates::ddmmyyyy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};

const PUBMED_BASE: &str = "https://pubmed.ncbi.nlm.nih.gov";

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"^([A-Z]{2,4})\s*-\s(.*)$").expect("valid regex");
    // Runs of 1-6 all-caps tokens followed by a colon: structural sub-headers
    // like "BACKGROUND:" or "MATERIALS AND-METHODS:" embedded in abstracts.
    static ref CAPS_COLON_RE: Regex =
        Regex::new(r"\b(?:[A-Z][A-Z0-9\-]{1,}(?:\s+[A-Z][A-Z0-9\-]{1,}){0,5}):\s*")
            .expect("valid regex");
    static ref DOI_RE: Regex = Regex::new(r"(10\.\d{4,9}/\S+)").expect("valid regex");
    static ref YEAR_RE: Regex = Regex::new(r"(19|20)\d{2}").expect("valid regex");
}

/// Tags recognized in a tag-prefixed record. Everything else is skipped,
/// including continuation lines that follow a skipped tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Title,
    Abstract,
    Author,
    Journal,
    Date,
    Lid,
    Aid,
}

impl Tag {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "TI" => Some(Self::Title),
            "AB" => Some(Self::Abstract),
            "AU" => Some(Self::Author),
            "JT" => Some(Self::Journal),
            "DP" => Some(Self::Date),
            "LID" => Some(Self::Lid),
            "AID" => Some(Self::Aid),
            _ => None,
        }
    }

    /// Only title and abstract values wrap onto continuation lines.
    fn accumulates(self) -> bool {
        matches!(self, Self::Title | Self::Abstract)
    }
}

/// One parsed bibliographic record, before validation.
#[derive(Debug, Clone, Default)]
pub struct TagRecord {
    pub title: String,
    pub abstract_text: String,
    pub authors: Vec<String>,
    pub journal: String,
    pub date: String,
    pub doi: String,
}

/// Remove embedded uppercase "LABEL:" sub-headers anywhere in an abstract,
/// keeping the surrounding prose.
pub fn clean_abstract(text: &str) -> String {
    CAPS_COLON_RE.replace_all(text, "").trim().to_string()
}

/// Split a text block into individual records on the sentinel tag that marks
/// record start.
pub fn split_records(block: &str) -> Vec<String> {
    let mut records: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in block.lines() {
        if line.starts_with("PMID- ") && !current.is_empty() {
            records.push(std::mem::take(&mut current));
        }
        current.push(line);
    }
    if !current.is_empty() {
        records.push(current);
    }
    records.into_iter().map(|r| r.join("\n")).collect()
}

fn pick_doi(values: &[String]) -> String {
    for value in values {
        if let Some(caps) = DOI_RE.captures(value) {
            return caps[1].trim_end_matches([')', '.', ';', ']']).to_string();
        }
    }
    String::new()
}

fn year_fallback(text: &str) -> String {
    YEAR_RE
        .find(text)
        .map(|m| format!("01/01/{}", m.as_str()))
        .unwrap_or_default()
}

/// Parse one tag-prefixed record. Recognized tags accumulate typed values;
/// continuation lines attach only to an active title or abstract. The date is
/// normalized from the DP tag, falling back to the first 4-digit year found
/// in the DOI, journal, title, or abstract, anchored to January 1st.
pub fn parse_record(text: &str) -> TagRecord {
    let mut title_parts: Vec<String> = Vec::new();
    let mut abstract_parts: Vec<String> = Vec::new();
    let mut authors: Vec<String> = Vec::new();
    let mut journal_parts: Vec<String> = Vec::new();
    let mut date_parts: Vec<String> = Vec::new();
    let mut lid_values: Vec<String> = Vec::new();
    let mut aid_values: Vec<String> = Vec::new();
    let mut active: Option<Tag> = None;

    for line in text.lines() {
        if let Some(caps) = TAG_RE.captures(line) {
            let tag = Tag::from_key(&caps[1]);
            active = tag;
            let value = caps[2].trim_end().to_string();
            match tag {
                Some(Tag::Title) => title_parts.push(value),
                Some(Tag::Abstract) => abstract_parts.push(value),
                Some(Tag::Author) => authors.push(value),
                Some(Tag::Journal) => journal_parts.push(value),
                Some(Tag::Date) => date_parts.push(value),
                Some(Tag::Lid) => lid_values.push(value),
                Some(Tag::Aid) => aid_values.push(value),
                None => {}
            }
        } else if let Some(tag) = active.filter(|t| t.accumulates()) {
            // Continuation lines are indented; single-space joining wants
            // them fully trimmed.
            let cont = line.trim().to_string();
            match tag {
                Tag::Title => title_parts.push(cont),
                Tag::Abstract => abstract_parts.push(cont),
                _ => unreachable!(),
            }
        }
    }

    let title = title_parts.join(" ").trim().to_string();
    let abstract_text = clean_abstract(abstract_parts.join(" ").trim());
    let journal = journal_parts.join(" ").trim().to_string();
    let date_raw = date_parts.join(" ").trim().to_string();

    let doi = {
        let from_lid = pick_doi(&lid_values);
        if from_lid.is_empty() { pick_doi(&aid_values) } else { from_lid }
    };

    let mut date = ddmmyyyy(&date_raw);
    if date.is_empty() {
        date = year_fallback(&doi);
    }
    if date.is_empty() {
        date = year_fallback(&journal);
    }
    if date.is_empty() {
        date = year_fallback(&title);
    }
    if date.is_empty() {
        date = year_fallback(&abstract_text);
    }

    TagRecord { title, abstract_text, authors, journal, date, doi }
}

/// Stricter than the feed source: abstract, date, and DOI must all be
/// present for a record to be kept.
fn is_valid(record: &TagRecord) -> bool {
    !record.abstract_text.is_empty() && !record.date.is_empty() && !record.doi.is_empty()
}

fn page_url(page: usize, page_size: usize) -> String {
    format!(
        "{PUBMED_BASE}/trending/?term=&ac=yes&schema=none&page={page}\
         &show_snippets=on&sort=relevance&sort_order=desc&format=pubmed&size={page_size}"
    )
}

/// Collect exactly `required_total` valid records by paging the listing
/// endpoint. Stops early when a page carries no record blocks; a shortfall
/// is logged and the partial result kept.
pub fn collect_pubmed(
    http: &HttpClient,
    required_total: usize,
    page_size: usize,
) -> Result<Vec<CorpusRecord>> {
    let chunk_selector = Selector::parse("pre.search-results-chunk").expect("valid selector");
    let mut rows: Vec<CorpusRecord> = Vec::new();
    let mut page = 1;

    'pages: while rows.len() < required_total {
        let body = http.get(&page_url(page, page_size), true)?;
        let document = Html::parse_document(&body);
        let blocks: Vec<String> = document
            .select(&chunk_selector)
            .map(|pre| pre.text().collect::<Vec<_>>().join("\n"))
            .collect();
        debug!(page, blocks = blocks.len(), "fetched PubMed page");
        if blocks.is_empty() {
            break;
        }

        for block in &blocks {
            for record_text in split_records(block) {
                let record = parse_record(&record_text);
                if !is_valid(&record) {
                    continue;
                }
                rows.push(CorpusRecord {
                    doi: record.doi,
                    title: record.title,
                    authors: normalize_authors(&record.authors),
                    abstract_text: record.abstract_text,
                    category: record.journal,
                    date: record.date,
                });
                if rows.len() >= required_total {
                    break 'pages;
                }
            }
        }
        page += 1;
    }

    if rows.len() < required_total {
        warn!(
            collected = rows.len(),
            requested = required_total,
            "listing exhausted before quota"
        );
    }
    rows.truncate(required_total);
    Ok(rows)
}
