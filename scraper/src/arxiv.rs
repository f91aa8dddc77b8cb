use crate::http::HttpClient;
use anyhow::Result;
use lazy_static::lazy_static;
use litsim_core::corpus::{normalize_authors, CorpusRecord};
use litsim_core::dates::ddmmyyyy;
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, warn};

const ARXIV_API: &str = "https://export.arxiv.org/api/query";
/// Category codes collected, in output order.
pub const ARXIV_SECTIONS: [&str; 3] = ["cs.CL", "cs.CV", "cs.CR"];

lazy_static! {
    static ref VERSION_RE: Regex = Regex::new(r"v\d+$").expect("valid regex");
    static ref ID_RE: Regex = Regex::new(r"(\d{4}\.\d{4,5}(?:v\d+)?)$").expect("valid regex");
}

fn section_long(code: &str) -> &str {
    match code {
        "cs.CL" => "Computation and Language",
        "cs.CV" => "Computer Vision and Pattern Recognition",
        "cs.CR" => "Cryptography and Security",
        other => other,
    }
}

/// Strip a trailing version suffix (`v1`, `v2`, ...) from an arXiv id.
/// Idempotent: stripping twice equals stripping once.
pub fn strip_version(arxiv_id: &str) -> String {
    VERSION_RE.replace(arxiv_id.trim(), "").into_owned()
}

/// One `<entry>` of the Atom feed, fields already trimmed.
#[derive(Debug, Clone, Default)]
pub struct AtomEntry {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub published: String,
    pub doi: String,
}

fn local(name: QName<'_>) -> String {
    String::from_utf8_lossy(name.local_name().as_ref()).into_owned()
}

fn extract_id(raw: &str) -> String {
    if let Some(caps) = ID_RE.captures(raw) {
        return caps[1].to_string();
    }
    raw.rsplit('/').next().unwrap_or(raw).to_string()
}

/// Parse one Atom page into candidate entries. Only the atom
/// id/title/author/summary/published elements and the `arxiv:doi` extension
/// are read; everything else in the feed is ignored.
pub fn parse_atom(xml: &str) -> Result<Vec<AtomEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut cur: Option<AtomEntry> = None;
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local(e.name());
                if name == "entry" {
                    cur = Some(AtomEntry::default());
                }
                path.push(name);
                text.clear();
            }
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::End(e) => {
                let name = local(e.name());
                let parent = path
                    .len()
                    .checked_sub(2)
                    .map(|i| path[i].clone())
                    .unwrap_or_default();
                if let Some(entry) = cur.as_mut() {
                    match (parent.as_str(), name.as_str()) {
                        ("entry", "id") => entry.id = extract_id(text.trim()),
                        ("entry", "title") => entry.title = text.trim().to_string(),
                        ("entry", "summary") => entry.summary = text.trim().to_string(),
                        ("entry", "published") => entry.published = text.trim().to_string(),
                        ("entry", "doi") => entry.doi = text.trim().to_string(),
                        ("author", "name") => {
                            let author = text.trim();
                            if !author.is_empty() {
                                entry.authors.push(author.to_string());
                            }
                        }
                        _ => {}
                    }
                }
                if name == "entry" {
                    if let Some(done) = cur.take() {
                        entries.push(done);
                    }
                }
                path.pop();
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(entries)
}

/// Fold one page of candidates into the section rows, honoring the quota.
/// Identifiers are de-versioned before the uniqueness check so revisions of
/// the same work count once; candidates without an abstract are dropped; a
/// missing native DOI is synthesized from the de-versioned id.
pub fn absorb_page(
    entries: &[AtomEntry],
    section: &str,
    quota: usize,
    seen: &mut HashSet<String>,
    rows: &mut Vec<CorpusRecord>,
) {
    for e in entries {
        if rows.len() >= quota {
            break;
        }
        let base_id = strip_version(&e.id);
        if !seen.insert(base_id.clone()) {
            continue;
        }
        if e.summary.is_empty() {
            continue;
        }
        let doi = if e.doi.is_empty() {
            format!("10.48550/arXiv.{base_id}")
        } else {
            e.doi.clone()
        };
        rows.push(CorpusRecord {
            doi,
            title: e.title.clone(),
            authors: normalize_authors(&e.authors),
            abstract_text: e.summary.clone(),
            category: section.to_string(),
            date: ddmmyyyy(&e.published),
        });
    }
}

fn page_url(category: &str, start: usize, max_results: usize) -> String {
    format!(
        "{ARXIV_API}?search_query=cat:{category}&sortBy=submittedDate&sortOrder=descending\
         &start={start}&max_results={max_results}"
    )
}

/// Collect exactly `per_section` valid records for each fixed category by
/// paging the query API most-recent-first. The offset advances by the page
/// size regardless of how many candidates were accepted; changing that would
/// change which records get collected. A section that runs dry before quota
/// is kept partial with a warning.
pub fn collect_arxiv(
    http: &HttpClient,
    per_section: usize,
    page_size: usize,
) -> Result<Vec<CorpusRecord>> {
    let mut all_rows = Vec::new();

    for section in ARXIV_SECTIONS {
        let long_name = section_long(section);
        let mut rows: Vec<CorpusRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut start = 0;

        while rows.len() < per_section {
            let url = page_url(section, start, page_size);
            let body = http.get(&url, true)?;
            let entries = parse_atom(&body)?;
            debug!(section, start, entries = entries.len(), "fetched arXiv page");
            if entries.is_empty() {
                break;
            }
            absorb_page(&entries, long_name, per_section, &mut seen, &mut rows);
            start += page_size;
        }

        if rows.len() < per_section {
            warn!(
                section,
                collected = rows.len(),
                requested = per_section,
                "section exhausted before quota"
            );
        }
        rows.truncate(per_section);
        all_rows.extend(rows);
    }

    Ok(all_rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title>ArXiv Query Results</title>
  <id>http://arxiv.org/api/example</id>
  <entry>
    <id>http://arxiv.org/abs/2301.00001v1</id>
    <title>Attention Is Not All You Need</title>
    <summary>We revisit attention &amp; recurrence.</summary>
    <published>2023-01-02T10:00:00Z</published>
    <author><name>Jane Doe</name></author>
    <author><name>John Roe</name></author>
    <arxiv:doi>10.1000/example.doi</arxiv:doi>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2301.00001v2</id>
    <title>Attention Is Not All You Need (revised)</title>
    <summary>We revisit attention and recurrence, again.</summary>
    <published>2023-01-05T10:00:00Z</published>
    <author><name>Jane Doe</name></author>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries_with_namespaced_doi() {
        let entries = parse_atom(FEED).expect("parse");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "2301.00001v1");
        assert_eq!(entries[0].title, "Attention Is Not All You Need");
        assert_eq!(entries[0].summary, "We revisit attention & recurrence.");
        assert_eq!(entries[0].authors, vec!["Jane Doe", "John Roe"]);
        assert_eq!(entries[0].doi, "10.1000/example.doi");
        assert_eq!(entries[1].doi, "");
    }

    #[test]
    fn strip_version_is_idempotent() {
        assert_eq!(strip_version("2301.00001v2"), "2301.00001");
        assert_eq!(strip_version(&strip_version("2301.00001v2")), "2301.00001");
        assert_eq!(strip_version("2301.00001"), "2301.00001");
    }

    #[test]
    fn revisions_of_the_same_work_count_once() {
        let entries = parse_atom(FEED).expect("parse");
        let mut seen = HashSet::new();
        let mut rows = Vec::new();
        absorb_page(&entries, "Computation and Language", 100, &mut seen, &mut rows);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].authors, "Jane Doe, John Roe");
        assert_eq!(rows[0].date, "02/01/2023");
    }

    #[test]
    fn missing_doi_is_synthesized_from_deversioned_id() {
        let mut entries = parse_atom(FEED).expect("parse");
        entries.remove(0);
        let mut seen = HashSet::new();
        let mut rows = Vec::new();
        absorb_page(&entries, "Computation and Language", 100, &mut seen, &mut rows);
        assert_eq!(rows[0].doi, "10.48550/arXiv.2301.00001");
    }

    #[test]
    fn abstract_is_required() {
        let mut entries = parse_atom(FEED).expect("parse");
        entries[0].summary.clear();
        entries.truncate(1);
        let mut seen = HashSet::new();
        let mut rows = Vec::new();
        absorb_page(&entries, "Computation and Language", 100, &mut seen, &mut rows);
        assert!(rows.is_empty());
    }

    #[test]
    fn quota_bounds_accepted_rows() {
        let entries = vec![
            AtomEntry { id: "2301.1".into(), summary: "a".into(), ..Default::default() },
            AtomEntry { id: "2301.2".into(), summary: "b".into(), ..Default::default() },
            AtomEntry { id: "2301.3".into(), summary: "c".into(), ..Default::default() },
        ];
        let mut seen = HashSet::new();
        let mut rows = Vec::new();
        absorb_page(&entries, "Cryptography and Security", 2, &mut seen, &mut rows);
        assert_eq!(rows.len(), 2);
    }
}
