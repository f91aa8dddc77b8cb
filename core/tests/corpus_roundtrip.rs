use litsim_core::corpus::{read_corpus, write_corpus, CorpusRecord, ARXIV_HEADER, PUBMED_HEADER};

fn sample(n: usize) -> Vec<CorpusRecord> {
    (0..n)
        .map(|i| CorpusRecord {
            doi: format!("10.48550/arXiv.2301.0000{i}"),
            title: format!("Paper {i}\nwith a wrapped title"),
            authors: "A. Author, B. Author".to_string(),
            abstract_text: format!("Abstract\ttext {i}"),
            category: "Computation and Language".to_string(),
            date: "01/01/2023".to_string(),
        })
        .collect()
}

#[test]
fn write_then_read_preserves_rows_and_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("corpus").join("arxiv_raw_corpus.csv");
    let records = sample(5);
    write_corpus(&path, &records, &ARXIV_HEADER).expect("write");

    let (header, rows) = read_corpus(&path).expect("read");
    assert_eq!(header, ARXIV_HEADER.to_vec());
    assert_eq!(rows.len(), 5);
    // Embedded newlines and tabs were flattened, not split into extra rows.
    assert_eq!(rows[0].title, "Paper 0 with a wrapped title");
    assert_eq!(rows[0].abstract_text, "Abstract text 0");
    assert_eq!(rows[3].doi, records[3].doi);
}

#[test]
fn rerun_overwrites_previous_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("pubmed_raw_corpus.csv");
    write_corpus(&path, &sample(4), &PUBMED_HEADER).expect("first write");
    write_corpus(&path, &sample(2), &PUBMED_HEADER).expect("second write");
    let (_, rows) = read_corpus(&path).expect("read");
    assert_eq!(rows.len(), 2);
}
