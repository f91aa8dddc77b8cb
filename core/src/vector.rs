use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

lazy_static! {
    // Vocabulary token pattern, applied to already-normalized text.
    static ref TOKEN_RE: Regex = Regex::new(r"(?u)\w+|[?.,¿!]").expect("valid regex");
}

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("unrecognized n-gram kind: {0}")]
    UnknownNgram(String),
    #[error("unrecognized representation: {0}")]
    UnknownRepresentation(String),
}

/// Term weighting scheme of a vector space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Representation {
    Tfidf,
    Frequency,
    Binary,
}

impl Representation {
    pub fn parse(s: &str) -> Result<Self, VectorError> {
        match s {
            "tfidf" => Ok(Self::Tfidf),
            "frequency" => Ok(Self::Frequency),
            "binary" => Ok(Self::Binary),
            other => Err(VectorError::UnknownRepresentation(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tfidf => "tfidf",
            Self::Frequency => "frequency",
            Self::Binary => "binary",
        }
    }
}

/// Contiguous token-span range used as vocabulary units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NgramKind {
    Unigram,
    Bigram,
    Both,
}

impl NgramKind {
    pub fn parse(s: &str) -> Result<Self, VectorError> {
        match s {
            "unigram" => Ok(Self::Unigram),
            "bigram" => Ok(Self::Bigram),
            "both" => Ok(Self::Both),
            other => Err(VectorError::UnknownNgram(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unigram => "unigram",
            Self::Bigram => "bigram",
            Self::Both => "both",
        }
    }

    /// Short code used in artifact file names.
    pub fn code(self) -> &'static str {
        match self {
            Self::Unigram => "n1-1",
            Self::Bigram => "n2-2",
            Self::Both => "n1-2",
        }
    }

    pub fn range(self) -> (usize, usize) {
        match self {
            Self::Unigram => (1, 1),
            Self::Bigram => (2, 2),
            Self::Both => (1, 2),
        }
    }
}

/// Sparse row-major document-term matrix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsrMatrix {
    pub cols: usize,
    pub indptr: Vec<usize>,
    pub indices: Vec<usize>,
    pub data: Vec<f32>,
}

impl CsrMatrix {
    pub fn new(cols: usize) -> Self {
        Self { cols, indptr: vec![0], indices: Vec::new(), data: Vec::new() }
    }

    pub fn rows(&self) -> usize {
        self.indptr.len().saturating_sub(1)
    }

    /// Append one row from (column, value) entries sorted by column.
    pub fn push_row(&mut self, entries: &[(usize, f32)]) {
        for (col, val) in entries {
            self.indices.push(*col);
            self.data.push(*val);
        }
        self.indptr.push(self.indices.len());
    }

    pub fn row(&self, r: usize) -> (&[usize], &[f32]) {
        let lo = self.indptr[r];
        let hi = self.indptr[r + 1];
        (&self.indices[lo..hi], &self.data[lo..hi])
    }
}

/// Sparse query vector, entries sorted by column index.
#[derive(Debug, Clone, Default)]
pub struct SparseVec {
    pub indices: Vec<usize>,
    pub values: Vec<f32>,
}

impl SparseVec {
    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }
}

/// A fitted vectorizer: vocabulary plus, for tf-idf, the per-term idf weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vectorizer {
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f32>,
    pub rep: Representation,
    pub ngram_min: usize,
    pub ngram_max: usize,
}

fn ngrams(text: &str, min: usize, max: usize) -> Vec<String> {
    let tokens: Vec<&str> = TOKEN_RE.find_iter(text).map(|m| m.as_str()).collect();
    let mut out = Vec::new();
    for n in min..=max {
        if n == 0 || tokens.len() < n {
            continue;
        }
        for window in tokens.windows(n) {
            out.push(window.join(" "));
        }
    }
    out
}

fn term_counts(text: &str, min: usize, max: usize) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for gram in ngrams(text, min, max) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

impl Vectorizer {
    /// Fit a vocabulary over already-normalized documents and produce the
    /// document-term matrix alongside the sorted feature names.
    ///
    /// Tf-idf uses the smoothed form `ln((1 + n) / (1 + df)) + 1` and
    /// l2-normalized rows; frequency keeps raw counts; binary stores presence.
    pub fn fit(docs: &[String], rep: Representation, kind: NgramKind) -> (Self, CsrMatrix, Vec<String>) {
        let (min, max) = kind.range();
        let per_doc: Vec<BTreeMap<String, u32>> =
            docs.iter().map(|d| term_counts(d, min, max)).collect();

        let mut df: BTreeMap<&str, u32> = BTreeMap::new();
        for counts in &per_doc {
            for term in counts.keys() {
                *df.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        // BTreeMap iteration gives the sorted feature order.
        let feature_names: Vec<String> = df.keys().map(|t| t.to_string()).collect();
        let vocabulary: HashMap<String, usize> = feature_names
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        let n = docs.len() as f32;
        let idf: Vec<f32> = if rep == Representation::Tfidf {
            df.values()
                .map(|&d| ((1.0 + n) / (1.0 + d as f32)).ln() + 1.0)
                .collect()
        } else {
            Vec::new()
        };

        let vectorizer = Self { vocabulary, idf, rep, ngram_min: min, ngram_max: max };

        let mut matrix = CsrMatrix::new(feature_names.len());
        for counts in &per_doc {
            let mut entries: Vec<(usize, f32)> = counts
                .iter()
                .map(|(term, &count)| {
                    let col = vectorizer.vocabulary[term.as_str()];
                    (col, vectorizer.weigh(col, count))
                })
                .collect();
            entries.sort_by_key(|(col, _)| *col);
            if rep == Representation::Tfidf {
                l2_normalize(&mut entries);
            }
            matrix.push_row(&entries);
        }

        (vectorizer, matrix, feature_names)
    }

    fn weigh(&self, col: usize, count: u32) -> f32 {
        match self.rep {
            Representation::Tfidf => count as f32 * self.idf[col],
            Representation::Frequency => count as f32,
            Representation::Binary => 1.0,
        }
    }

    /// Project a normalized query into this space. Out-of-vocabulary n-grams
    /// are dropped.
    pub fn transform(&self, text: &str) -> SparseVec {
        let counts = term_counts(text, self.ngram_min, self.ngram_max);
        let mut entries: Vec<(usize, f32)> = counts
            .iter()
            .filter_map(|(term, &count)| {
                self.vocabulary.get(term.as_str()).map(|&col| (col, self.weigh(col, count)))
            })
            .collect();
        entries.sort_by_key(|(col, _)| *col);
        if self.rep == Representation::Tfidf {
            l2_normalize(&mut entries);
        }
        SparseVec {
            indices: entries.iter().map(|(c, _)| *c).collect(),
            values: entries.iter().map(|(_, v)| *v).collect(),
        }
    }
}

fn l2_normalize(entries: &mut [(usize, f32)]) {
    let norm = entries.iter().map(|(_, v)| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for (_, v) in entries.iter_mut() {
            *v /= norm;
        }
    }
}

/// Cosine similarity of the query against every matrix row, in row order.
/// Rows or queries with zero norm score 0.
pub fn cosine_against_rows(query: &SparseVec, matrix: &CsrMatrix) -> Vec<f32> {
    let q_norm = query.norm();
    let mut sims = Vec::with_capacity(matrix.rows());
    for r in 0..matrix.rows() {
        let (cols, vals) = matrix.row(r);
        if q_norm == 0.0 {
            sims.push(0.0);
            continue;
        }
        let row_norm = vals.iter().map(|v| v * v).sum::<f32>().sqrt();
        if row_norm == 0.0 {
            sims.push(0.0);
            continue;
        }
        sims.push(sparse_dot(&query.indices, &query.values, cols, vals) / (q_norm * row_norm));
    }
    sims
}

fn sparse_dot(a_idx: &[usize], a_val: &[f32], b_idx: &[usize], b_val: &[f32]) -> f32 {
    let mut dot = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < a_idx.len() && j < b_idx.len() {
        match a_idx[i].cmp(&b_idx[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                dot += a_val[i] * b_val[j];
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn ngram_codes() {
        assert_eq!(NgramKind::Unigram.code(), "n1-1");
        assert_eq!(NgramKind::Bigram.code(), "n2-2");
        assert_eq!(NgramKind::Both.code(), "n1-2");
        assert!(matches!(NgramKind::parse("trigram"), Err(VectorError::UnknownNgram(_))));
    }

    #[test]
    fn bigrams_join_adjacent_tokens() {
        let grams = ngrams("deep neural network", 2, 2);
        assert_eq!(grams, vec!["deep neural", "neural network"]);
    }

    #[test]
    fn identical_document_scores_highest() {
        let corpus = docs(&[
            "sparse retrieval model",
            "neural machine translation model",
            "cats and dogs",
        ]);
        let (vec, matrix, _names) = Vectorizer::fit(&corpus, Representation::Tfidf, NgramKind::Unigram);
        let q = vec.transform("neural machine translation model");
        let sims = cosine_against_rows(&q, &matrix);
        assert_eq!(sims.len(), 3);
        let best = sims
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i);
        assert_eq!(best, Some(1));
        assert!(sims[1] > 0.99 && sims[1] <= 1.0 + 1e-6);
    }

    #[test]
    fn out_of_vocabulary_query_scores_zero() {
        let corpus = docs(&["alpha beta", "gamma delta"]);
        let (vec, matrix, _names) = Vectorizer::fit(&corpus, Representation::Binary, NgramKind::Unigram);
        let q = vec.transform("omega sigma");
        assert!(q.indices.is_empty());
        let sims = cosine_against_rows(&q, &matrix);
        assert!(sims.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn binary_ignores_repetition() {
        let corpus = docs(&["word word word", "word"]);
        let (vec, matrix, _names) = Vectorizer::fit(&corpus, Representation::Binary, NgramKind::Unigram);
        let q = vec.transform("word");
        let sims = cosine_against_rows(&q, &matrix);
        assert!((sims[0] - sims[1]).abs() < 1e-6);
    }

    #[test]
    fn feature_names_are_sorted() {
        let corpus = docs(&["zebra apple mango"]);
        let (_vec, _matrix, names) = Vectorizer::fit(&corpus, Representation::Frequency, NgramKind::Unigram);
        assert_eq!(names, vec!["apple", "mango", "zebra"]);
    }
}
