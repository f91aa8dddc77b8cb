use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Word runs plus the punctuation subset kept as standalone tokens.
    static ref TOKEN_RE: Regex = Regex::new(r"(?u)\w+|[?.,¿!]").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Normalize free text the way the corpus vector spaces were built: NFKC,
/// lowercase, tokenize keeping `? . , ¿ !` as their own tokens, reduce word
/// tokens to their lemma, and rejoin with single spaces.
///
/// Pure and deterministic. The same function must run at vectorization time
/// and at query time or similarity scores are meaningless.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.nfkc().collect::<String>().to_lowercase();
    let mut tokens: Vec<String> = Vec::new();
    for mat in TOKEN_RE.find_iter(&lowered) {
        let token = mat.as_str();
        if token.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            tokens.push(STEMMER.stem(token).to_string());
        } else {
            tokens.push(token.to_string());
        }
    }
    tokens.join(" ")
}
