use litsim_core::persist::{load_space, save_space, ArtifactPaths, SpaceError, SpaceMeta, VectorSpace};
use litsim_core::vector::{NgramKind, Representation, Vectorizer};
use std::fs;

fn build_space(corpus: &str, field: &str, rep: Representation, kind: NgramKind) -> VectorSpace {
    let docs: Vec<String> = vec![
        "sparse vector retrieval".to_string(),
        "dense passage retrieval".to_string(),
    ];
    let (vectorizer, matrix, feature_names) = Vectorizer::fit(&docs, rep, kind);
    let (min, max) = kind.range();
    VectorSpace {
        vectorizer,
        matrix,
        feature_names,
        doc_ids: vec![0, 1],
        meta: SpaceMeta {
            corpus: corpus.to_string(),
            field: field.to_string(),
            rep: rep.as_str().to_string(),
            ngram_min: min,
            ngram_max: max,
            built_at: String::new(),
        },
    }
}

#[test]
fn save_uses_the_artifact_naming_contract() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = ArtifactPaths::new(dir.path());
    let space = build_space("arxiv", "Abstract", Representation::Tfidf, NgramKind::Unigram);
    let written = save_space(&paths, &space).expect("save");
    assert_eq!(
        written,
        dir.path().join("vectors").join("arxiv_abstract_tfidf_n1-1.pkl")
    );

    let loaded = load_space(&paths, "arxiv", "Abstract", Representation::Tfidf, NgramKind::Unigram)
        .expect("load");
    assert_eq!(loaded.matrix.rows(), 2);
    assert_eq!(loaded.feature_names, space.feature_names);
}

#[test]
fn missing_artifact_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = ArtifactPaths::new(dir.path());
    let err = load_space(&paths, "pubmed", "Title", Representation::Binary, NgramKind::Bigram)
        .expect_err("must fail");
    assert!(matches!(err, SpaceError::NotFound(_)));
}

#[test]
fn undecodable_artifact_is_malformed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = ArtifactPaths::new(dir.path());
    let path = paths.space_file("arxiv", "Title", Representation::Frequency, NgramKind::Unigram);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(&path, b"not a vector space").expect("write junk");

    let err = load_space(&paths, "arxiv", "Title", Representation::Frequency, NgramKind::Unigram)
        .expect_err("must fail");
    assert!(matches!(err, SpaceError::Malformed(_)));
}

#[test]
fn doc_id_mismatch_is_malformed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = ArtifactPaths::new(dir.path());
    let mut space = build_space("arxiv", "Title", Representation::Tfidf, NgramKind::Both);
    space.doc_ids.pop();
    save_space(&paths, &space).expect("save");

    let err = load_space(&paths, "arxiv", "Title", Representation::Tfidf, NgramKind::Both)
        .expect_err("must fail");
    assert!(matches!(err, SpaceError::Malformed(_)));
}
