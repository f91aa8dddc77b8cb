use crate::vector::{CsrMatrix, NgramKind, Representation, Vectorizer};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Build metadata carried inside each persisted vector space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceMeta {
    pub corpus: String,
    pub field: String,
    pub rep: String,
    pub ngram_min: usize,
    pub ngram_max: usize,
    pub built_at: String,
}

/// One persisted vector-space artifact: the fitted vectorizer, the sparse
/// document-term matrix, the sorted feature names, the row-aligned document
/// identifiers, and build metadata. Immutable once loaded.
#[derive(Debug, Serialize, Deserialize)]
pub struct VectorSpace {
    pub vectorizer: Vectorizer,
    pub matrix: CsrMatrix,
    pub feature_names: Vec<String>,
    pub doc_ids: Vec<u32>,
    pub meta: SpaceMeta,
}

#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("vector space artifact not found: {0}")]
    NotFound(PathBuf),
    #[error("artifact {0} does not contain a usable vectorizer/matrix pair")]
    Malformed(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Resolves artifact and corpus-table locations under one base directory.
pub struct ArtifactPaths {
    pub base: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(base: P) -> Self {
        Self { base: base.as_ref().to_path_buf() }
    }

    pub fn vectors_dir(&self) -> PathBuf {
        self.base.join("vectors")
    }

    /// Artifact naming contract, kept bit-exact for interoperability with
    /// existing stored spaces: `{corpus}_{field}_{rep}_{code}.pkl` with the
    /// field lowercased.
    pub fn space_file(&self, corpus: &str, field: &str, rep: Representation, kind: NgramKind) -> PathBuf {
        let name = format!("{}_{}_{}_{}.pkl", corpus, field.to_lowercase(), rep.as_str(), kind.code());
        self.vectors_dir().join(name)
    }

    pub fn corpus_table(&self, corpus: &str) -> PathBuf {
        self.base.join("corpus").join(format!("{corpus}_raw_corpus.csv"))
    }
}

/// Persist a vector space under its canonical file name, derived from the
/// embedded metadata. Returns the path written.
pub fn save_space(paths: &ArtifactPaths, space: &VectorSpace) -> anyhow::Result<PathBuf> {
    let dir = paths.vectors_dir();
    create_dir_all(&dir)?;
    let name = format!(
        "{}_{}_{}_n{}-{}.pkl",
        space.meta.corpus,
        space.meta.field.to_lowercase(),
        space.meta.rep,
        space.meta.ngram_min,
        space.meta.ngram_max,
    );
    let path = dir.join(name);
    let mut f = File::create(&path)?;
    let bytes = bincode::serialize(space)?;
    f.write_all(&bytes)?;
    Ok(path)
}

/// Load the vector space for one corpus/field/representation/n-gram
/// configuration. A missing file is `SpaceError::NotFound`; undecodable
/// content, an empty vocabulary, or a matrix whose rows do not line up with
/// the document identifiers is `SpaceError::Malformed`.
pub fn load_space(
    paths: &ArtifactPaths,
    corpus: &str,
    field: &str,
    rep: Representation,
    kind: NgramKind,
) -> Result<VectorSpace, SpaceError> {
    let path = paths.space_file(corpus, field, rep, kind);
    if !path.exists() {
        return Err(SpaceError::NotFound(path));
    }
    debug!(path = %path.display(), "loading vector space");
    let mut f = File::open(&path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let space: VectorSpace =
        bincode::deserialize(&buf).map_err(|_| SpaceError::Malformed(path.clone()))?;
    if space.vectorizer.vocabulary.is_empty() || space.matrix.rows() != space.doc_ids.len() {
        return Err(SpaceError::Malformed(path));
    }
    Ok(space)
}
