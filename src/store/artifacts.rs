use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
    models::CatalogRecord,
    services::{
        catalog::{Catalog, CatalogError},
        similarity::{MatrixError, SimilarityIndex, SimilarityMatrix},
    },
};

/// Errors raised while loading the persisted catalog and similarity artifacts
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed artifact {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("invalid similarity matrix: {0}")]
    Matrix(#[from] MatrixError),

    #[error("similarity matrix has {rows} rows but catalog has {items} items")]
    SizeMismatch { items: usize, rows: usize },
}

/// Catalog plus similarity index, loaded once and read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub catalog: Catalog,
    pub index: SimilarityIndex,
}

impl Dataset {
    /// Pairs a catalog with an index, requiring one matrix row per item
    ///
    /// An unavailable index pairs with any catalog.
    pub fn new(catalog: Catalog, index: SimilarityIndex) -> Result<Self, LoadError> {
        if let Some(rows) = index.size() {
            if rows != catalog.size() {
                return Err(LoadError::SizeMismatch {
                    items: catalog.size(),
                    rows,
                });
            }
        }
        Ok(Self { catalog, index })
    }

    /// Loads both artifacts
    ///
    /// A catalog failure is returned as an error. A similarity matrix failure is
    /// logged and yields a dataset whose index is unavailable, so catalog listing
    /// and search keep working.
    pub fn load(
        catalog_path: impl AsRef<Path>,
        similarity_path: impl AsRef<Path>,
    ) -> Result<Self, LoadError> {
        let catalog = load_catalog(catalog_path.as_ref())?;

        let index = match load_matrix(similarity_path.as_ref(), catalog.size()) {
            Ok(matrix) => SimilarityIndex::new(matrix),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %similarity_path.as_ref().display(),
                    "Similarity matrix unavailable, starting in degraded mode"
                );
                SimilarityIndex::unavailable()
            }
        };

        tracing::info!(
            items = catalog.size(),
            index_loaded = index.is_loaded(),
            "Dataset loaded"
        );

        Self::new(catalog, index)
    }
}

/// Loads the item table: a JSON array of `{"id": .., "title": ..}` records
pub fn load_catalog(path: &Path) -> Result<Catalog, LoadError> {
    let records: Vec<CatalogRecord> = read_json(path)?;
    Ok(Catalog::from_records(records)?)
}

/// Loads a JSON array of rows and checks it is square with `expected_dim` rows
pub fn load_matrix(path: &Path, expected_dim: usize) -> Result<SimilarityMatrix, LoadError> {
    let rows: Vec<Vec<f64>> = read_json(path)?;

    if rows.len() != expected_dim {
        return Err(LoadError::SizeMismatch {
            items: expected_dim,
            rows: rows.len(),
        });
    }

    Ok(SimilarityMatrix::from_rows(rows)?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::Missing(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|e| LoadError::Malformed {
        path: path.to_path_buf(),
        source: e,
    })
}
