// Sequence providers

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::Sequence;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No sequence matches \"{0}\"")]
    NotFound(String),
}

/// Source of playable sequences
pub trait SequenceProvider {
    /// Every sequence in the catalog
    fn fetch_all(&self) -> Result<Vec<Sequence>, CatalogError>;

    /// First sequence whose title contains `query` (case-insensitive)
    fn search(&self, query: &str) -> Result<Sequence, CatalogError> {
        let needle = query.trim().to_lowercase();
        self.fetch_all()?
            .into_iter()
            .find(|s| s.title.to_lowercase().contains(&needle))
            .ok_or_else(|| CatalogError::NotFound(query.to_string()))
    }
}

/// Catalog kept in memory
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    sequences: Vec<Sequence>,
}

impl StaticProvider {
    pub fn new(sequences: Vec<Sequence>) -> Self {
        Self { sequences }
    }

    /// Parse a JSON array in the catalog wire format
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }
}

impl SequenceProvider for StaticProvider {
    fn fetch_all(&self) -> Result<Vec<Sequence>, CatalogError> {
        Ok(self.sequences.clone())
    }
}

/// Catalog read from a JSON file on every fetch
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SequenceProvider for JsonFileProvider {
    fn fetch_all(&self) -> Result<Vec<Sequence>, CatalogError> {
        let json = fs::read_to_string(&self.path)?;
        let sequences: Vec<Sequence> = serde_json::from_str(&json)?;
        log::debug!(
            "Loaded {} sequences from {}",
            sequences.len(),
            self.path.display()
        );
        Ok(sequences)
    }
}
