// Catalog - Playable sequences offered by a provider
//
// Providers are synchronous; the UI fetches through `CatalogLoader` so the
// frame loop never waits on I/O.

pub mod loader;
pub mod provider;

pub use loader::CatalogLoader;
pub use provider::{CatalogError, JsonFileProvider, SequenceProvider, StaticProvider};

/// One playable sequence
///
/// Serialized as `{"title", "url", "format"}`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Sequence {
    pub title: String,
    #[serde(rename = "url")]
    pub locator: String,
    pub format: String,
}

impl Sequence {
    pub fn new(title: impl Into<String>, locator: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            locator: locator.into(),
            format: format.into(),
        }
    }

    /// Human readable title
    ///
    /// Catalog titles look like `Song_Name_Key`: the last `_` segment is
    /// dropped and the rest joined with spaces. Titles without `_` are kept.
    pub fn display_title(&self) -> String {
        let parts: Vec<&str> = self.title.split('_').collect();
        if parts.len() < 2 {
            return self.title.clone();
        }
        parts[..parts.len() - 1].join(" ")
    }

    /// Matches `key` against the locator or the raw title
    pub fn matches_key(&self, key: &str) -> bool {
        self.locator == key || self.title == key
    }
}

/// What the UI knows about the catalog
#[derive(Debug, Clone, Default)]
pub enum CatalogState {
    #[default]
    Loading,
    Ready(Vec<Sequence>),
    Failed(String),
}

impl CatalogState {
    /// Loaded sequences; empty while loading or after a failure
    pub fn sequences(&self) -> &[Sequence] {
        match self {
            CatalogState::Ready(sequences) => sequences,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, CatalogState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CatalogState::Failed(message) => Some(message),
            _ => None,
        }
    }
}
