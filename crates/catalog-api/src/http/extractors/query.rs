//! Query parameter extractors for list and fetch endpoints.

use serde::Deserialize;

use catalog_types::page::PageRequest;

/// Query parameters for paged listings.
#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    /// Number of items to skip.
    #[serde(default)]
    pub offset: u64,
    /// Maximum results; zero or absent means the configured default.
    #[serde(default)]
    pub limit: u64,
}

impl From<PageQuery> for PageRequest {
    fn from(q: PageQuery) -> Self {
        PageRequest::new(q.offset, q.limit)
    }
}

/// Query parameters for single-revision fetches.
#[derive(Debug, Deserialize, Default)]
pub struct RevisionQuery {
    /// Any value requests the raw document instead of metadata.
    pub alt: Option<String>,
}

impl RevisionQuery {
    pub fn raw(&self) -> bool {
        self.alt.is_some()
    }
}
