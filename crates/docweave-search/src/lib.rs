//! Search-fragment extraction for rendered documentation pages.
//!
//! Walks a page's rendered HTML in a single streaming pass (no DOM) and
//! slices its visible text into overlapping fixed-size fragments, each
//! tagged with the nearest preceding heading anchor. The per-page
//! fragment maps are merged by the caller into one client-side search
//! payload.
//!
//! # Example
//!
//! ```
//! use docweave_search::{PageRef, SearchIndexer};
//!
//! let indexer = SearchIndexer::with_overlap(40, 2).unwrap();
//! let page = PageRef {
//!     id: "guide",
//!     title: "Guide",
//!     url: "/guide/",
//! };
//! let docs = indexer.index_page(
//!     &page,
//!     "<h2 id=\"setup\">Setup</h2><p>Install the tool and run it once to verify.</p>",
//! );
//! let fragment = &docs["guide-1"];
//! assert_eq!(fragment.title, "Setup");
//! assert_eq!(fragment.url, "/guide/#setup");
//! ```
//!
//! Fragment sizing is validated eagerly at construction; indexing a page
//! never fails — unparseable markup degrades by stopping the walk.

mod entities;
mod extractor;

use std::collections::BTreeMap;

use thiserror::Error;

/// Default fragment size in characters.
pub const DEFAULT_FRAGMENT_SIZE: usize = 240;

/// Invalid indexer configuration.
///
/// Rejected at construction time; a zero fragment size or an overlap at
/// least as large as the fragment would make fragmenting loop without
/// progress.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexerError {
    #[error("fragment size must be greater than zero")]
    ZeroFragmentSize,
    #[error("overlap size {overlap} must be smaller than fragment size {fragment}")]
    OverlapTooLarge { overlap: usize, fragment: usize },
}

/// Identity of the page being indexed.
#[derive(Clone, Copy, Debug)]
pub struct PageRef<'a> {
    /// Stable page id; fragment ids are `{id}-{n}`.
    pub id: &'a str,
    /// Page title, used when no heading precedes a fragment.
    pub title: &'a str,
    /// Canonical page URL.
    pub url: &'a str,
}

/// One indexable slice of a page's visible text.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchFragment {
    /// Nearest enclosing heading text, or the page title.
    pub title: String,
    /// Whitespace-collapsed visible text.
    pub content: String,
    /// The page URL (used to group fragments per page).
    pub section: String,
    /// Deep link: page URL plus `#anchor` when inside a heading scope.
    pub url: String,
}

/// Extracts overlapping search fragments from rendered HTML.
#[derive(Debug)]
pub struct SearchIndexer {
    fragment_size: usize,
    overlap_size: usize,
}

impl Default for SearchIndexer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAGMENT_SIZE).expect("default fragment size is valid")
    }
}

impl SearchIndexer {
    /// Create an indexer; the overlap defaults to a twentieth of the
    /// fragment size.
    pub fn new(fragment_size: usize) -> Result<Self, IndexerError> {
        Self::with_overlap(fragment_size, fragment_size / 20)
    }

    /// Create an indexer with an explicit overlap size.
    pub fn with_overlap(fragment_size: usize, overlap_size: usize) -> Result<Self, IndexerError> {
        if fragment_size == 0 {
            return Err(IndexerError::ZeroFragmentSize);
        }
        if overlap_size >= fragment_size {
            return Err(IndexerError::OverlapTooLarge {
                overlap: overlap_size,
                fragment: fragment_size,
            });
        }
        Ok(Self {
            fragment_size,
            overlap_size,
        })
    }

    /// Fragment size in characters.
    #[must_use]
    pub fn fragment_size(&self) -> usize {
        self.fragment_size
    }

    /// Overlap carried between adjacent fragments, in characters.
    #[must_use]
    pub fn overlap_size(&self) -> usize {
        self.overlap_size
    }

    /// Index one page's rendered HTML.
    ///
    /// Returns a map from fragment id (`{page-id}-{n}`, `n` starting at
    /// 1) to fragment. A final remainder no longer than the overlap is
    /// dropped rather than emitted.
    #[must_use]
    pub fn index_page(&self, page: &PageRef<'_>, html: &str) -> BTreeMap<String, SearchFragment> {
        extractor::extract(page, html, self.fragment_size, self.overlap_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sizes() {
        let indexer = SearchIndexer::default();
        assert_eq!(indexer.fragment_size(), 240);
        assert_eq!(indexer.overlap_size(), 12);
    }

    #[test]
    fn test_zero_fragment_size_rejected() {
        assert_eq!(
            SearchIndexer::new(0).unwrap_err(),
            IndexerError::ZeroFragmentSize
        );
    }

    #[test]
    fn test_overlap_must_be_smaller() {
        assert_eq!(
            SearchIndexer::with_overlap(10, 10).unwrap_err(),
            IndexerError::OverlapTooLarge {
                overlap: 10,
                fragment: 10
            }
        );
        assert!(SearchIndexer::with_overlap(10, 9).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_fragment_serializes() {
        let fragment = SearchFragment {
            title: "Setup".to_owned(),
            content: "Install the tool".to_owned(),
            section: "/guide/".to_owned(),
            url: "/guide/#setup".to_owned(),
        };
        let json = serde_json::to_string(&fragment).unwrap();
        assert!(json.contains("\"section\":\"/guide/\""));
    }
}
