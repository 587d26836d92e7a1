//! Bookmark export parsing.
//!
//! Browser exports are loosely structured markup where each saved link is an
//! anchor element. Parsing is best-effort: whatever anchors can be recovered
//! are returned and nothing here fails on malformed input.


use itertools::Itertools;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::ScoutError;

/// A single saved link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// The anchor text, may be empty
    pub title: String,
    /// The link target, never empty
    pub url: String,
}

impl Bookmark {
    #[inline]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Bookmarks in document order.
///
/// Positions are 1-based when exposed to the language model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkList(Vec<Bookmark>);

impl BookmarkList {
    #[inline]
    pub fn new(bookmarks: Vec<Bookmark>) -> Self {
        Self(bookmarks)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Bookmark> {
        self.0.iter()
    }

    /// Look up a bookmark by its 1-based position
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Bookmark> {
        index.checked_sub(1).and_then(|i| self.0.get(i))
    }

    #[inline]
    pub fn as_slice(&self) -> &[Bookmark] {
        &self.0
    }
}

impl From<Vec<Bookmark>> for BookmarkList {
    #[inline]
    fn from(bookmarks: Vec<Bookmark>) -> Self {
        Self(bookmarks)
    }
}

impl<'a> IntoIterator for &'a BookmarkList {
    type Item = &'a Bookmark;
    type IntoIter = std::slice::Iter<'a, Bookmark>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Extract every anchor with a non-empty link target from bookmark markup
#[inline]
pub fn parse_bookmark_html(markup: &str) -> BookmarkList {
    let document = Html::parse_document(markup);
    let anchor_selector = match Selector::parse("a") {
        Ok(selector) => selector,
        Err(e) => {
            warn!("Failed to create anchor selector: {:?}", e);
            return BookmarkList::default();
        }
    };

    let mut bookmarks = Vec::new();
    let mut skipped = 0_usize;

    for element in document.select(&anchor_selector) {
        let Some(href) = element
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
        else {
            skipped += 1;
            continue;
        };

        let title = element
            .text()
            .collect::<String>()
            .split_whitespace()
            .join(" ");
        bookmarks.push(Bookmark::new(title, href));
    }

    debug!(
        "Extracted {} bookmarks, skipped {} anchors without a link target",
        bookmarks.len(),
        skipped
    );

    BookmarkList(bookmarks)
}

/// Read a bookmark export from disk and parse it
#[inline]
pub fn load_bookmark_file(path: &Path) -> crate::Result<BookmarkList> {
    let bytes = fs::read(path).map_err(|e| {
        ScoutError::Bookmarks(format!("Failed to read bookmark file {}: {}", path.display(), e))
    })?;

    let markup = String::from_utf8_lossy(&bytes);
    let bookmarks = parse_bookmark_html(&markup);

    info!(
        "Loaded {} bookmarks from {}",
        bookmarks.len(),
        path.display()
    );
    Ok(bookmarks)
}
