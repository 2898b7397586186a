//! Listing traversal cursor

use std::collections::HashSet;

/// Position of the traversal: the next listing locator, or done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlCursor {
    Positioned(String),
    Done,
}

impl CrawlCursor {
    pub fn start(locator: impl Into<String>) -> Self {
        Self::Positioned(locator.into())
    }

    /// Cursor after a listing page: follow `next` if present, else done.
    pub fn advance(next: Option<String>) -> Self {
        next.map_or(Self::Done, Self::Positioned)
    }

    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn locator(&self) -> Option<&str> {
        match self {
            Self::Positioned(locator) => Some(locator),
            Self::Done => None,
        }
    }
}

/// Listing locators already fetched in the current crawl
#[derive(Debug, Default)]
pub struct VisitedPages {
    seen: HashSet<String>,
}

impl VisitedPages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the locator was already visited.
    pub fn mark(&mut self, locator: &str) -> bool {
        self.seen.insert(locator.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
