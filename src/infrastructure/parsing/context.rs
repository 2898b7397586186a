//! Parsing context for HTML extraction

/// Context for one listing page
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// 1-based position of the page in the traversal
    pub page_number: u32,

    /// Locator the document was fetched from
    pub locator: String,
}

impl ParseContext {
    pub fn new(page_number: u32, locator: impl Into<String>) -> Self {
        Self {
            page_number,
            locator: locator.into(),
        }
    }
}

/// Context for one detail page
#[derive(Debug, Clone)]
pub struct DetailParseContext {
    /// Detail locator being parsed
    pub locator: String,

    /// Listing page the item came from
    pub source_page: Option<u32>,

    /// Index within the listing page
    pub source_index: Option<usize>,
}

impl DetailParseContext {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            source_page: None,
            source_index: None,
        }
    }

    pub fn with_source(mut self, page_number: u32, index: usize) -> Self {
        self.source_page = Some(page_number);
        self.source_index = Some(index);
        self
    }
}
