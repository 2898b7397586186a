//! HTML parsing infrastructure
//!
//! Trait-based parsers for the two document kinds of a catalogue: listing
//! pages and detail pages. Selectors are ordered fallback lists compiled
//! once per parser.

pub mod config;
pub mod context;
pub mod detail_parser;
pub mod error;
pub mod listing_parser;
pub mod locator;

pub use config::{DetailSelectors, DetailTableKeys, ListingSelectors, ParsingConfig};
pub use context::{DetailParseContext, ParseContext};
pub use detail_parser::DetailPageParser;
pub use error::{ParsingError, ParsingResult};
pub use listing_parser::{ListingPage, ListingPageParser};

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// Parser trait with context support
pub trait ContextualParser {
    type Output;
    type Context;

    /// Parse HTML with contextual information
    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output>;
}

/// Compile a fallback list of selectors.
///
/// Invalid entries are skipped with a warning; a list where nothing compiles
/// is a configuration error.
pub fn compile_selectors(selectors: &[String]) -> ParsingResult<Vec<Selector>> {
    let compiled: Vec<Selector> = selectors
        .iter()
        .filter_map(|raw| match Selector::parse(raw) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!("Skipping invalid selector '{}': {}", raw, e);
                None
            }
        })
        .collect();

    if compiled.is_empty() {
        return Err(ParsingError::ConfigurationError {
            message: format!("no usable selector in {selectors:?}"),
        });
    }
    Ok(compiled)
}

/// Text content of an element with whitespace runs collapsed to single spaces.
pub fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
