//! Detail page parser
//!
//! Every detail attribute is looked up independently. A lookup that finds
//! nothing yields `None` for that field and never affects the others, so
//! parsing a detail page cannot fail.

use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::config::{DetailTableKeys, ParsingConfig};
use super::context::DetailParseContext;
use super::locator::{normalize_count, normalize_decimal};
use super::{compile_selectors, element_text, ParsingError, ParsingResult};
use crate::domain::product::ItemDetail;

/// Position of the category link in the breadcrumb trail (Home > Books > Category > Title)
const CATEGORY_BREADCRUMB_INDEX: usize = 2;

/// Parser for item detail pages
pub struct DetailPageParser {
    breadcrumb_selectors: Vec<Selector>,
    info_table_selectors: Vec<Selector>,
    description_anchor_selectors: Vec<Selector>,
    row_selector: Selector,
    cell_selector: Selector,
    keys: DetailTableKeys,
}

impl DetailPageParser {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ParsingConfig::default())
    }

    pub fn with_config(config: &ParsingConfig) -> ParsingResult<Self> {
        let selectors = &config.detail_selectors;
        Ok(Self {
            breadcrumb_selectors: compile_selectors(&selectors.breadcrumb_links)?,
            info_table_selectors: compile_selectors(&selectors.info_table)?,
            description_anchor_selectors: compile_selectors(&selectors.description_anchor)?,
            row_selector: parse_selector("tr")?,
            cell_selector: parse_selector("th, td")?,
            keys: selectors.table_keys.clone(),
        })
    }

    /// Parse raw detail HTML.
    pub fn parse_detail(&self, document: &str, context: &DetailParseContext) -> ItemDetail {
        let html = Html::parse_document(document);
        self.extract_detail(&html, context)
    }

    fn extract_detail(&self, html: &Html, context: &DetailParseContext) -> ItemDetail {
        let table = self.extract_table(html);
        let keys = &self.keys;
        let text = |key: &str| table.get(key).cloned();
        let decimal = |field: &str, key: &str| {
            let raw = table.get(key)?;
            let value = normalize_decimal(raw);
            if value.is_none() {
                debug!("Ignoring non-numeric {} '{}' on {}", field, raw, context.locator);
            }
            value
        };

        let review_count = table.get(&keys.review_count).and_then(|raw| {
            let value = normalize_count(raw);
            if value.is_none() {
                debug!("Ignoring non-numeric review count '{}' on {}", raw, context.locator);
            }
            value
        });

        let detail = ItemDetail {
            identifier_code: text(&keys.identifier_code),
            product_kind: text(&keys.product_kind),
            price_excl_tax: decimal("price_excl_tax", &keys.price_excl_tax),
            price_incl_tax: decimal("price_incl_tax", &keys.price_incl_tax),
            tax: decimal("tax", &keys.tax),
            availability_detail: text(&keys.availability),
            review_count,
            category: self.extract_category(html),
            description: self.extract_description(html),
        };

        debug!(
            "Parsed detail {} (page {}, item {}, {} table fields, category: {})",
            context.locator,
            context.source_page.map_or_else(|| "-".to_string(), |page| page.to_string()),
            context.source_index.map_or_else(|| "-".to_string(), |index| index.to_string()),
            table.len(),
            detail.category.as_deref().unwrap_or("-")
        );
        detail
    }

    fn extract_category(&self, html: &Html) -> Option<String> {
        self.breadcrumb_selectors.iter().find_map(|selector| {
            html.select(selector)
                .nth(CATEGORY_BREADCRUMB_INDEX)
                .map(|link| element_text(&link))
        })
    }

    /// First two cells of every row in the first matching table, keyed by the
    /// header text. A repeated key keeps the value of its last row.
    fn extract_table(&self, html: &Html) -> HashMap<String, String> {
        let mut data = HashMap::new();
        let Some(table) = self
            .info_table_selectors
            .iter()
            .find_map(|selector| html.select(selector).next())
        else {
            return data;
        };

        for row in table.select(&self.row_selector) {
            let mut cells = row.select(&self.cell_selector);
            if let (Some(key), Some(value)) = (cells.next(), cells.next()) {
                data.insert(element_text(&key), element_text(&value));
            }
        }
        data
    }

    fn extract_description(&self, html: &Html) -> Option<String> {
        let anchor = self
            .description_anchor_selectors
            .iter()
            .find_map(|selector| html.select(selector).next())?;
        anchor
            .next_siblings()
            .find_map(ElementRef::wrap)
            .map(|sibling| element_text(&sibling))
    }
}

fn parse_selector(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, &e.to_string()))
}
