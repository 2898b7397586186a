//! Parsing configuration for HTML extraction
//!
//! Centralized CSS selectors and the catalogue roots used to resolve
//! relative locators.

use serde::{Deserialize, Serialize};

use crate::infrastructure::config::defaults;

/// Main parsing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// Root of the site (network base URL or local directory)
    pub site_root: String,

    /// Directory segment under the site root holding listing and detail pages
    pub catalogue_dir: String,

    pub listing_selectors: ListingSelectors,

    pub detail_selectors: DetailSelectors,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            site_root: defaults::SITE_ROOT.to_string(),
            catalogue_dir: defaults::CATALOGUE_DIR.to_string(),
            listing_selectors: ListingSelectors::default(),
            detail_selectors: DetailSelectors::default(),
        }
    }
}

impl ParsingConfig {
    pub fn with_roots(site_root: impl Into<String>, catalogue_dir: impl Into<String>) -> Self {
        Self {
            site_root: site_root.into(),
            catalogue_dir: catalogue_dir.into(),
            ..Self::default()
        }
    }

    /// Site root with exactly one trailing slash
    pub fn site_root(&self) -> String {
        format!("{}/", self.site_root.trim_end_matches('/'))
    }

    /// Catalogue directory with no leading and one trailing slash
    pub fn catalogue_segment(&self) -> String {
        let segment = self.catalogue_dir.trim_matches('/');
        if segment.is_empty() {
            String::new()
        } else {
            format!("{segment}/")
        }
    }

    /// Root that detail hrefs and bare listing hrefs resolve against
    pub fn catalogue_root(&self) -> String {
        format!("{}{}", self.site_root(), self.catalogue_segment())
    }
}

/// CSS selectors for listing pages. Each list is tried in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    pub item_container: Vec<String>,
    pub item_link: Vec<String>,
    pub price: Vec<String>,
    pub rating: Vec<String>,
    pub availability: Vec<String>,
    pub next_link: Vec<String>,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            item_container: vec![
                "article.product_pod".to_string(),
                "li article".to_string(),
            ],
            item_link: vec!["h3 a".to_string(), "a[title]".to_string()],
            price: vec!["p.price_color".to_string(), ".price_color".to_string()],
            rating: vec!["p.star-rating".to_string()],
            availability: vec![
                "p.instock.availability".to_string(),
                "p.availability".to_string(),
            ],
            next_link: vec!["li.next a".to_string()],
        }
    }
}

/// CSS selectors and table keys for detail pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailSelectors {
    pub breadcrumb_links: Vec<String>,
    pub info_table: Vec<String>,
    pub description_anchor: Vec<String>,
    pub table_keys: DetailTableKeys,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            breadcrumb_links: vec!["ul.breadcrumb li a".to_string()],
            info_table: vec![
                "table.table.table-striped".to_string(),
                "table.table-striped".to_string(),
            ],
            description_anchor: vec!["#product_description".to_string()],
            table_keys: DetailTableKeys::default(),
        }
    }
}

/// Header cells of the product information table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailTableKeys {
    pub identifier_code: String,
    pub product_kind: String,
    pub price_excl_tax: String,
    pub price_incl_tax: String,
    pub tax: String,
    pub availability: String,
    pub review_count: String,
}

impl Default for DetailTableKeys {
    fn default() -> Self {
        Self {
            identifier_code: "UPC".to_string(),
            product_kind: "Product Type".to_string(),
            price_excl_tax: "Price (excl. tax)".to_string(),
            price_incl_tax: "Price (incl. tax)".to_string(),
            tax: "Tax".to_string(),
            availability: "Availability".to_string(),
            review_count: "Number of reviews".to_string(),
        }
    }
}
