//! Listing page parser
//!
//! Extracts the ordered item summaries and the optional "next" locator from
//! one catalogue listing page. Document order of the item containers is the
//! canonical record order for the whole crawl.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use super::config::ParsingConfig;
use super::locator::{normalize_decimal, resolve_detail_href, resolve_next_href};
use super::{compile_selectors, element_text, ContextualParser, ParseContext, ParsingError, ParsingResult};
use crate::domain::product::ItemSummary;
use crate::domain::rating::{Rating, DEFAULT_RATING_WORD};

/// Result of parsing one listing page
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    pub summaries: Vec<ItemSummary>,
    pub next_locator: Option<String>,
}

/// Parser for catalogue listing pages
pub struct ListingPageParser {
    config: ParsingConfig,
    container_selectors: Vec<Selector>,
    link_selectors: Vec<Selector>,
    price_selectors: Vec<Selector>,
    rating_selectors: Vec<Selector>,
    availability_selectors: Vec<Selector>,
    next_selectors: Vec<Selector>,
}

impl ListingPageParser {
    /// Create a listing parser with default selectors and roots
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ParsingConfig::default())
    }

    pub fn with_config(config: &ParsingConfig) -> ParsingResult<Self> {
        let selectors = &config.listing_selectors;
        Ok(Self {
            config: config.clone(),
            container_selectors: compile_selectors(&selectors.item_container)?,
            link_selectors: compile_selectors(&selectors.item_link)?,
            price_selectors: compile_selectors(&selectors.price)?,
            rating_selectors: compile_selectors(&selectors.rating)?,
            availability_selectors: compile_selectors(&selectors.availability)?,
            next_selectors: compile_selectors(&selectors.next_link)?,
        })
    }

    /// Parse raw listing HTML.
    pub fn parse_listing(&self, document: &str, context: &ParseContext) -> ParsingResult<ListingPage> {
        let html = Html::parse_document(document);
        self.parse_with_context(&html, context)
    }

    fn item_containers<'a>(&self, html: &'a Html) -> Vec<ElementRef<'a>> {
        for selector in &self.container_selectors {
            let containers: Vec<_> = html.select(selector).collect();
            if !containers.is_empty() {
                return containers;
            }
        }
        Vec::new()
    }

    fn extract_summary(&self, item: &ElementRef, index: usize) -> ParsingResult<ItemSummary> {
        let link = first_match(item, &self.link_selectors)
            .ok_or_else(|| ParsingError::required_field_missing("title", index))?;

        let title = link
            .value()
            .attr("title")
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map_or_else(|| element_text(&link), str::to_string);
        if title.is_empty() {
            return Err(ParsingError::required_field_missing("title", index));
        }

        let href = link
            .value()
            .attr("href")
            .filter(|href| !href.trim().is_empty())
            .ok_or_else(|| ParsingError::required_field_missing("detail_locator", index))?;
        let detail_locator = resolve_detail_href(href, &self.config);

        let price_text = first_match(item, &self.price_selectors)
            .map(|element| element_text(&element))
            .ok_or_else(|| ParsingError::required_field_missing("price", index))?;
        let price = normalize_decimal(&price_text).ok_or_else(|| {
            ParsingError::invalid_field("price", index, &price_text, "no decimal number in text")
        })?;

        let rating = self.extract_rating(item);

        let availability_text = first_match(item, &self.availability_selectors)
            .map(|element| element_text(&element))
            .ok_or_else(|| ParsingError::required_field_missing("availability", index))?;

        trace!("Item {}: '{}' -> {}", index, title, detail_locator);

        Ok(ItemSummary {
            title,
            detail_locator,
            price,
            rating,
            availability_text,
        })
    }

    /// The rating word is the second class token; a missing element or a
    /// single-token class list falls back to the "Zero" word.
    fn extract_rating(&self, item: &ElementRef) -> Rating {
        let word = first_match(item, &self.rating_selectors)
            .and_then(|element| {
                element
                    .value()
                    .attr("class")
                    .and_then(|classes| classes.split_whitespace().nth(1))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_RATING_WORD.to_string());
        Rating::decode(&word)
    }

    fn extract_next_locator(&self, html: &Html) -> Option<String> {
        self.next_selectors
            .iter()
            .find_map(|selector| {
                html.select(selector)
                    .find_map(|element| element.value().attr("href").map(str::to_string))
            })
            .filter(|href| !href.trim().is_empty())
            .map(|href| resolve_next_href(&href, &self.config))
    }
}

impl ContextualParser for ListingPageParser {
    type Output = ListingPage;
    type Context = ParseContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output> {
        debug!("Parsing listing page {} ({})", context.page_number, context.locator);

        let summaries = self
            .item_containers(html)
            .iter()
            .enumerate()
            .map(|(index, item)| self.extract_summary(item, index))
            .collect::<ParsingResult<Vec<_>>>()?;

        let next_locator = self.extract_next_locator(html);

        debug!(
            "Extracted {} summaries from page {} (next: {})",
            summaries.len(),
            context.page_number,
            next_locator.as_deref().unwrap_or("none")
        );

        Ok(ListingPage {
            summaries,
            next_locator,
        })
    }
}

fn first_match<'a>(element: &ElementRef<'a>, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .find_map(|selector| element.select(selector).next())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ListingPageParser {
        ListingPageParser::with_config(&ParsingConfig::with_roots("https://books.example.com", "catalogue"))
            .unwrap()
    }

    fn item(title_attr: Option<&str>, text: &str, href: &str, price: &str, classes: &str, stock: &str) -> String {
        let title = title_attr.map(|t| format!(r#" title="{t}""#)).unwrap_or_default();
        format!(
            r#"<article class="product_pod">
                <h3><a href="{href}"{title}>{text}</a></h3>
                <div class="product_price">
                    <p class="price_color">{price}</p>
                    <p class="instock availability"><i class="icon-ok"></i>
                        {stock}
                    </p>
                </div>
                <p class="{classes}"></p>
            </article>"#
        )
    }

    fn page(items: &[String], next: Option<&str>) -> String {
        let next = next
            .map(|href| format!(r#"<ul class="pager"><li class="next"><a href="{href}">next</a></li></ul>"#))
            .unwrap_or_default();
        format!(
            "<html><body><ol class=\"row\">{}</ol>{next}</body></html>",
            items.iter().map(|i| format!("<li>{i}</li>")).collect::<String>()
        )
    }

    #[test]
    fn test_parser_creation() {
        assert!(ListingPageParser::new().is_ok());
    }

    #[test]
    fn test_items_in_document_order_without_next() {
        let items: Vec<_> = (0..5)
            .map(|i| item(Some(format!("Book {i}").as_str()), "short", &format!("../../book-{i}/index.html"), "£1.00", "star-rating One", "In stock"))
            .collect();
        let listing = parser()
            .parse_listing(&page(&items, None), &ParseContext::new(1, "index.html"))
            .unwrap();

        assert_eq!(listing.summaries.len(), 5);
        assert!(listing.next_locator.is_none());
        for (i, summary) in listing.summaries.iter().enumerate() {
            assert_eq!(summary.title, format!("Book {i}"));
            assert_eq!(
                summary.detail_locator,
                format!("https://books.example.com/catalogue/book-{i}/index.html")
            );
        }
    }

    #[test]
    fn test_field_normalization() {
        let items = vec![
            item(Some("Alpha"), "Alp...", "alpha.html", "£12.50", "star-rating Three", "In stock (5 available)"),
            item(None, "Beta", "beta.html", "£7.00", "star-rating Zero-typo", "In stock (1 available)"),
            item(Some("Gamma"), "Gam...", "gamma.html", "£3", "star-rating", "Out of stock"),
        ];
        let listing = parser()
            .parse_listing(&page(&items, Some("page-2.html")), &ParseContext::new(1, "index.html"))
            .unwrap();

        let alpha = &listing.summaries[0];
        assert_eq!(alpha.title, "Alpha");
        assert!((alpha.price - 12.5).abs() < f64::EPSILON);
        assert_eq!(alpha.rating.value(), 3);
        assert_eq!(alpha.availability_text, "In stock (5 available)");

        let beta = &listing.summaries[1];
        assert_eq!(beta.title, "Beta");
        assert_eq!(beta.rating.value(), 0);

        assert_eq!(listing.summaries[2].rating.value(), 0);
        assert_eq!(
            listing.next_locator.as_deref(),
            Some("https://books.example.com/catalogue/page-2.html")
        );
    }

    #[test]
    fn test_missing_price_is_structural_failure() {
        let broken = r#"<article class="product_pod">
                <h3><a href="x.html" title="X">X</a></h3>
                <p class="instock availability">In stock</p>
            </article>"#
            .to_string();
        let err = parser()
            .parse_listing(&page(&[broken], None), &ParseContext::new(1, "index.html"))
            .unwrap_err();
        assert_eq!(err, ParsingError::required_field_missing("price", 0));
        assert!(err.is_structural());
    }

    #[test]
    fn test_unparseable_price_is_structural_failure() {
        let items = vec![item(Some("X"), "X", "x.html", "free", "star-rating One", "In stock")];
        let err = parser()
            .parse_listing(&page(&items, None), &ParseContext::new(1, "index.html"))
            .unwrap_err();
        assert!(matches!(err, ParsingError::InvalidField { ref field, .. } if field == "price"));
    }

    #[test]
    fn test_missing_title_is_structural_failure() {
        let items = vec![item(None, "   ", "x.html", "£1", "star-rating One", "In stock")];
        let err = parser()
            .parse_listing(&page(&items, None), &ParseContext::new(1, "index.html"))
            .unwrap_err();
        assert_eq!(err, ParsingError::required_field_missing("title", 0));
    }

    #[test]
    fn test_empty_listing() {
        let listing = parser()
            .parse_listing("<html><body></body></html>", &ParseContext::new(1, "index.html"))
            .unwrap();
        assert!(listing.summaries.is_empty());
        assert!(listing.next_locator.is_none());
    }
}
