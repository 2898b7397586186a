//! Locator resolution and numeric normalization helpers shared by the parsers

use once_cell::sync::Lazy;
use regex::Regex;

use super::config::ParsingConfig;

static NON_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9.]+").expect("static pattern is valid"));

/// Whether the href is already an absolute network or file locator.
pub fn is_absolute(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://") || href.starts_with("file://")
}

/// Drop every `../` segment, whatever its position or count.
pub fn strip_parent_segments(href: &str) -> String {
    href.replace("../", "")
}

/// Resolve a detail href found on a listing page.
///
/// Relative hrefs are made absolute under the catalogue root, independent of
/// how many `../` segments the listing used. The first listing page sits at
/// the site root, so its hrefs already start with the catalogue directory.
pub fn resolve_detail_href(href: &str, config: &ParsingConfig) -> String {
    let href = href.trim();
    if is_absolute(href) {
        return href.to_string();
    }
    let stripped = strip_parent_segments(href);
    let stripped = stripped.trim_start_matches("./").trim_start_matches('/');
    let segment = config.catalogue_segment();
    if !segment.is_empty() && stripped.starts_with(&segment) {
        format!("{}{}", config.site_root(), stripped)
    } else {
        format!("{}{}", config.catalogue_root(), stripped)
    }
}

/// Resolve the href of a "next" control.
///
/// The first listing page lives at the site root and links into the
/// catalogue directory; later pages link to siblings inside it.
pub fn resolve_next_href(href: &str, config: &ParsingConfig) -> String {
    let href = href.trim();
    if is_absolute(href) {
        return href.to_string();
    }
    let stripped = strip_parent_segments(href);
    let stripped = stripped.trim_start_matches("./").trim_start_matches('/');
    let segment = config.catalogue_segment();
    if !segment.is_empty() && stripped.contains(&segment) {
        format!("{}{}", config.site_root(), stripped)
    } else {
        format!("{}{}", config.catalogue_root(), stripped)
    }
}

/// Keep only digits and decimal points, then parse.
pub fn normalize_decimal(text: &str) -> Option<f64> {
    let cleaned = NON_NUMERIC.replace_all(text, "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parse a whole count, tolerating surrounding text such as thousands separators.
pub fn normalize_count(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
