use serde::{Deserialize, Serialize};

use super::rating::Rating;

/// Item summary from a listing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub title: String,
    /// Absolute locator of the detail document
    pub detail_locator: String,
    pub price: f64,
    pub rating: Rating,
    /// Raw stock phrase as shown on the listing
    pub availability_text: String,
}

/// Attributes only found on a detail page.
///
/// `None` means the source document did not carry the field; `Some("")`
/// is a present but empty value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub identifier_code: Option<String>,
    pub product_kind: Option<String>,
    pub price_excl_tax: Option<f64>,
    pub price_incl_tax: Option<f64>,
    pub tax: Option<f64>,
    pub availability_detail: Option<String>,
    pub review_count: Option<u32>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Summary and detail flattened into one row. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    summary: ItemSummary,
    detail: ItemDetail,
}

impl EnrichedRecord {
    pub const fn new(summary: ItemSummary, detail: ItemDetail) -> Self {
        Self { summary, detail }
    }

    pub const fn summary(&self) -> &ItemSummary {
        &self.summary
    }

    pub const fn detail(&self) -> &ItemDetail {
        &self.detail
    }

    pub fn title(&self) -> &str {
        &self.summary.title
    }

    pub const fn rating(&self) -> Rating {
        self.summary.rating
    }

    pub fn detail_locator(&self) -> &str {
        &self.summary.detail_locator
    }

    pub fn into_parts(self) -> (ItemSummary, ItemDetail) {
        (self.summary, self.detail)
    }
}

/// Ordered accumulator of enriched records, in first-seen order across pages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    records: Vec<EnrichedRecord>,
}

/// Row of a [`RecordSet`] lacking a column the feature pipeline depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureGap {
    pub row: usize,
    pub title: String,
    pub missing: Vec<&'static str>,
}

impl RecordSet {
    pub const fn new() -> Self {
        Self { records: Vec::new() }
    }

    /// Append one page worth of records.
    pub fn extend_page(&mut self, page: Vec<EnrichedRecord>) {
        self.records.extend(page);
    }

    pub fn push(&mut self, record: EnrichedRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnrichedRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[EnrichedRecord] {
        &self.records
    }

    pub fn into_vec(self) -> Vec<EnrichedRecord> {
        self.records
    }

    /// Rows whose `category` or `description` is missing.
    ///
    /// Rating and availability are always present on a record, so only the
    /// detail-page columns can leave a gap.
    pub fn feature_gaps(&self) -> Vec<FeatureGap> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(row, record)| {
                let mut missing = Vec::new();
                if record.detail.category.is_none() {
                    missing.push("category");
                }
                if record.detail.description.is_none() {
                    missing.push("description");
                }
                (!missing.is_empty()).then(|| FeatureGap {
                    row,
                    title: record.summary.title.clone(),
                    missing,
                })
            })
            .collect()
    }
}

impl From<Vec<EnrichedRecord>> for RecordSet {
    fn from(records: Vec<EnrichedRecord>) -> Self {
        Self { records }
    }
}

impl IntoIterator for RecordSet {
    type Item = EnrichedRecord;
    type IntoIter = std::vec::IntoIter<EnrichedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a EnrichedRecord;
    type IntoIter = std::slice::Iter<'a, EnrichedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(title: &str) -> ItemSummary {
        ItemSummary {
            title: title.to_string(),
            detail_locator: format!("https://example.com/catalogue/{title}.html"),
            price: 10.0,
            rating: Rating::decode("Two"),
            availability_text: "In stock".to_string(),
        }
    }

    #[test]
    fn test_record_set_keeps_insertion_order() {
        let mut set = RecordSet::new();
        set.extend_page(vec![
            EnrichedRecord::new(summary("a"), ItemDetail::default()),
            EnrichedRecord::new(summary("b"), ItemDetail::default()),
        ]);
        set.push(EnrichedRecord::new(summary("c"), ItemDetail::default()));

        let titles: Vec<_> = set.iter().map(EnrichedRecord::title).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_feature_gaps_reports_missing_detail_columns() {
        let complete = ItemDetail {
            category: Some("Poetry".to_string()),
            description: Some(String::new()),
            ..ItemDetail::default()
        };
        let set = RecordSet::from(vec![
            EnrichedRecord::new(summary("full"), complete),
            EnrichedRecord::new(summary("bare"), ItemDetail::default()),
        ]);

        let gaps = set.feature_gaps();
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].row, 1);
        assert_eq!(gaps[0].title, "bare");
        assert_eq!(gaps[0].missing, vec!["category", "description"]);
    }
}
