//! Extraction: apply an item selector plus field selectors to a document.
//!
//! The same function backs the CLI preview and production extraction; only
//! `limit` differs, so what a user confirms is exactly what a scrape run
//! produces. It is selector-pure: identical input always yields identical
//! records, and nothing here performs I/O.

use crate::selector::StructuralSelector;
use crate::types::ExtractedRecord;
use scraper::Html;
use std::collections::BTreeMap;
use url::Url;

/// Default number of records shown in previews.
pub const PREVIEW_LIMIT: usize = 5;

/// Apply `item_selector` to the document (in document order, up to `limit`;
/// `None` = all items, the production path) and extract every field per
/// item. A field selector matching nothing yields `None` for that record,
/// never an error, so a single bad field cannot discard a good item.
pub fn extract(
    doc: &Html,
    item_selector: &StructuralSelector,
    field_selectors: &[(String, StructuralSelector)],
    limit: Option<usize>,
) -> Vec<ExtractedRecord> {
    let items = item_selector.select_doc(doc);
    let take = limit.unwrap_or(items.len());
    items
        .into_iter()
        .take(take)
        .enumerate()
        .map(|(index, item)| {
            let values: BTreeMap<String, Option<String>> = field_selectors
                .iter()
                .map(|(name, sel)| (name.clone(), sel.extract_from(item)))
                .collect();
            ExtractedRecord { index, values }
        })
        .collect()
}

/// Resolve one extracted value against a base URL. Values that already parse
/// as absolute URLs pass through unchanged; anything unresolvable is kept
/// as-is rather than dropped.
pub fn absolutize(base: &Url, value: &str) -> String {
    if Url::parse(value).is_ok() {
        return value.to_string();
    }
    base.join(value)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::StructuralSelector;

    fn doc() -> Html {
        let mut html = String::from("<html><body>");
        for i in 0..8 {
            html.push_str(&format!(
                "<div class='row'><a href='/item/{i}'>Item {i}</a>\
                 <span class='when'>2024-01-0{}</span></div>",
                i + 1
            ));
        }
        html.push_str("</body></html>");
        Html::parse_document(&html)
    }

    fn fields() -> Vec<(String, StructuralSelector)> {
        vec![
            ("title".into(), StructuralSelector::parse("a").unwrap()),
            ("url".into(), StructuralSelector::parse("a@href").unwrap()),
            (
                "date".into(),
                StructuralSelector::parse(".when").unwrap(),
            ),
        ]
    }

    #[test]
    fn extracts_in_document_order() {
        let doc = doc();
        let item = StructuralSelector::parse(".row").unwrap();
        let records = extract(&doc, &item, &fields(), None);
        assert_eq!(records.len(), 8);
        assert_eq!(records[0].index, 0);
        assert_eq!(
            records[0].values.get("title").unwrap().as_deref(),
            Some("Item 0")
        );
        assert_eq!(
            records[7].values.get("url").unwrap().as_deref(),
            Some("/item/7")
        );
    }

    #[test]
    fn limit_takes_a_prefix_of_the_production_result() {
        let doc = doc();
        let item = StructuralSelector::parse(".row").unwrap();
        let all = extract(&doc, &item, &fields(), None);
        let preview = extract(&doc, &item, &fields(), Some(3));
        assert_eq!(preview.len(), 3);
        assert_eq!(preview[..], all[..3]);
    }

    #[test]
    fn missing_field_matches_yield_absent_values() {
        let doc = doc();
        let item = StructuralSelector::parse(".row").unwrap();
        let fields = vec![(
            "image".to_string(),
            StructuralSelector::parse("img@src").unwrap(),
        )];
        let records = extract(&doc, &item, &fields, Some(2));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].values.get("image"), Some(&None));
    }

    #[test]
    fn zero_item_matches_is_an_empty_preview() {
        let doc = doc();
        let item = StructuralSelector::parse(".does-not-exist").unwrap();
        assert!(extract(&doc, &item, &fields(), None).is_empty());
    }

    #[test]
    fn identical_input_yields_identical_records() {
        let doc = doc();
        let item = StructuralSelector::parse(".row").unwrap();
        let a = extract(&doc, &item, &fields(), None);
        let b = extract(&doc, &item, &fields(), None);
        assert_eq!(a, b);
    }

    #[test]
    fn absolutize_joins_relative_paths() {
        let base = Url::parse("https://example.com/list").unwrap();
        assert_eq!(absolutize(&base, "/item/1"), "https://example.com/item/1");
        assert_eq!(
            absolutize(&base, "https://other.org/x"),
            "https://other.org/x"
        );
        assert_eq!(absolutize(&base, ""), "https://example.com/list");
    }
}
