//! Framework detection: score every registry profile against a document.

use crate::registry::{DetectionSignal, FrameworkProfile, SignalKind, REGISTRY};
use crate::selectors::{GENERATOR_SELECTOR, RESOURCE_SELECTOR, UNIVERSAL_SELECTOR};
use crate::types::DetectionResult;
use scraper::Html;
use std::collections::HashSet;

/// A profile "matches" only at or above this confidence.
pub const FRAMEWORK_MATCH_THRESHOLD: u32 = 40;

/// Confidence is the sum of matched signal weights, capped here.
pub const MAX_CONFIDENCE: u32 = 100;

/// Everything signal matching needs, collected in one pass so scoring is
/// order-independent and linear in document size.
struct DocFacts {
    generator: Option<String>,
    class_tokens: HashSet<String>,
    resource_urls: String,
    attr_names: HashSet<String>,
}

fn collect_facts(doc: &Html) -> DocFacts {
    let generator = doc
        .select(&GENERATOR_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.to_lowercase());

    let mut resource_urls = String::new();
    for el in doc.select(&RESOURCE_SELECTOR) {
        let v = el.value();
        if let Some(u) = v.attr("src").or_else(|| v.attr("href")) {
            resource_urls.push_str(&u.to_lowercase());
            resource_urls.push('\n');
        }
    }

    let mut class_tokens = HashSet::new();
    let mut attr_names = HashSet::new();
    for el in doc.select(&UNIVERSAL_SELECTOR) {
        for class in el.value().classes() {
            class_tokens.insert(class.to_lowercase());
        }
        for (name, _) in el.value().attrs() {
            attr_names.insert(name.to_lowercase());
        }
    }

    DocFacts {
        generator,
        class_tokens,
        resource_urls,
        attr_names,
    }
}

fn signal_present(signal: &DetectionSignal, facts: &DocFacts) -> bool {
    match signal.kind {
        SignalKind::Generator => facts
            .generator
            .as_deref()
            .is_some_and(|g| g.contains(signal.pattern)),
        SignalKind::ClassFragment => facts
            .class_tokens
            .iter()
            .any(|t| t.contains(signal.pattern)),
        SignalKind::ResourceUrl => facts.resource_urls.contains(signal.pattern),
        SignalKind::DataAttribute => facts.attr_names.contains(signal.pattern),
    }
}

fn score_profile(profile: &FrameworkProfile, facts: &DocFacts) -> u32 {
    let sum: u32 = profile
        .signals
        .iter()
        .filter(|s| signal_present(s, facts))
        .map(|s| s.weight)
        .sum();
    sum.min(MAX_CONFIDENCE)
}

/// Score every profile, keep those above zero, strongest first. Ties keep
/// registry declaration order (the sort is stable), so results are
/// reproducible for identical input.
pub fn detect_all(doc: &Html) -> Vec<DetectionResult> {
    let facts = collect_facts(doc);
    let mut results: Vec<DetectionResult> = REGISTRY
        .iter()
        .map(|p| DetectionResult {
            framework: p.name.to_string(),
            confidence: score_profile(p, &facts),
        })
        .filter(|r| r.confidence > 0)
        .collect();
    results.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    results
}

/// The single best match, if it clears the threshold.
pub fn detect_best(doc: &Html) -> Option<DetectionResult> {
    detect_all(doc)
        .into_iter()
        .find(|r| r.confidence >= FRAMEWORK_MATCH_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_plus_class_signal_sums() {
        let html = r#"
            <html><head>
              <meta name="generator" content="WordPress 6.4">
            </head><body>
              <article class="hentry"><h2>A</h2></article>
              <article class="hentry"><h2>B</h2></article>
            </body></html>"#;
        let doc = Html::parse_document(html);
        let best = detect_best(&doc).expect("wordpress should match");
        assert_eq!(best.framework, "wordpress");
        // generator (40) + hentry class fragment (15)
        assert!(best.confidence >= 55);
    }

    #[test]
    fn no_signals_means_no_framework() {
        let doc = Html::parse_document("<html><body><p>plain page</p></body></html>");
        assert!(detect_best(&doc).is_none());
        assert!(detect_all(&doc).is_empty());
    }

    #[test]
    fn resource_url_signal_matches_script_src() {
        let html = r#"
            <html><head>
              <script src="https://cdn.shopify.com/s/files/theme.js"></script>
            </head><body>
              <div class="shopify-section"></div>
            </body></html>"#;
        let doc = Html::parse_document(html);
        let best = detect_best(&doc).expect("shopify should match");
        assert_eq!(best.framework, "shopify");
        assert!(best.confidence >= 65);
    }

    #[test]
    fn layered_frameworks_are_all_reported() {
        // A Shopify storefront whose theme was exported from Webflow.
        let html = r#"
            <html><head>
              <meta name="generator" content="Webflow">
              <script src="https://cdn.shopify.com/shop.js"></script>
            </head><body>
              <div class="w-dyn-item"></div>
            </body></html>"#;
        let doc = Html::parse_document(html);
        let all = detect_all(&doc);
        let names: Vec<&str> = all.iter().map(|r| r.framework.as_str()).collect();
        assert!(names.contains(&"webflow"));
        assert!(names.contains(&"shopify"));
        // Descending by confidence.
        for pair in all.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn confidence_is_capped() {
        let html = r#"
            <html><head>
              <meta name="generator" content="WordPress 6.4">
              <script src="/wp-content/t.js"></script>
              <script src="/wp-includes/j.js"></script>
            </head><body>
              <div class="wp-block-group hentry"></div>
            </body></html>"#;
        let doc = Html::parse_document(html);
        let best = detect_best(&doc).unwrap();
        assert_eq!(best.confidence, MAX_CONFIDENCE);
    }

    #[test]
    fn scoring_is_reproducible() {
        let html = r#"<html><head><meta name="generator" content="Ghost 5.0"></head>
            <body><article class="gh-card"></article></body></html>"#;
        let a = detect_all(&Html::parse_document(html));
        let b = detect_all(&Html::parse_document(html));
        assert_eq!(a, b);
    }
}
