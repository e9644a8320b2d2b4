//! Framework fingerprint catalog.
//!
//! Each profile is a pure data declaration: weighted detection signals, the
//! container selectors the framework's themes typically render repeating
//! items with, and per-field selector candidates. The table is process-wide,
//! read-only, and safe to share across concurrent analyses. Signal weights
//! are empirical; a pattern unique to one framework (generator tag, vendor
//! CDN host) weighs 35-40, shared conventions weigh 10-25.

use crate::types::FieldKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Substring of `<meta name="generator" content="...">`.
    Generator,
    /// Fragment of a class token occurring anywhere in the document.
    ClassFragment,
    /// Substring of a `script[src]` or `link[href]` URL.
    ResourceUrl,
    /// Presence of a named attribute on any element.
    DataAttribute,
}

#[derive(Debug, Clone, Copy)]
pub struct DetectionSignal {
    pub kind: SignalKind,
    /// Lowercase pattern; matching is case-insensitive.
    pub pattern: &'static str,
    pub weight: u32,
}

#[derive(Debug)]
pub struct FrameworkProfile {
    pub name: &'static str,
    pub signals: &'static [DetectionSignal],
    /// Container selectors worth testing when this profile matches.
    pub item_hints: &'static [&'static str],
    /// Field name -> selector candidates, tried in order.
    pub field_map: &'static [(FieldKind, &'static [&'static str])],
}

const fn sig(kind: SignalKind, pattern: &'static str, weight: u32) -> DetectionSignal {
    DetectionSignal {
        kind,
        pattern,
        weight,
    }
}

use FieldKind::{Author, Category, Date, Description, Image, Price, Score, Title, Url};
use SignalKind::{ClassFragment, DataAttribute, Generator, ResourceUrl};

pub static REGISTRY: &[FrameworkProfile] = &[
    FrameworkProfile {
        name: "wordpress",
        signals: &[
            sig(Generator, "wordpress", 40),
            sig(ResourceUrl, "wp-content", 30),
            sig(ResourceUrl, "wp-includes", 20),
            sig(ClassFragment, "wp-block", 15),
            sig(ClassFragment, "hentry", 15),
        ],
        item_hints: &[
            ".hentry",
            "article.post",
            "article[class*=\"post-\"]",
            ".wp-block-latest-posts li",
        ],
        field_map: &[
            (Title, &[".entry-title a", ".entry-title", "h2 a"]),
            (Url, &[".entry-title a@href", "h2 a@href"]),
            (
                Date,
                &["time.entry-date@datetime", "time.entry-date", ".posted-on time"],
            ),
            (Author, &[".author.vcard a", ".byline a", ".author a"]),
            (Category, &[".cat-links a"]),
            (Image, &[".post-thumbnail img@src", "img.wp-post-image@src"]),
            (Description, &[".entry-summary p", ".entry-summary"]),
        ],
    },
    FrameworkProfile {
        name: "shopify",
        signals: &[
            sig(ResourceUrl, "cdn.shopify", 40),
            sig(ClassFragment, "shopify-section", 25),
            sig(DataAttribute, "data-shopify", 20),
        ],
        item_hints: &[".product-card", ".product-item", "li.grid__item"],
        field_map: &[
            (
                Title,
                &[
                    ".product-item__title",
                    ".card__heading",
                    "a.full-unstyled-link",
                ],
            ),
            (
                Url,
                &[
                    "a.full-unstyled-link@href",
                    "a.product-item__title@href",
                    "a@href",
                ],
            ),
            (
                Price,
                &[".price-item--regular", ".price .money", ".price"],
            ),
            (
                Image,
                &[".card__media img@src", ".product-item__image img@src", "img@src"],
            ),
        ],
    },
    FrameworkProfile {
        name: "ghost",
        signals: &[
            sig(Generator, "ghost", 40),
            sig(ClassFragment, "gh-card", 25),
            sig(ClassFragment, "post-card", 20),
        ],
        item_hints: &["article.gh-card", "article.post-card", ".post-card"],
        field_map: &[
            (Title, &[".gh-card-title", ".post-card-title", "h2"]),
            (
                Url,
                &[
                    "a.gh-card-link@href",
                    "a.post-card-content-link@href",
                    "a@href",
                ],
            ),
            (Date, &["time@datetime", "time"]),
            (Author, &[".gh-card-author", ".post-card-byline-content a"]),
            (
                Image,
                &[".gh-card-image img@src", "img.post-card-image@src"],
            ),
            (Description, &[".gh-card-excerpt", ".post-card-excerpt"]),
        ],
    },
    FrameworkProfile {
        name: "drupal",
        signals: &[
            sig(Generator, "drupal", 40),
            sig(ClassFragment, "views-row", 30),
            sig(DataAttribute, "data-drupal-selector", 25),
            sig(ResourceUrl, "/sites/default/files", 15),
        ],
        item_hints: &[
            ".views-row",
            "article[class*=\"node--type-\"]",
            ".node-teaser",
        ],
        field_map: &[
            (Title, &[".views-field-title a", "h2.node__title a", "h2 a"]),
            (Url, &[".views-field-title a@href", "h2 a@href"]),
            (Date, &["time@datetime", ".views-field-created"]),
            (Author, &[".node__submitted a", ".views-field-name"]),
        ],
    },
    FrameworkProfile {
        name: "squarespace",
        signals: &[
            sig(ResourceUrl, "squarespace.com", 40),
            sig(ClassFragment, "sqs-block", 30),
            sig(DataAttribute, "data-block-type", 20),
        ],
        item_hints: &["article.blog-item", ".blog-item", ".summary-item"],
        field_map: &[
            (Title, &[".blog-title a", ".summary-title a", "h1.blog-title"]),
            (Url, &[".blog-title a@href", "a.summary-title-link@href"]),
            (
                Date,
                &["time.blog-date", ".summary-metadata-item--date", "time@datetime"],
            ),
            (
                Author,
                &[".blog-author-name", ".summary-metadata-item--author"],
            ),
            (
                Image,
                &["img.summary-thumbnail-image@src", ".blog-item-thumbnail img@src"],
            ),
        ],
    },
    FrameworkProfile {
        name: "wix",
        signals: &[
            sig(Generator, "wix.com", 40),
            sig(ResourceUrl, "parastorage.com", 35),
            sig(ResourceUrl, "wixstatic.com", 25),
            sig(DataAttribute, "data-testid", 10),
        ],
        item_hints: &["[data-hook=\"post-list-item\"]", ".gallery-item-container"],
        field_map: &[
            (Title, &["[data-hook=\"post-title\"]", "h2"]),
            (Url, &["[data-hook=\"post-title\"] a@href", "a@href"]),
            (Date, &["[data-hook=\"post-date\"]", "time"]),
            (Author, &["[data-hook=\"user-name\"]"]),
            (Description, &["[data-hook=\"post-description\"]"]),
        ],
    },
    FrameworkProfile {
        name: "joomla",
        signals: &[
            sig(Generator, "joomla", 40),
            sig(ClassFragment, "com-content", 20),
            sig(ClassFragment, "items-row", 20),
            sig(ResourceUrl, "/media/jui/", 15),
        ],
        item_hints: &[
            ".items-row",
            ".blog-item",
            ".com-content-category-blog__item",
        ],
        field_map: &[
            (Title, &["h2.item-title a", ".page-header h2 a", "h2 a"]),
            (Url, &["h2 a@href", ".page-header h2 a@href"]),
            (Date, &["time@datetime", ".published time"]),
            (Author, &[".createdby", ".created-by"]),
            (Category, &[".category-name a"]),
        ],
    },
    FrameworkProfile {
        name: "magento",
        signals: &[
            sig(DataAttribute, "data-mage-init", 35),
            sig(ClassFragment, "product-item", 25),
            sig(ResourceUrl, "/static/version", 25),
            sig(ResourceUrl, "mage/", 15),
        ],
        item_hints: &["li.item.product", ".product-item", "ol.products li"],
        field_map: &[
            (Title, &["a.product-item-link", ".product-item-name a"]),
            (Url, &["a.product-item-link@href"]),
            (
                Price,
                &[
                    "[data-price-type=\"finalPrice\"] .price",
                    ".price-final_price .price",
                    ".price",
                ],
            ),
            (Image, &["img.product-image-photo@src"]),
        ],
    },
    FrameworkProfile {
        name: "webflow",
        signals: &[
            sig(Generator, "webflow", 40),
            sig(ClassFragment, "w-dyn-item", 35),
            sig(ResourceUrl, "website-files.com", 25),
            sig(DataAttribute, "data-wf-page", 20),
        ],
        item_hints: &[".w-dyn-item"],
        field_map: &[
            (Title, &["h3", "h2", ".heading"]),
            (Url, &["a@href"]),
            (Date, &["time", ".date"]),
            (Image, &["img@src"]),
        ],
    },
    FrameworkProfile {
        name: "discourse",
        signals: &[
            sig(Generator, "discourse", 40),
            sig(ClassFragment, "topic-list-item", 35),
            sig(DataAttribute, "data-topic-id", 25),
        ],
        item_hints: &["tr.topic-list-item", ".topic-list tbody tr"],
        field_map: &[
            (Title, &["a.title", ".main-link a.title"]),
            (Url, &["a.title@href"]),
            (Score, &[".num.posts .number", ".num.likes"]),
            (Date, &[".num.age a", ".relative-date"]),
            (Category, &["span.category-name", ".category-name"]),
        ],
    },
    FrameworkProfile {
        name: "mediawiki",
        signals: &[
            sig(Generator, "mediawiki", 40),
            sig(ResourceUrl, "load.php", 25),
            sig(ClassFragment, "mw-", 20),
        ],
        item_hints: &[
            "li.mw-search-result",
            ".mw-category-group li",
            "#mw-pages li",
        ],
        field_map: &[
            (Title, &[".mw-search-result-heading a", "a"]),
            (Url, &[".mw-search-result-heading a@href", "a@href"]),
            (Description, &[".searchresult"]),
        ],
    },
    FrameworkProfile {
        name: "hugo",
        signals: &[
            sig(Generator, "hugo", 40),
            sig(ClassFragment, "post-entry", 15),
        ],
        item_hints: &["article.post-entry", ".post-entry"],
        field_map: &[
            (Title, &[".entry-header h2", "h2"]),
            (Url, &["a.entry-link@href", "a@href"]),
            (Date, &["time@datetime", "time"]),
            (Description, &[".entry-content"]),
        ],
    },
    FrameworkProfile {
        name: "jekyll",
        signals: &[
            sig(Generator, "jekyll", 40),
            sig(ClassFragment, "post-list", 15),
        ],
        item_hints: &[".post-list li", "li.post", "article.post"],
        field_map: &[
            (Title, &["a.post-link", "h3 a", "h2 a"]),
            (Url, &["a.post-link@href", "h2 a@href"]),
            (Date, &["time@datetime", ".post-meta"]),
        ],
    },
];

/// Look a profile up by its registry name.
pub fn profile(name: &str) -> Option<&'static FrameworkProfile> {
    REGISTRY.iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::StructuralSelector;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let mut seen = HashSet::new();
        for p in REGISTRY {
            assert!(seen.insert(p.name), "duplicate profile name {}", p.name);
        }
    }

    #[test]
    fn weights_are_within_the_documented_range() {
        for p in REGISTRY {
            assert!(!p.signals.is_empty(), "{} has no signals", p.name);
            for s in p.signals {
                assert!(
                    (10..=40).contains(&s.weight),
                    "{} signal {:?} weight {} out of range",
                    p.name,
                    s.pattern,
                    s.weight
                );
                assert_eq!(s.pattern, s.pattern.to_lowercase());
            }
        }
    }

    #[test]
    fn every_hint_and_field_selector_parses() {
        for p in REGISTRY {
            for hint in p.item_hints {
                StructuralSelector::parse(hint)
                    .unwrap_or_else(|_| panic!("{}: bad hint {hint}", p.name));
            }
            for (field, candidates) in p.field_map {
                assert!(!candidates.is_empty(), "{}: empty map for {field}", p.name);
                for c in *candidates {
                    StructuralSelector::parse(c)
                        .unwrap_or_else(|_| panic!("{}: bad {field} selector {c}", p.name));
                }
            }
        }
    }

    #[test]
    fn lookup_by_name() {
        assert!(profile("wordpress").is_some());
        assert!(profile("no-such-framework").is_none());
    }
}
