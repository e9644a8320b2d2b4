//! Container candidate generation.
//!
//! Each strategy is a pure pass over the parsed document that proposes zero
//! or more repeating-item selectors. Strategies run unconditionally and are
//! concatenated for the ranker; only the link-cluster fallback is gated, so
//! non-trivial documents never come back with zero candidates.

use crate::registry;
use crate::selector::{collapse_ws, is_css_safe, StructuralSelector};
use crate::selectors::{LINK_SELECTOR, TABLE_SELECTOR, TD_SELECTOR, TR_SELECTOR, UNIVERSAL_SELECTOR};
use crate::types::{DetectionResult, ItemCandidate, Strategy, Tier};
use crate::detect::FRAMEWORK_MATCH_THRESHOLD;
use scraper::{ElementRef, Html};
use std::collections::{BTreeMap, HashSet};

/// A selector must match at least this many elements to count as repeating.
pub const MIN_REPEAT_COUNT: usize = 3;

/// Representative sample text is capped for display.
pub const SAMPLE_TEXT_MAX: usize = 80;

/// At most this many class tokens go into a generated selector.
pub const MAX_SELECTOR_CLASSES: usize = 3;

/// Tags never proposed as repeating items.
const SKIP_TAGS: &[&str] = &[
    "html", "head", "body", "meta", "link", "script", "style", "title", "br", "hr", "noscript",
];

/// Parents that make a repeated group "list-like" and promote its tier.
const LIST_CONTAINER_TAGS: &[&str] = &["ul", "ol", "tbody", "table", "dl", "select"];

/// Run every strategy over the document. `detections` comes from
/// [`crate::detect::detect_all`]; only matches at or above the detection
/// threshold contribute hints.
pub fn generate(doc: &Html, detections: &[DetectionResult]) -> Vec<ItemCandidate> {
    let mut out = framework_hinted(doc, detections);
    out.extend(repeated_class(doc));
    out.extend(table_rows(doc));
    out.extend(semantic_tags(doc));
    if !out.iter().any(|c| c.count >= MIN_REPEAT_COUNT) {
        out.extend(link_clusters(doc));
    }
    out
}

/* -------- strategy 1: framework-hinted -------- */

fn framework_hinted(doc: &Html, detections: &[DetectionResult]) -> Vec<ItemCandidate> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for det in detections {
        if det.confidence < FRAMEWORK_MATCH_THRESHOLD {
            continue;
        }
        let Some(profile) = registry::profile(&det.framework) else {
            continue;
        };
        for hint in profile.item_hints {
            let Ok(sel) = StructuralSelector::parse(hint) else {
                continue;
            };
            if !seen.insert(sel.to_string()) {
                continue;
            }
            let matches = sel.select_doc(doc);
            if matches.len() >= MIN_REPEAT_COUNT {
                out.push(candidate(sel, &matches, Strategy::FrameworkHint, Tier::VeryHigh));
            }
        }
    }
    out
}

/* -------- strategy 2: repeated (tag, class set) groups -------- */

fn repeated_class(doc: &Html) -> Vec<ItemCandidate> {
    // Group elements by tag plus their full, sorted class set.
    let mut groups: BTreeMap<(String, Vec<String>), Vec<ElementRef<'_>>> = BTreeMap::new();
    for el in doc.select(&UNIVERSAL_SELECTOR) {
        let tag = el.value().name();
        if SKIP_TAGS.contains(&tag) {
            continue;
        }
        let mut classes: Vec<String> = el
            .value()
            .classes()
            .filter(|c| is_css_safe(c))
            .map(|c| c.to_string())
            .collect();
        if classes.is_empty() {
            continue;
        }
        classes.sort();
        classes.dedup();
        groups
            .entry((tag.to_string(), classes))
            .or_default()
            .push(el);
    }

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for ((tag, classes), members) in &groups {
        if members.len() < MIN_REPEAT_COUNT {
            continue;
        }
        let class_part: String = classes
            .iter()
            .take(MAX_SELECTOR_CLASSES)
            .map(|c| format!(".{c}"))
            .collect();

        // Prefer the bare class selector when it identifies exactly this
        // group; qualify with the tag when the classes are reused elsewhere.
        let chosen = match StructuralSelector::parse(&class_part) {
            Ok(sel) if sel.select_doc(doc).len() == members.len() => sel,
            _ => match StructuralSelector::parse(&format!("{tag}{class_part}")) {
                Ok(sel) => sel,
                Err(_) => continue,
            },
        };
        if !seen.insert(chosen.to_string()) {
            continue;
        }
        let matches = chosen.select_doc(doc);
        if matches.len() < MIN_REPEAT_COUNT {
            continue;
        }
        let tier = if shares_list_parent(members) {
            Tier::High
        } else {
            Tier::Medium
        };
        out.push(candidate(chosen, &matches, Strategy::RepeatedClass, tier));
    }
    out
}

/// True when every member hangs off the same parent element and that parent
/// is a list or table-body style container.
fn shares_list_parent(members: &[ElementRef<'_>]) -> bool {
    let Some(first_parent) = members[0].parent().and_then(ElementRef::wrap) else {
        return false;
    };
    if !LIST_CONTAINER_TAGS.contains(&first_parent.value().name()) {
        return false;
    }
    members.iter().all(|m| {
        m.parent()
            .map(|p| p.id() == first_parent.id())
            .unwrap_or(false)
    })
}

/* -------- strategy 3: table rows -------- */

fn table_rows(doc: &Html) -> Vec<ItemCandidate> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for table in doc.select(&TABLE_SELECTOR) {
        let data_rows = table
            .select(&TR_SELECTOR)
            .filter(|tr| tr.select(&TD_SELECTOR).next().is_some())
            .count();
        if data_rows < MIN_REPEAT_COUNT {
            continue;
        }
        let scope = scope_selector(table, "table");
        let Ok(sel) = StructuralSelector::parse(&format!("{scope} tbody tr")) else {
            continue;
        };
        if !seen.insert(sel.to_string()) {
            continue;
        }
        let matches = sel.select_doc(doc);
        if matches.len() < MIN_REPEAT_COUNT {
            continue;
        }
        out.push(candidate(sel, &matches, Strategy::TableRow, Tier::High));
    }
    out
}

/* -------- strategy 4: semantic content-sectioning tags -------- */

fn semantic_tags(doc: &Html) -> Vec<ItemCandidate> {
    let mut out = Vec::new();
    for tag in ["article", "section"] {
        let Ok(sel) = StructuralSelector::parse(tag) else {
            continue;
        };
        let matches = sel.select_doc(doc);
        if matches.len() >= MIN_REPEAT_COUNT {
            out.push(candidate(sel, &matches, Strategy::SemanticTag, Tier::Medium));
        }
    }
    out
}

/* -------- strategy 5: link-cluster fallback -------- */

/// Last resort: find the element with the most same-tag direct children that
/// each contain a hyperlink, and propose those children. Low tier, but it
/// keeps the engine from returning nothing on loosely structured pages.
fn link_clusters(doc: &Html) -> Vec<ItemCandidate> {
    // Unlike item tags, `body` is a perfectly good cluster parent.
    const PARENT_SKIP: &[&str] = &["html", "head", "script", "style", "meta", "link", "title", "noscript"];
    let mut best: Option<(ElementRef<'_>, String, usize)> = None;
    for el in doc.select(&UNIVERSAL_SELECTOR) {
        if PARENT_SKIP.contains(&el.value().name()) {
            continue;
        }
        let mut tag_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for child in el.children().filter_map(ElementRef::wrap) {
            if contains_link(child) {
                *tag_counts.entry(child.value().name()).or_default() += 1;
            }
        }
        for (tag, n) in tag_counts {
            if n >= MIN_REPEAT_COUNT && best.as_ref().map(|b| n > b.2).unwrap_or(true) {
                best = Some((el, tag.to_string(), n));
            }
        }
    }

    let Some((parent, tag, _)) = best else {
        return Vec::new();
    };
    let scope = scope_selector(parent, parent.value().name());
    let Ok(sel) = StructuralSelector::parse(&format!("{scope} > {tag}")) else {
        return Vec::new();
    };
    let matches = sel.select_doc(doc);
    if matches.len() < MIN_REPEAT_COUNT {
        return Vec::new();
    }
    vec![candidate(sel, &matches, Strategy::LinkCluster, Tier::Low)]
}

fn contains_link(el: ElementRef<'_>) -> bool {
    (el.value().name() == "a" && el.value().attr("href").is_some())
        || el.select(&LINK_SELECTOR).next().is_some()
}

/* -------- shared helpers -------- */

fn candidate(
    selector: StructuralSelector,
    matches: &[ElementRef<'_>],
    origin: Strategy,
    tier: Tier,
) -> ItemCandidate {
    ItemCandidate {
        selector,
        count: matches.len(),
        sample: matches.first().map(|el| sample_of(*el)).unwrap_or_default(),
        origin,
        tier,
        boosted: false,
    }
}

/// Collapsed text of the element, truncated for display.
pub(crate) fn sample_of(el: ElementRef<'_>) -> String {
    let text = collapse_ws(&el.text().collect::<String>());
    truncate_chars(&text, SAMPLE_TEXT_MAX)
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}

/// A scoping selector for one concrete element: its id when usable, else its
/// tag qualified by class tokens, else the fallback tag alone.
fn scope_selector(el: ElementRef<'_>, fallback: &str) -> String {
    if let Some(id) = el.value().id() {
        if is_css_safe(id) {
            return format!("#{id}");
        }
    }
    let classes: String = el
        .value()
        .classes()
        .filter(|c| is_css_safe(c))
        .take(MAX_SELECTOR_CLASSES)
        .map(|c| format!(".{c}"))
        .collect();
    if classes.is_empty() {
        fallback.to_string()
    } else {
        format!("{}{classes}", el.value().name())
    }
}
