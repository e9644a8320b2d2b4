//! Candidate ranking: dedupe, composite ordering, top-N cutoff.

use crate::registry;
use crate::selector::StructuralSelector;
use crate::types::{DetectionResult, ItemCandidate};
use crate::detect::FRAMEWORK_MATCH_THRESHOLD;
use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// How many ranked candidates are returned.
pub const MAX_CANDIDATES: usize = 25;

/// Sample text bounds for the "looks like a headline" boost.
pub const TITLE_MIN_LEN: usize = 5;
pub const TITLE_MAX_LEN: usize = 160;

/// Deduplicate by normalized selector, compute the composite ordering, and
/// return the strongest `MAX_CANDIDATES`. Ordering is fully deterministic:
/// tier weight, framework boost, headline-plausible sample, item count, then
/// discovery strategy and finally the selector string itself.
pub fn rank(candidates: Vec<ItemCandidate>, detections: &[DetectionResult]) -> Vec<ItemCandidate> {
    let hints = hint_selectors(detections);

    // On duplicate selectors keep the higher tier, then the bigger count.
    let mut merged: HashMap<String, ItemCandidate> = HashMap::new();
    for cand in candidates {
        let key = cand.selector.to_string();
        match merged.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(cand);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if (cand.tier.weight(), cand.count) > (existing.tier.weight(), existing.count) {
                    *existing = cand;
                }
            }
        }
    }

    let mut ranked: Vec<ItemCandidate> = merged
        .into_values()
        .map(|mut c| {
            c.boosted = hints.iter().any(|h| specializes(c.selector.css(), h));
            c
        })
        .collect();

    ranked.sort_by_key(|c| {
        (
            Reverse(c.tier.weight()),
            Reverse(c.boosted),
            Reverse(title_plausible(&c.sample)),
            Reverse(c.count),
            c.origin,
            c.selector.to_string(),
        )
    });
    ranked.truncate(MAX_CANDIDATES);
    ranked
}

/// Normalized hint selectors from every confidently detected profile.
fn hint_selectors(detections: &[DetectionResult]) -> Vec<String> {
    let mut out = Vec::new();
    for det in detections {
        if det.confidence < FRAMEWORK_MATCH_THRESHOLD {
            continue;
        }
        let Some(profile) = registry::profile(&det.framework) else {
            continue;
        };
        for hint in profile.item_hints {
            if let Ok(sel) = StructuralSelector::parse(hint) {
                out.push(sel.css().to_string());
            }
        }
    }
    out
}

/// A candidate is boosted when it equals a hint or narrows one
/// (`.post-card.featured`, `.post-card > h2`, ...).
fn specializes(candidate: &str, hint: &str) -> bool {
    if candidate == hint {
        return true;
    }
    candidate
        .strip_prefix(hint)
        .and_then(|rest| rest.chars().next())
        .map(|c| matches!(c, '.' | '[' | ':' | ' ' | '#'))
        .unwrap_or(false)
}

/// Sample text resembles a headline: non-empty, not purely
/// numeric/whitespace/punctuation, and of plausible title length.
pub fn title_plausible(sample: &str) -> bool {
    let sample = sample.trim();
    let len = sample.chars().count();
    if !(TITLE_MIN_LEN..=TITLE_MAX_LEN).contains(&len) {
        return false;
    }
    sample.chars().any(|c| c.is_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Strategy, Tier};

    fn cand(sel: &str, count: usize, sample: &str, origin: Strategy, tier: Tier) -> ItemCandidate {
        ItemCandidate {
            selector: StructuralSelector::parse(sel).unwrap(),
            count,
            sample: sample.to_string(),
            origin,
            tier,
            boosted: false,
        }
    }

    #[test]
    fn duplicates_keep_the_stronger_entry() {
        let ranked = rank(
            vec![
                cand(".card", 5, "A headline here", Strategy::RepeatedClass, Tier::Medium),
                cand(".card", 8, "A headline here", Strategy::FrameworkHint, Tier::VeryHigh),
            ],
            &[],
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].tier, Tier::VeryHigh);
        assert_eq!(ranked[0].count, 8);
    }

    #[test]
    fn boosted_and_title_plausible_outrank_equal_tier() {
        let detections = vec![DetectionResult {
            framework: "ghost".into(),
            confidence: 60,
        }];
        let ranked = rank(
            vec![
                cand("div.widget", 40, "12345", Strategy::RepeatedClass, Tier::Medium),
                cand(
                    ".post-card",
                    10,
                    "An interesting story",
                    Strategy::RepeatedClass,
                    Tier::Medium,
                ),
            ],
            &detections,
        );
        assert_eq!(ranked[0].selector.to_string(), ".post-card");
        assert!(ranked[0].boosted);
        assert!(!ranked[1].boosted);
    }

    #[test]
    fn count_breaks_remaining_ties() {
        let ranked = rank(
            vec![
                cand(".a-list", 10, "Some headline text", Strategy::RepeatedClass, Tier::Medium),
                cand(".b-list", 30, "Some headline text", Strategy::RepeatedClass, Tier::Medium),
            ],
            &[],
        );
        assert_eq!(ranked[0].selector.to_string(), ".b-list");
    }

    #[test]
    fn ties_fall_back_to_strategy_then_selector() {
        let ranked = rank(
            vec![
                cand(".z-item", 5, "Headline text", Strategy::SemanticTag, Tier::Medium),
                cand(".a-item", 5, "Headline text", Strategy::SemanticTag, Tier::Medium),
                cand(".m-item", 5, "Headline text", Strategy::RepeatedClass, Tier::Medium),
            ],
            &[],
        );
        let order: Vec<String> = ranked.iter().map(|c| c.selector.to_string()).collect();
        assert_eq!(order, vec![".m-item", ".a-item", ".z-item"]);
    }

    #[test]
    fn truncates_to_the_cutoff() {
        let mut input = Vec::new();
        for i in 0..40 {
            input.push(cand(
                &format!(".group-{i:02}"),
                4,
                "Sample headline",
                Strategy::RepeatedClass,
                Tier::Medium,
            ));
        }
        let ranked = rank(input, &[]);
        assert_eq!(ranked.len(), MAX_CANDIDATES);
    }

    #[test]
    fn specialization_counts_as_boost() {
        assert!(specializes(".post-card", ".post-card"));
        assert!(specializes(".post-card.featured", ".post-card"));
        assert!(specializes(".post-card > h2", ".post-card"));
        assert!(!specializes(".post-cards", ".post-card"));
        assert!(!specializes(".other", ".post-card"));
    }

    #[test]
    fn title_plausibility_bounds() {
        assert!(title_plausible("A perfectly normal headline"));
        assert!(!title_plausible(""));
        assert!(!title_plausible("42"));
        assert!(!title_plausible("1234567"));
        assert!(!title_plausible(&"x".repeat(TITLE_MAX_LEN + 1)));
    }
}
