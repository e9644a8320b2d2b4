//! Field detection: map a chosen item element to per-field selectors.
//!
//! Strategies are an explicit ordered list with one signature; for each
//! requested field the first strategy returning a confident selection wins.
//! Every proposed selector must actually pull a non-empty value out of at
//! least one sampled item before it is accepted, so the output is known to
//! work on this document. A field no strategy can fill is simply omitted.

use crate::detect;
use crate::patterns::{self, BYLINE_TEXT, MONEY, SCORE_TEXT};
use crate::registry::{self, FrameworkProfile};
use crate::selector::{collapse_ws, is_css_safe, StructuralSelector};
use crate::selectors::{LINK_SELECTOR, IMG_SELECTOR, TH_SELECTOR, TR_SELECTOR, UNIVERSAL_SELECTOR};
use crate::types::{FieldKind, FieldSelection, Tier};
use scraper::{ElementRef, Html};

/// How many matched items are inspected when proposing and confirming
/// selectors. More buys robustness against an odd first item, at linear cost.
pub const SAMPLE_ITEMS: usize = 5;

/// Anchor words that mark action/navigation links, not titles.
pub const NAV_ACTION_WORDS: &[&str] = &[
    "reply", "share", "vote", "upvote", "downvote", "flag", "hide", "comment", "comments",
    "next", "prev", "previous", "more", "login", "register", "signup", "edit", "delete",
    "report", "permalink", "save", "discuss",
];

const TITLE_CLASS_HINTS: &[&str] = &["title", "headline", "name", "link", "heading"];
const AUTHOR_HREF_HINTS: &[&str] = &["/user/", "/u/", "/author/", "/profile/", "/member", "/people/"];
const AUTHOR_CLASS_HINTS: &[&str] = &["author", "byline", "username", "submitter", "hnuser"];
const PRICE_CLASS_HINTS: &[&str] = &["price", "cost", "amount"];
const SCORE_CLASS_HINTS: &[&str] = &["score", "points", "votes", "karma", "likes", "rating"];
const CATEGORY_HREF_HINTS: &[&str] = &[
    "/category/", "/categories/", "/tag/", "/tags/", "/topic/", "/topics/", "/section/",
];
const CATEGORY_CLASS_HINTS: &[&str] = &["category", "tag", "label", "badge"];
const DATE_ATTRS: &[&str] = &["datetime", "title", "content", "data-date", "data-time"];

/// Header-cell keywords per field for grid-row items. Matching is "equal, or
/// contains for keywords of three letters and up" so `by` cannot fire inside
/// an unrelated word.
const HEADER_KEYWORDS: &[(FieldKind, &[&str])] = &[
    (FieldKind::Title, &["title", "headline", "subject", "name", "article", "story"]),
    (FieldKind::Url, &["title", "headline", "subject", "name", "article", "story"]),
    (FieldKind::Date, &["date", "posted", "published", "updated", "when", "time", "created"]),
    (FieldKind::Author, &["author", "by", "poster", "submitter", "user", "owner"]),
    (FieldKind::Score, &["score", "points", "votes", "rating", "stars"]),
    (FieldKind::Price, &["price", "cost", "amount"]),
    (FieldKind::Category, &["category", "section", "type", "tag", "topic"]),
    (FieldKind::Description, &["description", "summary", "details"]),
];

struct FieldContext<'a> {
    items: Vec<ElementRef<'a>>,
    profile: Option<&'static FrameworkProfile>,
    /// Lowercased header-cell texts when the item is a row in a grid with a
    /// header row.
    headers: Option<Vec<String>>,
}

type FieldStrategy = fn(&FieldContext<'_>, FieldKind) -> Option<FieldSelection>;

/// Fixed priority order; iteration short-circuits on the first hit.
const STRATEGIES: &[FieldStrategy] = &[
    framework_map,
    table_column,
    semantic_structure,
    heuristic_scan,
];

/// Detect a selector for each requested field relative to the chosen item
/// pattern. Fields nothing matched are absent from the result, which is a
/// normal outcome.
pub fn detect_fields(
    doc: &Html,
    item_selector: &StructuralSelector,
    fields: &[FieldKind],
) -> Vec<FieldSelection> {
    let mut items = item_selector.select_doc(doc);
    items.truncate(SAMPLE_ITEMS);
    if items.is_empty() {
        return Vec::new();
    }

    let profile = detect::detect_best(doc).and_then(|d| registry::profile(&d.framework));
    let headers = table_headers(items[0]);
    let ctx = FieldContext {
        items,
        profile,
        headers,
    };

    let mut out = Vec::new();
    for &field in fields {
        for strategy in STRATEGIES {
            if let Some(pick) = strategy(&ctx, field) {
                out.push(pick);
                break;
            }
        }
    }
    out
}

/* -------- shared plumbing -------- */

/// Parse and confirm a candidate selector: it must yield a non-empty value
/// from at least one sampled item. Unparseable candidates are dropped here,
/// never propagated.
fn try_sel(ctx: &FieldContext<'_>, field: FieldKind, text: &str, tier: Tier) -> Option<FieldSelection> {
    let selector = StructuralSelector::parse(text).ok()?;
    let confirmed = ctx
        .items
        .iter()
        .any(|item| selector.extract_from(*item).is_some());
    confirmed.then(|| FieldSelection {
        field,
        selector,
        tier,
    })
}

/// Header texts for the grid the item row belongs to, if any.
fn table_headers(row: ElementRef<'_>) -> Option<Vec<String>> {
    if row.value().name() != "tr" {
        return None;
    }
    let table = row
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "table")?;
    for tr in table.select(&TR_SELECTOR) {
        let cells: Vec<String> = tr
            .select(&TH_SELECTOR)
            .map(|th| collapse_ws(&th.text().collect::<String>()).to_lowercase())
            .collect();
        if !cells.is_empty() {
            return Some(cells);
        }
    }
    None
}

/// Build a short selector for `target` relative to its containing `item`:
/// the target's own class when it has a usable one, else the nearest classed
/// ancestor inside the item, else a plain tag path. Each shape is kept only
/// if its first match inside the item really is the target; the last resort
/// pins the position with `:nth-of-type`.
fn relative_selector(item: ElementRef<'_>, target: ElementRef<'_>) -> String {
    let tag = target.value().name();
    if let Some(cls) = first_safe_class(target) {
        let rel = format!("{tag}.{cls}");
        if first_match_is(item, &rel, target) {
            return rel;
        }
    }
    let mut anc = target.parent().and_then(ElementRef::wrap);
    while let Some(a) = anc {
        if a.id() == item.id() {
            break;
        }
        if let Some(cls) = first_safe_class(a) {
            let rel = format!(".{cls} {tag}");
            if first_match_is(item, &rel, target) {
                return rel;
            }
            break;
        }
        anc = a.parent().and_then(ElementRef::wrap);
    }

    let rel = tag_path(item, target);
    if first_match_is(item, &rel, target) {
        return rel;
    }

    let nth = 1 + target
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|s| s.value().name() == tag)
        .count();
    match target.parent().and_then(ElementRef::wrap) {
        Some(p) if p.id() != item.id() => {
            format!("{} > {tag}:nth-of-type({nth})", tag_path(item, p))
        }
        _ => format!("{tag}:nth-of-type({nth})"),
    }
}

/// Plain `>`-joined tag chain from just below `item` down to `target`.
fn tag_path(item: ElementRef<'_>, target: ElementRef<'_>) -> String {
    let mut path = vec![target.value().name().to_string()];
    let mut cur = target.parent().and_then(ElementRef::wrap);
    while let Some(a) = cur {
        if a.id() == item.id() {
            break;
        }
        path.push(a.value().name().to_string());
        cur = a.parent().and_then(ElementRef::wrap);
    }
    path.reverse();
    path.join(" > ")
}

fn first_match_is(item: ElementRef<'_>, rel: &str, target: ElementRef<'_>) -> bool {
    StructuralSelector::parse(rel)
        .map(|sel| {
            sel.select_within(item)
                .first()
                .map(|el| el.id() == target.id())
                .unwrap_or(false)
        })
        .unwrap_or(false)
}

fn first_safe_class(el: ElementRef<'_>) -> Option<String> {
    el.value()
        .classes()
        .find(|c| is_css_safe(c))
        .map(|c| c.to_string())
}

fn class_contains(el: ElementRef<'_>, hints: &[&str]) -> bool {
    el.value().classes().any(|c| {
        let lc = c.to_lowercase();
        hints.iter().any(|h| lc.contains(h))
    })
}

/// Text of the element's own text-node children only, so a match points at
/// the tightest element rather than a whole subtree.
fn direct_text(el: ElementRef<'_>) -> String {
    let mut s = String::new();
    for child in el.children() {
        if let Some(t) = child.value().as_text() {
            s.push_str(t);
        }
    }
    collapse_ws(&s)
}

/* -------- strategy 1: framework field map -------- */

fn framework_map(ctx: &FieldContext<'_>, field: FieldKind) -> Option<FieldSelection> {
    let profile = ctx.profile?;
    let (_, candidates) = profile.field_map.iter().find(|(f, _)| *f == field)?;
    candidates
        .iter()
        .find_map(|c| try_sel(ctx, field, c, Tier::VeryHigh))
}

/* -------- strategy 2: table header column mapping -------- */

fn table_column(ctx: &FieldContext<'_>, field: FieldKind) -> Option<FieldSelection> {
    let headers = ctx.headers.as_ref()?;
    let (_, keywords) = HEADER_KEYWORDS.iter().find(|(f, _)| *f == field)?;
    let col = headers.iter().position(|h| {
        keywords
            .iter()
            .any(|k| h == k || (k.len() >= 3 && h.contains(k)))
    })? + 1;
    let text = match field {
        FieldKind::Url => format!("td:nth-child({col}) a@href"),
        _ => format!("td:nth-child({col})"),
    };
    try_sel(ctx, field, &text, Tier::VeryHigh)
}

/* -------- strategy 3: semantic structure -------- */

fn semantic_structure(ctx: &FieldContext<'_>, field: FieldKind) -> Option<FieldSelection> {
    let candidates: &[&str] = match field {
        FieldKind::Title => &["h1", "h2", "h3", "h4", "[itemprop=name]", "[itemprop=headline]"],
        FieldKind::Url => &[
            "h1 a@href",
            "h2 a@href",
            "h3 a@href",
            "h4 a@href",
            "[itemprop=url]@href",
        ],
        FieldKind::Date => &[
            "time@datetime",
            "time",
            "[itemprop=datePublished]@datetime",
            "[itemprop=datePublished]",
        ],
        FieldKind::Author => &["[rel=author]", "[itemprop=author]", "address a", "address"],
        FieldKind::Image => &["[itemprop=image]@src", "figure img@src"],
        FieldKind::Price => &["[itemprop=price]@content", "[itemprop=price]"],
        _ => return None,
    };
    candidates
        .iter()
        .find_map(|c| try_sel(ctx, field, c, Tier::High))
}

/* -------- strategy 4: generic heuristics -------- */

fn heuristic_scan(ctx: &FieldContext<'_>, field: FieldKind) -> Option<FieldSelection> {
    match field {
        FieldKind::Title | FieldKind::Url => heuristic_anchor(ctx, field),
        FieldKind::Date => heuristic_date(ctx),
        FieldKind::Author => heuristic_author(ctx),
        FieldKind::Image => heuristic_image(ctx),
        FieldKind::Price => heuristic_price(ctx),
        FieldKind::Score => heuristic_score(ctx),
        FieldKind::Category => heuristic_category(ctx),
        FieldKind::Description => heuristic_description(ctx),
    }
}

/// Score every hyperlink in the item: longer, content-looking text wins;
/// action words, fragment/javascript hrefs lose; a title-ish class context
/// gains. The winner becomes both the title (text) and url (href) selector.
fn best_anchor<'a>(item: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let mut best: Option<(i64, ElementRef<'a>)> = None;
    for a in item.select(&LINK_SELECTOR) {
        let text = collapse_ws(&a.text().collect::<String>());
        if text.is_empty() {
            continue;
        }
        let mut score = text.chars().count().min(80) as i64;
        let lower = text.to_lowercase();
        if lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|w| NAV_ACTION_WORDS.contains(&w))
        {
            score -= 100;
        }
        if let Some(href) = a.value().attr("href") {
            if href.starts_with('#') || href.starts_with("javascript:") {
                score -= 50;
            }
        }
        if class_contains(a, TITLE_CLASS_HINTS) {
            score += 30;
        } else if let Some(parent) = a.parent().and_then(ElementRef::wrap) {
            if class_contains(parent, TITLE_CLASS_HINTS) {
                score += 20;
            }
        }
        if best.map(|b| score > b.0).unwrap_or(true) {
            best = Some((score, a));
        }
    }
    best.filter(|b| b.0 > 0).map(|b| b.1)
}

fn heuristic_anchor(ctx: &FieldContext<'_>, field: FieldKind) -> Option<FieldSelection> {
    for item in &ctx.items {
        if let Some(a) = best_anchor(*item) {
            let rel = relative_selector(*item, a);
            let text = match field {
                FieldKind::Url => format!("{rel}@href"),
                _ => rel,
            };
            if let Some(pick) = try_sel(ctx, field, &text, Tier::Medium) {
                return Some(pick);
            }
        }
    }
    None
}

fn heuristic_date(ctx: &FieldContext<'_>) -> Option<FieldSelection> {
    for item in &ctx.items {
        for el in item.select(&UNIVERSAL_SELECTOR) {
            for attr in DATE_ATTRS {
                if let Some(v) = el.value().attr(attr) {
                    if patterns::looks_like_date(v) {
                        let text = format!("{}@{attr}", relative_selector(*item, el));
                        if let Some(pick) = try_sel(ctx, FieldKind::Date, &text, Tier::Medium) {
                            return Some(pick);
                        }
                    }
                }
            }
            if patterns::looks_like_date(&direct_text(el)) {
                let text = relative_selector(*item, el);
                if let Some(pick) = try_sel(ctx, FieldKind::Date, &text, Tier::Medium) {
                    return Some(pick);
                }
            }
        }
    }
    None
}

fn heuristic_author(ctx: &FieldContext<'_>) -> Option<FieldSelection> {
    for item in &ctx.items {
        for a in item.select(&LINK_SELECTOR) {
            let href = a.value().attr("href").unwrap_or("");
            let by_href = AUTHOR_HREF_HINTS.iter().any(|h| href.contains(h));
            if by_href || class_contains(a, AUTHOR_CLASS_HINTS) {
                let text = relative_selector(*item, a);
                if let Some(pick) = try_sel(ctx, FieldKind::Author, &text, Tier::Medium) {
                    return Some(pick);
                }
            }
        }
        for el in item.select(&UNIVERSAL_SELECTOR) {
            if class_contains(el, AUTHOR_CLASS_HINTS) && !direct_text(el).is_empty() {
                let text = relative_selector(*item, el);
                if let Some(pick) = try_sel(ctx, FieldKind::Author, &text, Tier::Medium) {
                    return Some(pick);
                }
            }
        }
        for el in item.select(&UNIVERSAL_SELECTOR) {
            if BYLINE_TEXT.is_match(&direct_text(el)) {
                let text = relative_selector(*item, el);
                if let Some(pick) = try_sel(ctx, FieldKind::Author, &text, Tier::Low) {
                    return Some(pick);
                }
            }
        }
    }
    None
}

fn heuristic_image(ctx: &FieldContext<'_>) -> Option<FieldSelection> {
    for item in &ctx.items {
        for img in item.select(&IMG_SELECTOR) {
            if img.value().attr("src").map(|s| !s.trim().is_empty()) == Some(true) {
                let text = format!("{}@src", relative_selector(*item, img));
                if let Some(pick) = try_sel(ctx, FieldKind::Image, &text, Tier::Medium) {
                    return Some(pick);
                }
            }
        }
    }
    None
}

fn heuristic_price(ctx: &FieldContext<'_>) -> Option<FieldSelection> {
    for item in &ctx.items {
        for el in item.select(&UNIVERSAL_SELECTOR) {
            if class_contains(el, PRICE_CLASS_HINTS) && MONEY.is_match(&direct_text(el)) {
                let text = relative_selector(*item, el);
                if let Some(pick) = try_sel(ctx, FieldKind::Price, &text, Tier::Medium) {
                    return Some(pick);
                }
            }
        }
        for el in item.select(&UNIVERSAL_SELECTOR) {
            if MONEY.is_match(&direct_text(el)) {
                let text = relative_selector(*item, el);
                if let Some(pick) = try_sel(ctx, FieldKind::Price, &text, Tier::Low) {
                    return Some(pick);
                }
            }
        }
    }
    None
}

fn heuristic_score(ctx: &FieldContext<'_>) -> Option<FieldSelection> {
    for item in &ctx.items {
        for el in item.select(&UNIVERSAL_SELECTOR) {
            if class_contains(el, SCORE_CLASS_HINTS) && SCORE_TEXT.is_match(&direct_text(el)) {
                let text = relative_selector(*item, el);
                if let Some(pick) = try_sel(ctx, FieldKind::Score, &text, Tier::Medium) {
                    return Some(pick);
                }
            }
        }
        // Bare numbers are too ambiguous; require a unit word.
        for el in item.select(&UNIVERSAL_SELECTOR) {
            let t = direct_text(el);
            if SCORE_TEXT.is_match(&t) && t.chars().any(|c| c.is_alphabetic()) {
                let text = relative_selector(*item, el);
                if let Some(pick) = try_sel(ctx, FieldKind::Score, &text, Tier::Low) {
                    return Some(pick);
                }
            }
        }
    }
    None
}

fn heuristic_category(ctx: &FieldContext<'_>) -> Option<FieldSelection> {
    for item in &ctx.items {
        for a in item.select(&LINK_SELECTOR) {
            let href = a.value().attr("href").unwrap_or("");
            if CATEGORY_HREF_HINTS.iter().any(|h| href.contains(h)) {
                let text = relative_selector(*item, a);
                if let Some(pick) = try_sel(ctx, FieldKind::Category, &text, Tier::Medium) {
                    return Some(pick);
                }
            }
        }
        for el in item.select(&UNIVERSAL_SELECTOR) {
            if class_contains(el, CATEGORY_CLASS_HINTS) && !direct_text(el).is_empty() {
                let text = relative_selector(*item, el);
                if let Some(pick) = try_sel(ctx, FieldKind::Category, &text, Tier::Low) {
                    return Some(pick);
                }
            }
        }
    }
    None
}

fn heuristic_description(ctx: &FieldContext<'_>) -> Option<FieldSelection> {
    for (text, tier) in [
        (".summary", Tier::Medium),
        (".excerpt", Tier::Medium),
        (".description", Tier::Medium),
        ("p", Tier::Low),
    ] {
        if let Some(pick) = try_sel(ctx, FieldKind::Description, text, tier) {
            return Some(pick);
        }
    }
    None
}
