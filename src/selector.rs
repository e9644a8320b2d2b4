use crate::error::{ItemsenseError, Result};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Whether a selector yields the matched element's text content or one of
/// its attribute values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    Text,
    Attribute(String),
}

/// A structural selector plus its extraction mode.
///
/// The string form is standard CSS (whatever `scraper` accepts: tags,
/// `.class`, `#id`, attribute predicates, descendant and `>` combinators)
/// with an optional trailing `@attr` suffix:
///
/// * `a.title`        — text content of `a.title` under the item
/// * `a.title@href`   — `href` attribute of `a.title` under the item
/// * `@data-id`       — `data-id` attribute of the item element itself
///
/// Construction validates the CSS part; malformed text fails with
/// [`ItemsenseError::InvalidSelectorSyntax`] and is never silently degraded.
/// Two selectors are equal when their normalized string forms match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StructuralSelector {
    css: String,
    mode: ExtractionMode,
    compiled: Option<Selector>,
}

impl StructuralSelector {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ItemsenseError::InvalidSelectorSyntax(
                "empty selector".into(),
            ));
        }

        let (css_raw, mode) = split_mode_suffix(text)?;
        let css = normalize_css(css_raw);

        let compiled = if css.is_empty() {
            // Bare `@attr` reads the attribute off the item container itself;
            // an empty CSS part with text mode selects nothing meaningful.
            if mode == ExtractionMode::Text {
                return Err(ItemsenseError::InvalidSelectorSyntax(text.into()));
            }
            None
        } else {
            // Validate the author's text as written, then compile the
            // canonical form actually stored.
            Selector::parse(css_raw)
                .map_err(|_| ItemsenseError::InvalidSelectorSyntax(css_raw.into()))?;
            Some(
                Selector::parse(&css)
                    .map_err(|_| ItemsenseError::InvalidSelectorSyntax(css.clone()))?,
            )
        };

        Ok(StructuralSelector {
            css,
            mode,
            compiled,
        })
    }

    /// The normalized CSS part, without the extraction suffix. Empty for the
    /// bare `@attr` form.
    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn mode(&self) -> &ExtractionMode {
        &self.mode
    }

    /// All matches in the whole document, in document order.
    pub fn select_doc<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        match &self.compiled {
            Some(sel) => doc.select(sel).collect(),
            None => Vec::new(),
        }
    }

    /// All matches among the descendants of `scope`. Zero matches is not an
    /// error, the sequence is just empty.
    pub fn select_within<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        match &self.compiled {
            Some(sel) => scope.select(sel).collect(),
            None => Vec::new(),
        }
    }

    /// Apply this selector relative to one item element and pull out a value
    /// per the extraction mode. `None` means no match or an empty value.
    pub fn extract_from(&self, item: ElementRef<'_>) -> Option<String> {
        match (&self.compiled, &self.mode) {
            // `@attr` with no element target: the item container itself.
            (None, ExtractionMode::Attribute(name)) => {
                item.value().attr(name).map(str::trim).and_then(non_empty)
            }
            (None, ExtractionMode::Text) => None,
            (Some(sel), mode) => {
                for el in item.select(sel) {
                    let value = match mode {
                        ExtractionMode::Text => collapse_ws(&el.text().collect::<String>()),
                        ExtractionMode::Attribute(name) => {
                            el.value().attr(name).unwrap_or("").trim().to_string()
                        }
                    };
                    if !value.is_empty() {
                        return Some(value);
                    }
                }
                None
            }
        }
    }
}

impl fmt::Display for StructuralSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.mode {
            ExtractionMode::Text => f.write_str(&self.css),
            ExtractionMode::Attribute(name) => write!(f, "{}@{}", self.css, name),
        }
    }
}

impl PartialEq for StructuralSelector {
    fn eq(&self, other: &Self) -> bool {
        self.css == other.css && self.mode == other.mode
    }
}
impl Eq for StructuralSelector {}

impl Hash for StructuralSelector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.css.hash(state);
        self.mode.hash(state);
    }
}

impl TryFrom<String> for StructuralSelector {
    type Error = ItemsenseError;
    fn try_from(value: String) -> Result<Self> {
        StructuralSelector::parse(&value)
    }
}

impl From<StructuralSelector> for String {
    fn from(sel: StructuralSelector) -> String {
        sel.to_string()
    }
}

/* -------- suffix + normalization helpers -------- */

/// Split a trailing `@attr` extraction suffix off the selector text. The `@`
/// must sit outside bracket predicates and quotes so attribute values keep
/// their content.
fn split_mode_suffix(text: &str) -> Result<(&str, ExtractionMode)> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut split_at: Option<usize> = None;
    for (i, c) in text.char_indices() {
        match (c, quote) {
            (q, Some(open)) if q == open => quote = None,
            (_, Some(_)) => {}
            ('"' | '\'', None) => quote = Some(c),
            ('[', None) => depth += 1,
            (']', None) => depth = depth.saturating_sub(1),
            ('@', None) if depth == 0 => split_at = Some(i),
            _ => {}
        }
    }
    match split_at {
        None => Ok((text, ExtractionMode::Text)),
        Some(i) => {
            let attr = text[i + 1..].trim();
            if attr.is_empty() || !attr.chars().all(is_attr_name_char) {
                return Err(ItemsenseError::InvalidSelectorSyntax(text.into()));
            }
            Ok((text[..i].trim_end(), ExtractionMode::Attribute(attr.to_string())))
        }
    }
}

fn is_attr_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'
}

/// Canonicalize a CSS selector string: collapse whitespace, space combinators
/// uniformly, and sort attribute predicates within each compound so that
/// `a[target=_blank][href]` and `a[href][target=_blank]` compare equal.
pub(crate) fn normalize_css(css: &str) -> String {
    css.split(',')
        .map(|part| normalize_complex(part.trim()))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn normalize_complex(part: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut compound = String::new();
    let mut pending_combinator: Option<char> = None;
    let mut depth = 0usize; // brackets and parens; inside them nothing splits
    let mut quote: Option<char> = None;

    let flush = |compound: &mut String, pending: &mut Option<char>, out: &mut Vec<String>| {
        if compound.is_empty() {
            return;
        }
        if let Some(c) = pending.take() {
            out.push(c.to_string());
        } else if !out.is_empty() {
            out.push(" ".into());
        }
        out.push(normalize_compound(compound));
        compound.clear();
    };

    for c in part.chars() {
        if let Some(open) = quote {
            compound.push(c);
            if c == open {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                compound.push(c);
            }
            '[' | '(' => {
                depth += 1;
                compound.push(c);
            }
            ']' | ')' => {
                depth = depth.saturating_sub(1);
                compound.push(c);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !compound.is_empty() {
                    flush(&mut compound, &mut pending_combinator, &mut out);
                }
            }
            '>' | '+' | '~' if depth == 0 => {
                if !compound.is_empty() {
                    flush(&mut compound, &mut pending_combinator, &mut out);
                }
                pending_combinator = Some(c);
            }
            _ => compound.push(c),
        }
    }
    if !compound.is_empty() {
        flush(&mut compound, &mut pending_combinator, &mut out);
    }

    // Join: combinators get one space either side, descendant a single space.
    let mut s = String::new();
    for piece in out {
        match piece.as_str() {
            ">" | "+" | "~" => {
                s.push(' ');
                s.push_str(&piece);
                s.push(' ');
            }
            " " => s.push(' '),
            _ => s.push_str(&piece),
        }
    }
    s
}

/// Within one compound selector, pull out `[...]` predicates, sort them, and
/// reattach after everything else. Compound order has no effect on matching.
fn normalize_compound(compound: &str) -> String {
    let mut head = String::new();
    let mut brackets: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut parens = 0usize;
    let mut quote: Option<char> = None;

    for c in compound.chars() {
        if let Some(open) = quote {
            current.push(c);
            if c == open {
                quote = None;
            }
            continue;
        }
        // Functional pseudo-classes keep their arguments verbatim; only
        // top-level [..] predicates take part in reordering.
        if parens > 0 {
            if c == '(' {
                parens += 1;
            } else if c == ')' {
                parens -= 1;
            }
            head.push(c);
            continue;
        }
        match c {
            '(' if depth == 0 => {
                parens += 1;
                head.push(c);
            }
            '"' | '\'' if depth > 0 => {
                quote = Some(c);
                current.push(c);
            }
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
                if depth == 0 {
                    brackets.push(std::mem::take(&mut current));
                }
            }
            _ if depth > 0 => current.push(c),
            _ => head.push(c),
        }
    }
    // Unbalanced bracket: keep the text as-is, the compile step rejects it.
    if depth > 0 {
        head.push_str(&current);
    }

    brackets.sort();
    let mut s = head;
    for b in brackets {
        s.push_str(&b);
    }
    s
}

/// Conservative CSS identifier check: tokens that would need escaping
/// (Tailwind-style `md:flex`, leading digits) are skipped rather than quoted.
pub(crate) fn is_css_safe(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        Some('-') => match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        },
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_selector_as_text_mode() {
        let sel = StructuralSelector::parse("a.title").unwrap();
        assert_eq!(sel.css(), "a.title");
        assert_eq!(sel.mode(), &ExtractionMode::Text);
        assert_eq!(sel.to_string(), "a.title");
    }

    #[test]
    fn parses_attribute_suffix() {
        let sel = StructuralSelector::parse("a.title@href").unwrap();
        assert_eq!(sel.css(), "a.title");
        assert_eq!(
            sel.mode(),
            &ExtractionMode::Attribute("href".to_string())
        );
        assert_eq!(sel.to_string(), "a.title@href");
    }

    #[test]
    fn bare_attribute_targets_the_item_itself() {
        let sel = StructuralSelector::parse("@data-id").unwrap();
        assert_eq!(sel.css(), "");
        let doc = Html::parse_document(r#"<div class="row" data-id="42">x</div>"#);
        let item = StructuralSelector::parse(".row")
            .unwrap()
            .select_doc(&doc)
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(sel.extract_from(item), Some("42".to_string()));
    }

    #[test]
    fn rejects_malformed_css() {
        assert!(StructuralSelector::parse("div[unclosed").is_err());
        assert!(StructuralSelector::parse("..oops").is_err());
        assert!(StructuralSelector::parse("").is_err());
        assert!(StructuralSelector::parse("@").is_err());
    }

    #[test]
    fn normalization_orders_attribute_predicates() {
        let a = StructuralSelector::parse("a[target=_blank][href]").unwrap();
        let b = StructuralSelector::parse("a[href][target=_blank]").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn normalization_collapses_whitespace_and_combinators() {
        let sel = StructuralSelector::parse("ul.list   >  li  a").unwrap();
        assert_eq!(sel.to_string(), "ul.list > li a");
    }

    #[test]
    fn round_trip_applies_identically() {
        let html = r#"
            <ul class="list">
              <li><a href="/a" target="_blank">One</a></li>
              <li><a href="/b" target="_blank">Two</a></li>
            </ul>"#;
        let doc = Html::parse_document(html);
        let first = StructuralSelector::parse("ul.list > li a[target=_blank][href]").unwrap();
        let reparsed = StructuralSelector::parse(&first.to_string()).unwrap();
        assert_eq!(first, reparsed);
        let texts = |s: &StructuralSelector| {
            s.select_doc(&doc)
                .iter()
                .map(|el| el.text().collect::<String>())
                .collect::<Vec<_>>()
        };
        assert_eq!(texts(&first), texts(&reparsed));
        assert_eq!(texts(&first), vec!["One", "Two"]);
    }

    #[test]
    fn functional_pseudo_classes_survive_normalization() {
        let sel = StructuralSelector::parse("li:nth-child(2n + 1)").unwrap();
        assert_eq!(sel.to_string(), "li:nth-child(2n + 1)");
        let sel = StructuralSelector::parse("a:nth-of-type(3)@href").unwrap();
        assert_eq!(sel.to_string(), "a:nth-of-type(3)@href");
    }

    #[test]
    fn zero_matches_is_empty_not_error() {
        let doc = Html::parse_document("<p>hi</p>");
        let sel = StructuralSelector::parse(".nothing-here").unwrap();
        assert!(sel.select_doc(&doc).is_empty());
    }

    #[test]
    fn extracts_text_and_attribute_relative_to_item() {
        let doc = Html::parse_document(
            r#"<div class="card"><h2><a href="/post/1">Hello world</a></h2></div>"#,
        );
        let item = StructuralSelector::parse(".card")
            .unwrap()
            .select_doc(&doc)[0];
        let title = StructuralSelector::parse("h2 a").unwrap();
        let link = StructuralSelector::parse("h2 a@href").unwrap();
        assert_eq!(title.extract_from(item), Some("Hello world".to_string()));
        assert_eq!(link.extract_from(item), Some("/post/1".to_string()));
    }

    #[test]
    fn serde_round_trips_as_string() {
        let sel = StructuralSelector::parse("td:nth-child(3) a@href").unwrap();
        let json = serde_json::to_string(&sel).unwrap();
        assert_eq!(json, "\"td:nth-child(3) a@href\"");
        let back: StructuralSelector = serde_json::from_str(&json).unwrap();
        assert_eq!(sel, back);
    }
}
