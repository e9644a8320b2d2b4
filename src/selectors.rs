//! Shared Selectors

use once_cell::sync::Lazy;
use scraper::Selector;

/// Selector for anchor elements with hrefs.
pub static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid link selector"));

/// Selector for every element in the tree.
pub static UNIVERSAL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("*").expect("valid universal selector"));

/// Selector for `<meta name="generator">` tags.
pub static GENERATOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[name=generator]").expect("valid generator selector"));

/// Selector for script and stylesheet resource references.
pub static RESOURCE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script[src], link[href]").expect("valid resource selector"));

/// Selector for `<table>` elements.
pub static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("valid table selector"));

/// Selector for table rows.
pub static TR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("valid tr selector"));

/// Selector for header cells.
pub static TH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th").expect("valid th selector"));

/// Selector for data cells.
pub static TD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("valid td selector"));

/// Selector for images.
pub static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("valid img selector"));
