use crate::selector::StructuralSelector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Semantic fields the engine knows how to look for inside an item.
///
/// `title`, `url`, `date` and `author` are requested by default; the rest are
/// opt-in per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Title,
    Url,
    Date,
    Author,
    Score,
    Image,
    Price,
    Category,
    Description,
}

impl FieldKind {
    pub const DEFAULT: &'static [FieldKind] = &[
        FieldKind::Title,
        FieldKind::Url,
        FieldKind::Date,
        FieldKind::Author,
    ];

    pub const ALL: &'static [FieldKind] = &[
        FieldKind::Title,
        FieldKind::Url,
        FieldKind::Date,
        FieldKind::Author,
        FieldKind::Score,
        FieldKind::Image,
        FieldKind::Price,
        FieldKind::Category,
        FieldKind::Description,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Title => "title",
            FieldKind::Url => "url",
            FieldKind::Date => "date",
            FieldKind::Author => "author",
            FieldKind::Score => "score",
            FieldKind::Image => "image",
            FieldKind::Price => "price",
            FieldKind::Category => "category",
            FieldKind::Description => "description",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = crate::error::ItemsenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(FieldKind::Title),
            "url" | "link" | "href" => Ok(FieldKind::Url),
            "date" => Ok(FieldKind::Date),
            "author" => Ok(FieldKind::Author),
            "score" => Ok(FieldKind::Score),
            "image" | "img" => Ok(FieldKind::Image),
            "price" => Ok(FieldKind::Price),
            "category" => Ok(FieldKind::Category),
            "description" => Ok(FieldKind::Description),
            other => Err(crate::error::ItemsenseError::Other(format!(
                "unknown field name: {other}"
            ))),
        }
    }
}

/// Coarse confidence ordinal used to rank candidates and field selections
/// before finer tie-breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Tier {
    /// Fixed numeric weight used as the primary sort key.
    pub fn weight(self) -> u8 {
        match self {
            Tier::VeryHigh => 4,
            Tier::High => 3,
            Tier::Medium => 2,
            Tier::Low => 1,
        }
    }
}

/// Which detection strategy produced a candidate. Variant order is the order
/// strategies run in, and doubles as the discovery-order tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    FrameworkHint,
    RepeatedClass,
    TableRow,
    SemanticTag,
    LinkCluster,
}

/// One proposed repeating-item selector, scored and sampled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCandidate {
    pub selector: StructuralSelector,
    /// How many elements the selector matches in the document.
    pub count: usize,
    /// Collapsed text of the first match, capped for display.
    pub sample: String,
    pub origin: Strategy,
    pub tier: Tier,
    /// Set by the ranker when the selector equals or specializes a hint from
    /// a detected framework profile.
    pub boosted: bool,
}

/// (framework name, confidence 0-100) as reported by the detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub framework: String,
    pub confidence: u32,
}

/// A selector chosen for one semantic field. Absence of a selection for a
/// requested field means "not detected", which is a normal outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSelection {
    pub field: FieldKind,
    pub selector: StructuralSelector,
    pub tier: Tier,
}

/// One extracted item: field name to value (None = selector matched nothing
/// for this item), plus the item's position in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub index: usize,
    pub values: BTreeMap<String, Option<String>>,
}

/// Normal, non-error outcomes the caller may want to surface or log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisNote {
    EmptyDocument,
    NoFrameworkMatch,
    NoCandidates,
}

/// Everything one analysis pass produces: framework matches plus the ranked
/// candidate list. The caller picks a candidate (or none) and moves on to
/// field detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// Best framework match at or above the detection threshold.
    pub framework: Option<DetectionResult>,
    /// Every profile that scored above zero, strongest first.
    pub frameworks: Vec<DetectionResult>,
    pub candidates: Vec<ItemCandidate>,
    pub notes: Vec<AnalysisNote>,
}

/// A persisted selector set: the shape handed to configuration storage and
/// read back at scrape time. Selectors are stored in string form (with the
/// `@attr` extraction-mode suffix) so the file stays hand-editable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,
    pub item_selector: String,
    pub fields: BTreeMap<String, String>,
}

impl JobSpec {
    /// Parse the stored item selector. A malformed selector is an error for
    /// the whole job since nothing can be extracted without it.
    pub fn item(&self) -> crate::error::Result<StructuralSelector> {
        StructuralSelector::parse(&self.item_selector)
    }

    /// Parse the stored field selectors, dropping any that fail to parse.
    /// A single bad field never blocks the rest of the job.
    pub fn field_selectors(&self) -> Vec<(String, StructuralSelector)> {
        self.fields
            .iter()
            .filter_map(|(name, text)| {
                StructuralSelector::parse(text)
                    .ok()
                    .map(|sel| (name.clone(), sel))
            })
            .collect()
    }

    pub fn from_selections(name: &str, item: &StructuralSelector, picks: &[FieldSelection]) -> Self {
        JobSpec {
            name: name.to_string(),
            item_selector: item.to_string(),
            fields: picks
                .iter()
                .map(|p| (p.field.to_string(), p.selector.to_string()))
                .collect(),
        }
    }
}

/// Handy wrapper when you want to print or pass a full result as one object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}
impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
