use crate::error::{ItemsenseError, Result};
use crate::selector::{ExtractionMode, StructuralSelector};
use crate::types::{Analysis, AnalysisNote, ExtractedRecord, FieldKind, FieldSelection, JobSpec};
use crate::{candidates, detect, extract, fields, rank};
use scraper::Html;
use url::Url;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Records shown by `preview_*`; production extraction is unbounded.
    pub preview_limit: usize,
    /// Fields requested when the caller does not name any.
    pub default_fields: Vec<FieldKind>,
}
impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            preview_limit: extract::PREVIEW_LIMIT,
            default_fields: FieldKind::DEFAULT.to_vec(),
        }
    }
}

/// Seam to the external HTTP layer. The engine itself never fetches; this
/// trait only exists so drivers (CLI, API callers) can hand a page to the
/// analysis pipeline.
pub trait Fetcher: Send + Sync {
    fn name(&self) -> &'static str;
    fn fetch_blocking(&self, _url: &str) -> Result<String> {
        Err(ItemsenseError::Other("fetcher not implemented".into()))
    }
}

/// The full pipeline over one HTML document: detect frameworks, generate
/// container candidates, rank them. Pure and infallible; degenerate input
/// degrades to empty results plus a note instead of an error.
pub fn analyze_document(html: &str) -> Analysis {
    if html.trim().is_empty() {
        return Analysis {
            framework: None,
            frameworks: Vec::new(),
            candidates: Vec::new(),
            notes: vec![AnalysisNote::EmptyDocument],
        };
    }

    let doc = Html::parse_document(html);
    let frameworks = detect::detect_all(&doc);
    let framework = frameworks
        .iter()
        .find(|r| r.confidence >= detect::FRAMEWORK_MATCH_THRESHOLD)
        .cloned();

    let generated = candidates::generate(&doc, &frameworks);
    let ranked = rank::rank(generated, &frameworks);

    let mut notes = Vec::new();
    if framework.is_none() {
        notes.push(AnalysisNote::NoFrameworkMatch);
    }
    if ranked.is_empty() {
        notes.push(AnalysisNote::NoCandidates);
    }

    Analysis {
        framework,
        frameworks,
        candidates: ranked,
        notes,
    }
}

/// Field detection for a chosen item pattern over the same document.
pub fn detect_fields(
    html: &str,
    item_selector: &StructuralSelector,
    requested: &[FieldKind],
) -> Vec<FieldSelection> {
    if html.trim().is_empty() {
        return Vec::new();
    }
    let doc = Html::parse_document(html);
    fields::detect_fields(&doc, item_selector, requested)
}

/// Apply a stored selector set to a document. `limit = None` is the
/// production path; previews pass the configured limit. Behaviour is
/// identical either way apart from the cutoff.
pub fn run_job(html: &str, job: &JobSpec, limit: Option<usize>) -> Result<Vec<ExtractedRecord>> {
    let item = job.item()?;
    let field_selectors = job.field_selectors();
    if html.trim().is_empty() {
        return Ok(Vec::new());
    }
    let doc = Html::parse_document(html);
    Ok(extract::extract(&doc, &item, &field_selectors, limit))
}

/// Driver tying a fetcher to the pipeline, mirroring how the production
/// runtime connector calls in.
pub struct Engine<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub opts: EngineOptions,
}

impl<'a> Engine<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, opts: EngineOptions) -> Self {
        Self { fetcher, opts }
    }

    pub fn analyze_url(&self, url: &str) -> Result<Analysis> {
        Url::parse(url).map_err(|_| ItemsenseError::InvalidUrl(url.into()))?;
        let html = self.fetcher.fetch_blocking(url)?;
        Ok(analyze_document(&html))
    }

    pub fn fields_for_url(
        &self,
        url: &str,
        item_selector: &StructuralSelector,
        requested: &[FieldKind],
    ) -> Result<Vec<FieldSelection>> {
        let html = self.fetcher.fetch_blocking(url)?;
        Ok(detect_fields(&html, item_selector, requested))
    }

    /// Preview a job against a live page, resolving link-like values against
    /// the page URL so the operator sees usable absolute URLs.
    pub fn preview_url(&self, url: &str, job: &JobSpec) -> Result<Vec<ExtractedRecord>> {
        let base = Url::parse(url).map_err(|_| ItemsenseError::InvalidUrl(url.into()))?;
        let html = self.fetcher.fetch_blocking(url)?;
        let mut records = run_job(&html, job, Some(self.opts.preview_limit))?;

        // Resolve href/src values so the operator sees usable absolute URLs.
        let link_fields: Vec<String> = job
            .field_selectors()
            .into_iter()
            .filter(|(_, sel)| {
                matches!(
                    sel.mode(),
                    ExtractionMode::Attribute(a) if a == "href" || a == "src"
                )
            })
            .map(|(name, _)| name)
            .collect();
        for record in &mut records {
            for name in &link_fields {
                let resolved = record
                    .values
                    .get(name)
                    .and_then(|v| v.as_deref())
                    .map(|v| extract::absolutize(&base, v));
                if let Some(r) = resolved {
                    record.values.insert(name.clone(), Some(r));
                }
            }
        }
        Ok(records)
    }
}
