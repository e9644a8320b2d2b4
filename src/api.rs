use crate::engine::{self, Engine, EngineOptions, Fetcher};
use crate::error::{ItemsenseError, Result};
use crate::impls::ReqwestFetcher;
use crate::selector::StructuralSelector;
use crate::store::JobStore;
use crate::types::{Analysis, ExtractedRecord, FieldKind, FieldSelection, JobSpec};
use std::time::Instant;

// Helper functions for logging - ignore errors to not break main operations
fn log_info(job: Option<&str>, event: &str, details: Option<&str>) {
    if let Ok(logger) = crate::log::ActivityLogger::new() {
        let _ = logger.info(job, event, details);
    }
}

fn log_error(job: Option<&str>, event: &str, details: Option<&str>) {
    if let Ok(logger) = crate::log::ActivityLogger::new() {
        let _ = logger.error(job, event, details);
    }
}

fn log_timed<T>(job: Option<&str>, event: &str, started: Instant, result: &Result<T>) {
    let details = format!(
        "{} in {}ms",
        if result.is_ok() { "succeeded" } else { "failed" },
        started.elapsed().as_millis()
    );
    match result {
        Ok(_) => log_info(job, event, Some(&details)),
        Err(_) => log_error(job, event, Some(&details)),
    }
}

/* ------------ public facade components ------------ */

pub struct Components {
    pub fetcher: Box<dyn Fetcher>,
    pub opts: EngineOptions,
}
impl Default for Components {
    fn default() -> Self {
        let fetcher = ReqwestFetcher::new().expect("failed to init reqwest client");
        Self {
            fetcher: Box::new(fetcher),
            opts: EngineOptions::default(),
        }
    }
}

pub fn make_engine(components: &Components) -> Engine<'_> {
    Engine::new(&*components.fetcher, components.opts.clone())
}

/* ------------ analysis entrypoints ------------ */

/// Analyze HTML already in hand. Degenerate input comes back as an empty
/// result set with a note, never an error.
pub fn analyze_html(html: &str) -> Result<Analysis> {
    let start = Instant::now();
    let result = Ok(engine::analyze_document(html));
    log_timed(None, "analyze_html", start, &result);
    result
}

pub fn analyze_url(url: &str, components: &Components) -> Result<Analysis> {
    let start = Instant::now();
    let result = make_engine(components).analyze_url(url);
    log_timed(None, "analyze_url", start, &result);
    result
}

pub fn detect_fields_html(
    html: &str,
    item_selector: &str,
    requested: &[FieldKind],
) -> Result<Vec<FieldSelection>> {
    let start = Instant::now();
    let result = StructuralSelector::parse(item_selector)
        .map(|item| engine::detect_fields(html, &item, requested));
    log_timed(None, "detect_fields_html", start, &result);
    result
}

pub fn detect_fields_url(
    url: &str,
    item_selector: &str,
    requested: &[FieldKind],
    components: &Components,
) -> Result<Vec<FieldSelection>> {
    let start = Instant::now();
    let item = StructuralSelector::parse(item_selector)?;
    let result = make_engine(components).fields_for_url(url, &item, requested);
    log_timed(None, "detect_fields_url", start, &result);
    result
}

/* ------------ preview + extraction entrypoints ------------ */

pub fn preview_html(html: &str, job: &JobSpec, limit: Option<usize>) -> Result<Vec<ExtractedRecord>> {
    let start = Instant::now();
    let result = engine::run_job(html, job, limit);
    log_timed(Some(&job.name), "preview_html", start, &result);
    result
}

pub fn preview_url(
    url: &str,
    job: &JobSpec,
    components: &Components,
) -> Result<Vec<ExtractedRecord>> {
    let start = Instant::now();
    let result = make_engine(components).preview_url(url, job);
    log_timed(Some(&job.name), "preview_url", start, &result);
    result
}

/// Production extraction: same executor as preview, unbounded.
pub fn run_job(html: &str, job: &JobSpec) -> Result<Vec<ExtractedRecord>> {
    let start = Instant::now();
    let result = engine::run_job(html, job, None);
    log_timed(Some(&job.name), "run_job", start, &result);
    result
}

/* ------------ job helpers ------------ */

/// Validate and save a selector set. Refuses to overwrite an existing job.
pub fn job_save<S: JobStore>(store: &S, job: JobSpec) -> Result<JobSpec> {
    let start = Instant::now();
    let result = (|| {
        if store.get(&job.name)?.is_some() {
            return Err(ItemsenseError::Other(format!(
                "job already exists: {}",
                job.name
            )));
        }
        job.item()?; // reject unusable item selectors before persisting
        store.set(&job)?;
        Ok(job)
    })();
    log_timed(result.as_ref().ok().map(|j| j.name.as_str()), "job_save", start, &result);
    result
}

pub fn job_read<S: JobStore>(store: &S, name: &str) -> Result<Option<JobSpec>> {
    store.get(name)
}

pub fn job_list<S: JobStore>(store: &S) -> Result<Vec<String>> {
    Ok(store.list()?.into_iter().map(|j| j.name).collect())
}

pub fn job_delete<S: JobStore>(store: &S, target: &str) -> Result<()> {
    let start = Instant::now();
    let result = if target == "all" {
        store.delete_all()
    } else {
        store.delete(target)
    };
    log_timed(Some(target), "job_delete", start, &result);
    result
}
