use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;

use crate::api::{self, Components};
use crate::error::ItemsenseError;
use crate::store::LocalFsStore;
use crate::types::{ApiResponse, FieldKind, JobSpec};

#[derive(Parser)]
#[command(name = "itemsense", version, about = "Item-pattern inference + extraction (JSON only)")]
pub struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank repeating-item selector candidates for a page
    Analyze(AnalyzeArgs),
    /// Detect per-field selectors for a chosen item pattern
    Fields(FieldsArgs),
    /// Extract sample records with a saved or ad-hoc selector set
    Preview(PreviewArgs),
    #[command(subcommand)]
    Job(JobCmd),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// URL to fetch and analyze, or a local file path with --file
    target: String,
    /// Treat the target as a local HTML file instead of a URL
    #[arg(long)]
    file: bool,
}

#[derive(Args)]
struct FieldsArgs {
    target: String,
    #[arg(long)]
    file: bool,
    /// The chosen item selector
    #[arg(long)]
    item: String,
    /// Comma-separated field names (defaults to title,url,date,author)
    #[arg(long)]
    fields: Option<String>,
}

#[derive(Args)]
struct PreviewArgs {
    target: String,
    #[arg(long)]
    file: bool,
    /// Use a saved job by name
    #[arg(long)]
    job: Option<String>,
    /// Ad-hoc item selector (alternative to --job)
    #[arg(long)]
    item: Option<String>,
    /// Ad-hoc field selector as name=selector, repeatable
    #[arg(long = "field", value_name = "NAME=SELECTOR")]
    field: Vec<String>,
    /// Records to show
    #[arg(long, default_value_t = 5)]
    limit: usize,
}

#[derive(Subcommand)]
enum JobCmd {
    /// Save a selector set under a name
    Save(JobSaveArgs),
    Read(ReadArgs),
    Delete(DeleteArgs),
}

#[derive(Args)]
struct JobSaveArgs {
    name: String,
    #[arg(long)]
    item: String,
    #[arg(long = "field", value_name = "NAME=SELECTOR")]
    field: Vec<String>,
}

#[derive(Args)]
struct ReadArgs {
    target: String, /* <name> | all */
}

#[derive(Args)]
struct DeleteArgs {
    target: String, // <name> | all
    #[arg(long = "yes")]
    yes: bool,
}

pub fn run() -> crate::Result<()> {
    let cli = Cli::parse();
    let components = Components::default();

    match cli.cmd {
        Command::Analyze(args) => match load_html(&args.target, args.file, &components) {
            Ok(html) => finish(api::analyze_html(&html)),
            Err(e) => print_json(ApiResponse::<()>::err(e.to_string())),
        },
        Command::Fields(args) => {
            let fields = match parse_field_names(args.fields.as_deref()) {
                Ok(f) => f,
                Err(e) => {
                    print_json(ApiResponse::<()>::err(e.to_string()));
                    return Ok(());
                }
            };
            match load_html(&args.target, args.file, &components) {
                Ok(html) => finish(api::detect_fields_html(&html, &args.item, &fields)),
                Err(e) => print_json(ApiResponse::<()>::err(e.to_string())),
            }
        }
        Command::Preview(args) => preview_cmd(args, &components)?,
        Command::Job(jc) => job_cmd(jc)?,
    }
    Ok(())
}

fn preview_cmd(args: PreviewArgs, components: &Components) -> crate::Result<()> {
    let store = LocalFsStore::new()?;

    let job = match (&args.job, &args.item) {
        (Some(name), _) => match api::job_read(&store, name)? {
            Some(job) => job,
            None => {
                print_json(ApiResponse::<()>::err(format!("no job named {name}")));
                return Ok(());
            }
        },
        (None, Some(item)) => match ad_hoc_job(item, &args.field) {
            Ok(job) => job,
            Err(e) => {
                print_json(ApiResponse::<()>::err(e.to_string()));
                return Ok(());
            }
        },
        (None, None) => {
            print_json(ApiResponse::<()>::err(
                "pass --job <name> or --item <selector>",
            ));
            return Ok(());
        }
    };

    if args.file {
        match load_html(&args.target, true, components) {
            Ok(html) => finish(api::preview_html(&html, &job, Some(args.limit))),
            Err(e) => print_json(ApiResponse::<()>::err(e.to_string())),
        }
    } else {
        finish(api::preview_url(&args.target, &job, components));
    }
    Ok(())
}

fn job_cmd(jc: JobCmd) -> crate::Result<()> {
    let store = LocalFsStore::new()?;
    match jc {
        JobCmd::Save(args) => match ad_hoc_job(&args.item, &args.field) {
            Ok(mut job) => {
                job.name = args.name;
                finish(api::job_save(&store, job));
            }
            Err(e) => print_json(ApiResponse::<()>::err(e.to_string())),
        },
        JobCmd::Read(ReadArgs { target }) => {
            if target == "all" {
                finish(api::job_list(&store));
            } else {
                finish(api::job_read(&store, &target));
            }
        }
        JobCmd::Delete(DeleteArgs { target, yes }) => {
            if !yes {
                print_json(ApiResponse::<()>::err("refusing to delete without --yes"));
                return Ok(());
            }
            finish(
                api::job_delete(&store, &target).map(|_| serde_json::json!({"deleted": target})),
            );
        }
    }
    Ok(())
}

/* -------- helpers -------- */

fn load_html(target: &str, file: bool, components: &Components) -> crate::Result<String> {
    if file {
        Ok(std::fs::read_to_string(target)?)
    } else {
        components.fetcher.fetch_blocking(target)
    }
}

fn parse_field_names(names: Option<&str>) -> crate::Result<Vec<FieldKind>> {
    match names {
        None => Ok(FieldKind::DEFAULT.to_vec()),
        Some(s) => s.split(',').map(|f| f.trim().parse()).collect(),
    }
}

/// Parse repeated `name=selector` flags into a job spec.
fn ad_hoc_job(item: &str, fields: &[String]) -> crate::Result<JobSpec> {
    let mut map = BTreeMap::new();
    for pair in fields {
        let (name, sel) = pair.split_once('=').ok_or_else(|| {
            ItemsenseError::Other(format!("expected name=selector, got {pair}"))
        })?;
        map.insert(name.trim().to_string(), sel.trim().to_string());
    }
    Ok(JobSpec {
        name: "ad-hoc".to_string(),
        item_selector: item.to_string(),
        fields: map,
    })
}

fn finish<T: serde::Serialize>(res: crate::Result<T>) {
    match res {
        Ok(v) => print_json(ApiResponse::ok(v)),
        Err(e) => print_json(ApiResponse::<()>::err(e.to_string())),
    }
}
fn print_json<T: serde::Serialize>(val: T) {
    // pretty JSON output
    println!("{}", serde_json::to_string_pretty(&val).unwrap());
}
