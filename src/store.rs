use crate::error::{ItemsenseError, Result};
use crate::types::JobSpec;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

pub trait JobStore {
    fn get(&self, name: &str) -> Result<Option<JobSpec>>;
    fn set(&self, job: &JobSpec) -> Result<()>;
    fn list(&self) -> Result<Vec<JobSpec>>;
    fn delete(&self, name: &str) -> Result<()>;
    fn delete_all(&self) -> Result<()>;
}

pub struct LocalFsStore {
    root: PathBuf,
}

impl LocalFsStore {
    pub fn new() -> Result<Self> {
        let proj = ProjectDirs::from("io", "itemsense", "itemsense")
            .ok_or_else(|| ItemsenseError::Store("could not resolve data dir".into()))?;
        let root = proj.data_local_dir().join("jobs");
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn at(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize(name)))
    }
}

/// Job names become file stems; anything that is not a portable filename
/// character is mapped to `-`.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/* ---------- On-disk document shape ----------
{
  "<job name>": {
    "config": { "item_selector": "...", "fields": { "title": "...", ... } }
  }
}
---------------------------------------------- */

#[derive(Serialize, Deserialize)]
struct JobConfigDoc {
    item_selector: String,
    fields: BTreeMap<String, String>,
}
#[derive(Serialize, Deserialize)]
struct JobDoc {
    config: JobConfigDoc,
}

impl JobStore for LocalFsStore {
    fn get(&self, name: &str) -> Result<Option<JobSpec>> {
        let p = self.path_for(name);
        if !p.exists() {
            return Ok(None);
        }
        let file = fs::File::open(&p)?;
        let map: BTreeMap<String, JobDoc> = serde_json::from_reader(file)?;
        if let Some((key, doc)) = map.into_iter().next() {
            Ok(Some(JobSpec {
                name: key,
                item_selector: doc.config.item_selector,
                fields: doc.config.fields,
            }))
        } else {
            Ok(None)
        }
    }

    fn set(&self, job: &JobSpec) -> Result<()> {
        let p = self.path_for(&job.name);
        let mut map = BTreeMap::<String, JobDoc>::new();
        map.insert(
            job.name.clone(),
            JobDoc {
                config: JobConfigDoc {
                    item_selector: job.item_selector.clone(),
                    fields: job.fields.clone(),
                },
            },
        );
        let file = fs::File::create(&p)?;
        serde_json::to_writer_pretty(file, &map)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<JobSpec>> {
        let mut out = Vec::new();
        if !self.root.exists() {
            return Ok(out);
        }
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let file = match fs::File::open(&path) {
                Ok(f) => f,
                Err(_) => continue,
            };
            let map: BTreeMap<String, JobDoc> = match serde_json::from_reader(file) {
                Ok(m) => m,
                Err(_) => continue, // skip corrupt files
            };
            if let Some((key, doc)) = map.into_iter().next() {
                out.push(JobSpec {
                    name: key,
                    item_selector: doc.config.item_selector,
                    fields: doc.config.fields,
                });
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let p = self.path_for(name);
        if p.exists() {
            fs::remove_file(p)?;
        }
        Ok(())
    }

    fn delete_all(&self) -> Result<()> {
        if !self.root.exists() {
            return Ok(());
        }
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                let _ = fs::remove_file(path);
            }
        }
        Ok(())
    }
}
