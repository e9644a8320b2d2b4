use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub job: Option<String>,
    pub event: String,
    pub details: Option<String>,
}

pub struct ActivityLogger {
    log_path: PathBuf,
}

impl ActivityLogger {
    pub fn new() -> crate::error::Result<Self> {
        let user_dirs = directories::UserDirs::new().ok_or_else(|| {
            crate::error::ItemsenseError::Store("could not determine home directory".into())
        })?;
        let home = user_dirs.home_dir();
        let dir = home.join(".itemsense");
        fs::create_dir_all(&dir)?;

        Ok(Self {
            log_path: dir.join("activity.log"),
        })
    }

    pub fn log(
        &self,
        level: LogLevel,
        job: Option<&str>,
        event: &str,
        details: Option<&str>,
    ) -> crate::error::Result<()> {
        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            job: job.map(|j| j.to_string()),
            event: event.to_string(),
            details: details.map(|d| d.to_string()),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        let level_str = match entry.level {
            LogLevel::Info => "🟢",
            LogLevel::Error => "🔴",
        };

        let job_str = entry.job.as_deref().unwrap_or("*");
        let details_str = entry.details.as_deref().unwrap_or("");

        writeln!(
            file,
            "{} {} {} {} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            level_str,
            entry.event,
            job_str,
            details_str
        )?;

        Ok(())
    }

    pub fn info(
        &self,
        job: Option<&str>,
        event: &str,
        details: Option<&str>,
    ) -> crate::error::Result<()> {
        self.log(LogLevel::Info, job, event, details)
    }

    pub fn error(
        &self,
        job: Option<&str>,
        event: &str,
        details: Option<&str>,
    ) -> crate::error::Result<()> {
        self.log(LogLevel::Error, job, event, details)
    }
}
