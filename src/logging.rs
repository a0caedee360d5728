use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

const MAX_ENTRIES: usize = 500;

/// One command outcome in the JSONL change log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeLogEntry {
    pub timestamp: String,
    pub command: String,
    pub path: String,
    pub action: String,
    pub detail: String,
}

impl ChangeLogEntry {
    pub fn now(command: &str, path: &Path, action: &str, detail: &str) -> Self {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".into());
        Self {
            timestamp,
            command: command.to_string(),
            path: path.display().to_string(),
            action: action.to_string(),
            detail: detail.to_string(),
        }
    }
}

/// Append `entry` to the log at `log_path`, keeping the newest entries only.
pub fn record_change(log_path: &Path, entry: &ChangeLogEntry) -> io::Result<()> {
    if let Some(dir) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string(entry)?;
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(log_path)?;
    writeln!(file, "{json}")?;
    truncate_log(log_path)
}

pub fn read_entries(log_path: &Path) -> io::Result<Vec<ChangeLogEntry>> {
    let file = OpenOptions::new().read(true).open(log_path)?;
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

fn truncate_log(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().read(true).open(path)?;
    let reader = BufReader::new(file);
    let lines: Vec<_> = reader.lines().collect::<Result<_, _>>()?;
    if lines.len() <= MAX_ENTRIES {
        return Ok(());
    }
    let keep = &lines[lines.len() - MAX_ENTRIES..];
    fs::write(path, keep.join("\n") + "\n")
}
