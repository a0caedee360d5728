use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::macros::format_description;

/// Local wall-clock time, falling back to UTC when the offset is unknown.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// `<original>.<YYYY-MM-DD_HH-mm-ss>.backup`
pub fn backup_path(original: &Path, at: OffsetDateTime) -> PathBuf {
    let stamp = at
        .format(format_description!(
            "[year]-[month]-[day]_[hour]-[minute]-[second]"
        ))
        .unwrap_or_else(|_| at.unix_timestamp().to_string());
    let mut name = original.as_os_str().to_os_string();
    name.push(format!(".{stamp}.backup"));
    PathBuf::from(name)
}

/// First backup path for `original` at `at` that does not exist yet; a
/// second backup within the same second gets a numeric suffix.
pub fn free_backup_path(original: &Path, at: OffsetDateTime) -> PathBuf {
    let base = backup_path(original, at);
    if !base.exists() {
        return base;
    }
    let mut attempt = 1usize;
    loop {
        let mut name = base.as_os_str().to_os_string();
        name.push(format!(".{attempt}"));
        let candidate = PathBuf::from(name);
        if !candidate.exists() {
            return candidate;
        }
        attempt += 1;
    }
}
