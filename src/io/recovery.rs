use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

/// Default number of days before entries are prunable.
pub const PRUNE_AGE_DAYS: i64 = 30;

/// Category of a recovery entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryCategory {
    /// A collection could not be written; the body holds the unsaved JSON
    Write,
    /// A collection file could not be parsed and was moved aside
    Corrupt,
    /// Entities removed by a delete; the body holds their JSON
    Delete,
}

impl std::fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveryCategory::Write => write!(f, "write"),
            RecoveryCategory::Corrupt => write!(f, "corrupt"),
            RecoveryCategory::Delete => write!(f, "delete"),
        }
    }
}

/// A single line of the recovery log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    /// Storage key the entry relates to (`chronotask_tasks`, ...)
    pub key: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
}

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, key: &str, description: impl Into<String>, body: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            key: key.to_string(),
            description: description.into(),
            body: body.into(),
        }
    }
}

/// Return the path to the recovery log file.
pub fn recovery_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".recovery.log")
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Append an entry to the log. Failures are reported as warnings only.
pub fn log_recovery(data_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(data_dir, &entry) {
        tracing::warn!(error = %e, "could not write to recovery log");
    } else {
        tracing::info!(category = %entry.category, key = %entry.key, "recovery log entry written");
    }
}

fn append_entry(data_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let line = serde_json::to_string(entry).map_err(io::Error::other)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(recovery_log_path(data_dir))?;
    writeln!(file, "{}", line)
}

/// Read entries, most recent first. Unparseable lines are skipped.
pub fn read_recovery_entries(data_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(content) = std::fs::read_to_string(recovery_log_path(data_dir)) else {
        return Vec::new();
    };
    let mut entries: Vec<RecoveryEntry> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect();
    entries.reverse();
    if let Some(n) = limit {
        entries.truncate(n);
    }
    entries
}

/// Drop entries older than `before` (default: [`PRUNE_AGE_DAYS`] ago), or
/// every entry with `all`. Returns the number removed.
pub fn prune_recovery(data_dir: &Path, before: Option<DateTime<Utc>>, all: bool) -> io::Result<usize> {
    let path = recovery_log_path(data_dir);
    if !path.exists() {
        return Ok(0);
    }
    let mut entries = read_recovery_entries(data_dir, None);
    let original = entries.len();
    if all {
        entries.clear();
    } else {
        let cutoff = before.unwrap_or_else(|| Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS));
        entries.retain(|e| e.timestamp >= cutoff);
    }
    entries.reverse();

    let mut out = String::new();
    for entry in &entries {
        out.push_str(&serde_json::to_string(entry).map_err(io::Error::other)?);
        out.push('\n');
    }
    atomic_write(&path, out.as_bytes())?;
    Ok(original - entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn log_and_read_most_recent_first() {
        let tmp = TempDir::new().unwrap();
        for i in 0..3 {
            log_recovery(
                tmp.path(),
                RecoveryEntry::new(RecoveryCategory::Write, "chronotask_tasks", format!("entry {}", i), "[]"),
            );
        }
        let entries = read_recovery_entries(tmp.path(), Some(2));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description, "entry 2");
        assert_eq!(entries[1].description, "entry 1");
        assert_eq!(entries[0].body, "[]");
    }

    #[test]
    fn missing_log_reads_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(read_recovery_entries(tmp.path(), None).is_empty());
        assert_eq!(prune_recovery(tmp.path(), None, true).unwrap(), 0);
    }

    #[test]
    fn garbage_lines_skipped() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), RecoveryEntry::new(RecoveryCategory::Delete, "k", "gone", ""));
        let path = recovery_log_path(tmp.path());
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("not json\n");
        std::fs::write(&path, content).unwrap();
        assert_eq!(read_recovery_entries(tmp.path(), None).len(), 1);
    }

    #[test]
    fn prune_by_age_and_all() {
        let tmp = TempDir::new().unwrap();
        let mut old = RecoveryEntry::new(RecoveryCategory::Corrupt, "k", "old", "");
        old.timestamp = Utc::now() - chrono::Duration::days(60);
        log_recovery(tmp.path(), old);
        log_recovery(tmp.path(), RecoveryEntry::new(RecoveryCategory::Write, "k", "new", ""));

        assert_eq!(prune_recovery(tmp.path(), None, false).unwrap(), 1);
        let left = read_recovery_entries(tmp.path(), None);
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].description, "new");

        assert_eq!(prune_recovery(tmp.path(), None, true).unwrap(), 1);
        assert!(read_recovery_entries(tmp.path(), None).is_empty());
    }

    #[test]
    fn atomic_write_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.json");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn entry_serde_shape() {
        let mut entry = RecoveryEntry::new(RecoveryCategory::Write, "chronotask_ideas", "save failed", "");
        entry.timestamp = DateTime::parse_from_rfc3339("2025-03-10T12:00:00Z").unwrap().with_timezone(&Utc);
        insta::assert_snapshot!(
            serde_json::to_string(&entry).unwrap(),
            @r#"{"timestamp":"2025-03-10T12:00:00Z","category":"write","key":"chronotask_ideas","description":"save failed"}"#
        );
    }
}
