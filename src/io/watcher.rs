use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Collection keys whose files changed on disk since the last poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub keys: Vec<String>,
}

/// Watches a data directory for collection files written by other processes.
pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<StoreChange>,
}

/// Storage key for a path inside the data directory, if it is a collection
/// file (`<key>.json`). Temp files, backups, the lock and the log are ignored.
pub fn key_for_path(data_dir: &Path, path: &Path) -> Option<String> {
    if path.parent()? != data_dir {
        return None;
    }
    if path.extension()?.to_str()? != "json" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.starts_with('.') {
        return None;
    }
    Some(stem.to_string())
}

impl StoreWatcher {
    pub fn start(data_dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let dir: PathBuf = data_dir.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                let mut keys: Vec<String> = event.paths.iter().filter_map(|p| key_for_path(&dir, p)).collect();
                keys.dedup();
                if !keys.is_empty() {
                    let _ = tx.send(StoreChange { keys });
                }
            },
            Config::default(),
        )?;

        watcher.watch(data_dir, RecursiveMode::NonRecursive)?;
        tracing::debug!(dir = %data_dir.display(), "watching data directory");
        Ok(StoreWatcher { _watcher: watcher, rx })
    }

    /// Drain pending changes without blocking, merged into one key list
    pub fn poll(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        while let Ok(change) = self.rx.try_recv() {
            for key in change.keys {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Block until at least one change arrives or `timeout` elapses
    pub fn wait(&self, timeout: Duration) -> Vec<String> {
        match self.rx.recv_timeout(timeout) {
            Ok(first) => {
                let mut keys = first.keys;
                for key in self.poll() {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
                keys
            }
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_files_map_to_keys() {
        let dir = Path::new("/w/.chronotask");
        assert_eq!(
            key_for_path(dir, &dir.join("chronotask_ideas.json")),
            Some("chronotask_ideas".to_string())
        );
        assert_eq!(key_for_path(dir, &dir.join("chronotask_ideas.json.bak")), None);
        assert_eq!(key_for_path(dir, &dir.join(".tmpXYZ.json")), None);
        assert_eq!(key_for_path(dir, &dir.join("config.toml")), None);
        assert_eq!(key_for_path(dir, Path::new("/elsewhere/chronotask_ideas.json")), None);
    }
}
