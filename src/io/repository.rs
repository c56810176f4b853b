//! Typed collections on top of a [`KeyValueStore`], with change listeners.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::io::store::{KeyValueStore, StoreError};

pub const TASKS_KEY: &str = "chronotask_tasks";
pub const IDEAS_KEY: &str = "chronotask_ideas";
pub const TASK_TYPES_KEY: &str = "chronotask_task_types";

/// Sent to subscribers after a collection is saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub key: String,
    pub len: usize,
}

type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// A listener registration. Dropping it detaches the listener.
#[must_use = "the listener is removed when the subscription is dropped"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            let mut guard = listeners.lock().unwrap_or_else(|p| p.into_inner());
            guard.entries.retain(|(id, _)| *id != self.id);
        }
    }
}

/// One JSON array of `T` stored under a single key
pub struct Repository<'s, T> {
    store: &'s dyn KeyValueStore,
    key: &'static str,
    listeners: Arc<Mutex<Listeners>>,
    _marker: PhantomData<fn() -> T>,
}

impl<'s, T: Serialize + DeserializeOwned> Repository<'s, T> {
    pub fn new(store: &'s dyn KeyValueStore, key: &'static str) -> Self {
        Repository {
            store,
            key,
            listeners: Arc::new(Mutex::new(Listeners::default())),
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Whether anything has ever been saved under this key
    pub fn exists(&self) -> Result<bool, StoreError> {
        Ok(self.store.get(self.key)?.is_some())
    }

    /// Load the collection. A missing key is an empty collection. Content
    /// that does not parse is backed up, logged and treated as empty.
    pub fn load(&self) -> Result<Vec<T>, StoreError> {
        let Some(raw) = self.store.get(self.key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(items) => {
                tracing::debug!(key = self.key, count = items.len(), "loaded collection");
                Ok(items)
            }
            Err(e) => {
                tracing::warn!(key = self.key, error = %e, "unreadable collection, starting empty");
                if let Err(backup_err) = self.store.backup(self.key, &raw) {
                    tracing::warn!(key = self.key, error = %backup_err, "could not back up collection");
                }
                if let Some(dir) = self.store.recovery_dir() {
                    log_recovery(
                        dir,
                        RecoveryEntry::new(RecoveryCategory::Corrupt, self.key, e.to_string(), raw),
                    );
                }
                Ok(Vec::new())
            }
        }
    }

    /// Persist the whole collection and notify subscribers. On a failed
    /// write the unsaved JSON goes to the recovery log before the error is
    /// returned.
    pub fn save(&self, items: &[T]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(items).map_err(|source| StoreError::Serialize {
            key: self.key.to_string(),
            source,
        })?;
        if let Err(e) = self.store.set(self.key, &json) {
            if let Some(dir) = self.store.recovery_dir() {
                log_recovery(
                    dir,
                    RecoveryEntry::new(RecoveryCategory::Write, self.key, e.to_string(), json),
                );
            }
            return Err(e);
        }
        self.notify(&ChangeEvent {
            key: self.key.to_string(),
            len: items.len(),
        });
        Ok(())
    }

    pub fn subscribe(&self, listener: impl Fn(&ChangeEvent) + Send + Sync + 'static) -> Subscription {
        let mut guard = self.listeners.lock().unwrap_or_else(|p| p.into_inner());
        guard.next_id += 1;
        let id = guard.next_id;
        guard.entries.push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .entries
            .len()
    }

    /// Listeners run without the registry locked, so they may drop
    /// subscriptions, their own included.
    fn notify(&self, event: &ChangeEvent) {
        let snapshot: Vec<Listener> = {
            let guard = self.listeners.lock().unwrap_or_else(|p| p.into_inner());
            guard.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in snapshot {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::recovery::read_recovery_entries;
    use crate::io::store::{FileStore, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[test]
    fn missing_key_loads_empty() {
        let store = MemoryStore::new();
        let repo: Repository<String> = Repository::new(&store, IDEAS_KEY);
        assert!(repo.load().unwrap().is_empty());
        assert!(!repo.exists().unwrap());
    }

    #[test]
    fn save_then_load() {
        let store = MemoryStore::new();
        let repo: Repository<String> = Repository::new(&store, IDEAS_KEY);
        repo.save(&["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(repo.load().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn corrupt_json_is_backed_up() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        store.set(TASKS_KEY, "{not json").unwrap();
        let repo: Repository<String> = Repository::new(&store, TASKS_KEY);

        assert!(repo.load().unwrap().is_empty());
        let backup = tmp.path().join("chronotask_tasks.json.bak");
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "{not json");
        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries[0].category, RecoveryCategory::Corrupt);
        assert_eq!(entries[0].body, "{not json");
    }

    #[test]
    fn failed_write_lands_in_recovery_log() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        // A directory where the collection file should be makes the rename fail
        std::fs::create_dir(store.path_for(IDEAS_KEY)).unwrap();
        let repo: Repository<String> = Repository::new(&store, IDEAS_KEY);

        assert!(matches!(
            repo.save(&["keep me".to_string()]),
            Err(StoreError::Write { .. })
        ));
        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, RecoveryCategory::Write);
        assert!(entries[0].body.contains("keep me"));
    }

    #[test]
    fn subscribers_notified_until_dropped() {
        let store = MemoryStore::new();
        let repo: Repository<String> = Repository::new(&store, IDEAS_KEY);
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&seen);
        let sub = repo.subscribe(move |event| {
            assert_eq!(event.key, IDEAS_KEY);
            counter.fetch_add(event.len, Ordering::SeqCst);
        });
        repo.save(&["x".to_string(), "y".to_string()]).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        sub.unsubscribe();
        assert_eq!(repo.subscriber_count(), 0);
        repo.save(&["z".to_string()]).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn listener_can_drop_its_own_subscription() {
        let store = MemoryStore::new();
        let repo: Repository<String> = Repository::new(&store, TASKS_KEY);
        let hits = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let (counter, own) = (Arc::clone(&hits), Arc::clone(&slot));
        let sub = repo.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            let taken = own.lock().unwrap().take();
            drop(taken);
        });
        *slot.lock().unwrap() = Some(sub);
        let other = repo.subscribe(|_| {});

        repo.save(&["once".to_string()]).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(repo.subscriber_count(), 1);

        repo.save(&["twice".to_string()]).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        drop(other);
        assert_eq!(repo.subscriber_count(), 0);
    }

    #[test]
    fn subscription_outliving_repository_is_harmless() {
        let store = MemoryStore::new();
        let sub = {
            let repo: Repository<String> = Repository::new(&store, TASK_TYPES_KEY);
            repo.subscribe(|_| {})
        };
        drop(sub);
    }
}
