//! Shared list store.
//!
//! One [`ListStore`] owns both lists and the activity records. Mutations
//! take the store mutex for the whole read-modify-persist cycle; readers
//! take an [`Arc`] snapshot of the lists and never block a mutation for
//! longer than the clone of a pointer.
//!
//! Persistence failures never undo a mutation: the in-memory state stays
//! authoritative, the failure is logged, and the affected file is written
//! again on the next mutation or [`ListStore::flush`].

use chrono::{DateTime, Utc};
use jcb_common::ListKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use super::activity::{ActivityRecord, ActivityStore};
use super::entry::{EntryFlags, PatternEntry};
use super::file::{is_representable, PatternList};
use super::ListError;

/// Files backing a [`ListStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub allow: PathBuf,
    pub block: PathBuf,
    pub activity: PathBuf,
}

impl StorePaths {
    pub fn from_config(config: &jcb_config::ScreenerConfig) -> Self {
        Self {
            allow: config.allow_list_path(),
            block: config.block_list_path(),
            activity: config.activity_path(),
        }
    }
}

/// Immutable view of both lists.
#[derive(Debug, Clone)]
pub struct PatternLists {
    pub allow: PatternList,
    pub block: PatternList,
}

impl PatternLists {
    pub fn new(allow: PatternList, block: PatternList) -> Self {
        Self { allow, block }
    }
}

/// A block entry taken out of the store, with its activity record.
#[derive(Debug, Clone)]
pub struct RemovedEntry {
    pub entry: PatternEntry,
    pub activity: Option<ActivityRecord>,
}

#[derive(Debug)]
struct StoreInner {
    lists: Arc<PatternLists>,
    activity: ActivityStore,
    block_dirty: bool,
    activity_dirty: bool,
}

/// The allow list, block list and activity records of one screener.
#[derive(Debug)]
pub struct ListStore {
    paths: StorePaths,
    inner: Mutex<StoreInner>,
}

impl ListStore {
    /// Load both lists and the activity records.
    pub fn open(paths: StorePaths) -> Result<Self, ListError> {
        Self::open_at(paths, Utc::now())
    }

    /// [`open`](Self::open) with an explicit clock, for tests.
    pub fn open_at(paths: StorePaths, now: DateTime<Utc>) -> Result<Self, ListError> {
        let lists = load_lists(&paths)?;
        let activity = match ActivityStore::load(&paths.activity) {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, "activity records unreadable, starting fresh");
                ActivityStore::default()
            }
        };

        let mut inner = StoreInner {
            lists: Arc::new(lists),
            activity,
            block_dirty: false,
            activity_dirty: false,
        };
        if reconcile(&inner.lists.block, &mut inner.activity, now) {
            inner.activity_dirty = true;
        }

        let store = Self {
            paths,
            inner: Mutex::new(inner),
        };
        {
            let mut inner = store.lock();
            info!(
                allow = inner.lists.allow.len(),
                block = inner.lists.block.len(),
                "pattern lists loaded"
            );
            let _ = store.persist(&mut inner);
        }
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current lists. The snapshot is unaffected by later mutations.
    pub fn snapshot(&self) -> Arc<PatternLists> {
        Arc::clone(&self.lock().lists)
    }

    /// Copy of the activity records.
    pub fn activity(&self) -> ActivityStore {
        self.lock().activity.clone()
    }

    /// Append a block entry and create its activity record.
    pub fn add_block(&self, pattern: &str, permanent: bool, comment: &str) -> Result<(), ListError> {
        self.add_block_at(pattern, permanent, comment, Utc::now())
    }

    pub fn add_block_at(
        &self,
        pattern: &str,
        permanent: bool,
        comment: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ListError> {
        if !is_representable(pattern) {
            return Err(ListError::Unrepresentable(pattern.to_string()));
        }
        let flags = if permanent {
            EntryFlags::permanent()
        } else {
            EntryFlags::default()
        };
        let entry = PatternEntry::new(ListKind::Block, pattern, flags, comment)?;

        let mut inner = self.lock();
        if inner.lists.block.contains(pattern) {
            return Err(ListError::Duplicate(pattern.to_string()));
        }
        Arc::make_mut(&mut inner.lists).block.push(entry);
        inner
            .activity
            .records
            .insert(pattern.to_string(), ActivityRecord::new(now));
        inner.block_dirty = true;
        inner.activity_dirty = true;
        info!(pattern, permanent, "block pattern added");

        let _ = self.persist(&mut inner);
        Ok(())
    }

    /// Record a match of a block pattern.
    pub fn touch(&self, pattern: &str) -> Result<(), ListError> {
        self.touch_at(pattern, Utc::now())
    }

    pub fn touch_at(&self, pattern: &str, now: DateTime<Utc>) -> Result<(), ListError> {
        let mut inner = self.lock();
        if !inner.lists.block.contains(pattern) {
            return Err(ListError::NotFound(pattern.to_string()));
        }
        inner
            .activity
            .records
            .entry(pattern.to_string())
            .or_insert_with(|| ActivityRecord::new(now))
            .fire(now);
        inner.activity_dirty = true;
        debug!(pattern, "block pattern fired");

        let _ = self.persist(&mut inner);
        Ok(())
    }

    /// Remove a block entry and its activity record.
    pub fn remove(&self, pattern: &str) -> Result<RemovedEntry, ListError> {
        let mut inner = self.lock();
        let entry = Arc::make_mut(&mut inner.lists)
            .block
            .remove(pattern)
            .ok_or_else(|| ListError::NotFound(pattern.to_string()))?;
        let activity = inner.activity.records.remove(pattern);
        inner.block_dirty = true;
        inner.activity_dirty = true;
        info!(pattern, "block pattern removed");

        let _ = self.persist(&mut inner);
        Ok(RemovedEntry { entry, activity })
    }

    /// Remove every block entry for which `select` returns true, persisting
    /// once. Selection and removal happen under one lock.
    pub fn remove_matching<F>(&self, mut select: F) -> Vec<RemovedEntry>
    where
        F: FnMut(&PatternEntry, Option<&ActivityRecord>) -> bool,
    {
        let mut inner = self.lock();
        let chosen: Vec<String> = inner
            .lists
            .block
            .entries()
            .iter()
            .filter(|e| select(e, inner.activity.get(e.pattern())))
            .map(|e| e.pattern().to_string())
            .collect();
        if chosen.is_empty() {
            return Vec::new();
        }

        let mut removed = Vec::with_capacity(chosen.len());
        for pattern in chosen {
            let Some(entry) = Arc::make_mut(&mut inner.lists).block.remove(&pattern) else {
                continue;
            };
            let activity = inner.activity.records.remove(&pattern);
            removed.push(RemovedEntry { entry, activity });
        }
        inner.block_dirty = true;
        inner.activity_dirty = true;
        info!(count = removed.len(), "block patterns removed");

        let _ = self.persist(&mut inner);
        removed
    }

    /// Re-read both list files, keeping activity for surviving patterns.
    pub fn reload(&self) -> Result<(), ListError> {
        self.reload_at(Utc::now())
    }

    pub fn reload_at(&self, now: DateTime<Utc>) -> Result<(), ListError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.block_dirty {
            warn!("reloading over unsaved block list changes");
        }
        let lists = load_lists(&self.paths)?;
        inner.lists = Arc::new(lists);
        inner.block_dirty = false;
        if reconcile(&inner.lists.block, &mut inner.activity, now) {
            inner.activity_dirty = true;
        }
        info!(
            allow = inner.lists.allow.len(),
            block = inner.lists.block.len(),
            "pattern lists reloaded"
        );
        let _ = self.persist(inner);
        Ok(())
    }

    /// Write anything still unsaved.
    pub fn flush(&self) -> Result<(), ListError> {
        let mut inner = self.lock();
        self.persist(&mut inner)
    }

    /// Whether some mutation has not reached disk yet.
    pub fn is_dirty(&self) -> bool {
        let inner = self.lock();
        inner.block_dirty || inner.activity_dirty
    }

    fn persist(&self, inner: &mut StoreInner) -> Result<(), ListError> {
        let mut first_err = None;

        if inner.block_dirty {
            match inner.lists.block.save(&self.paths.block) {
                Ok(()) => inner.block_dirty = false,
                Err(e) => {
                    error!(error = %e, "failed to persist block list, will retry");
                    first_err.get_or_insert(e);
                }
            }
        }

        if inner.activity_dirty {
            match inner.activity.save(&self.paths.activity) {
                Ok(()) => inner.activity_dirty = false,
                Err(e) => {
                    error!(error = %e, "failed to persist activity records, will retry");
                    first_err.get_or_insert(ListError::from(e));
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn load_lists(paths: &StorePaths) -> Result<PatternLists, ListError> {
    let allow = PatternList::load(ListKind::Allow, &paths.allow)?;
    let block = PatternList::load(ListKind::Block, &paths.block)?;
    Ok(PatternLists::new(allow, block))
}

/// Give every block entry a record and drop records of vanished patterns.
/// Returns whether anything changed.
fn reconcile(block: &PatternList, activity: &mut ActivityStore, now: DateTime<Utc>) -> bool {
    let mut changed = false;

    let before = activity.records.len();
    activity.records.retain(|pattern, _| block.contains(pattern));
    let dropped = before - activity.records.len();
    if dropped > 0 {
        debug!(dropped, "dropped activity records of removed patterns");
        changed = true;
    }

    for entry in block.entries() {
        if !activity.records.contains_key(entry.pattern()) {
            activity
                .records
                .insert(entry.pattern().to_string(), ActivityRecord::new(now));
            changed = true;
        }
    }
    changed
}
