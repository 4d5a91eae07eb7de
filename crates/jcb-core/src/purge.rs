//! Aging out stale block entries.
//!
//! A non-permanent block entry is stale once it has gone longer than the
//! configured age without firing. Age runs from the last match, or from
//! creation if the entry never matched. Removed entries are appended to an
//! archive file as a commented record followed by the original list line,
//! so an operator can restore one by copying it back.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jcb_config::PurgeConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::lists::file::render_entry;
use crate::lists::{ActivityRecord, ListStore, PatternEntry, RemovedEntry};
use crate::persist;

/// When an entry counts as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgePolicy {
    pub max_age: ChronoDuration,
}

impl PurgePolicy {
    pub fn new(max_age_days: u32) -> Self {
        Self {
            max_age: ChronoDuration::days(i64::from(max_age_days)),
        }
    }

    pub fn from_config(config: &PurgeConfig) -> Self {
        Self::new(config.max_age_days)
    }

    /// Permanent entries never go stale; neither do entries without an
    /// activity record.
    pub fn is_stale(
        &self,
        entry: &PatternEntry,
        record: Option<&ActivityRecord>,
        now: DateTime<Utc>,
    ) -> bool {
        if entry.is_permanent() {
            return false;
        }
        record.is_some_and(|r| r.idle_for(now) > self.max_age)
    }
}

/// One entry removed (or, on a dry run, that would be removed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgedEntry {
    pub pattern: String,
    pub last_activity: Option<DateTime<Utc>>,
    pub match_count: u64,
}

impl PurgedEntry {
    fn new(entry: &PatternEntry, record: Option<&ActivityRecord>) -> Self {
        Self {
            pattern: entry.pattern().to_string(),
            last_activity: record.map(ActivityRecord::last_activity),
            match_count: record.map_or(0, |r| r.match_count),
        }
    }
}

/// Outcome of one purge pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub checked: usize,
    pub removed: Vec<PurgedEntry>,
    pub dry_run: bool,
}

/// Run one purge pass at `now`.
///
/// With `dry_run` the store is left untouched and the report lists what
/// would go.
pub fn purge_stale(
    store: &ListStore,
    policy: &PurgePolicy,
    now: DateTime<Utc>,
    archive: Option<&Path>,
    dry_run: bool,
) -> PurgeReport {
    let checked = store.snapshot().block.len();

    if dry_run {
        let lists = store.snapshot();
        let activity = store.activity();
        let removed = lists
            .block
            .entries()
            .iter()
            .filter(|e| policy.is_stale(e, activity.get(e.pattern()), now))
            .map(|e| PurgedEntry::new(e, activity.get(e.pattern())))
            .collect();
        return PurgeReport {
            checked,
            removed,
            dry_run,
        };
    }

    let removed = store.remove_matching(|entry, record| policy.is_stale(entry, record, now));
    for r in &removed {
        info!(
            pattern = r.entry.pattern(),
            last_activity = ?r.activity.as_ref().map(ActivityRecord::last_activity),
            "purged stale block pattern"
        );
    }
    if let Some(path) = archive.filter(|_| !removed.is_empty()) {
        if let Err(e) = persist::append(path, archive_text(&removed, now).as_bytes()) {
            error!(path = %path.display(), error = %e, "failed to write purge archive");
        }
    }

    PurgeReport {
        checked,
        removed: removed
            .iter()
            .map(|r| PurgedEntry::new(&r.entry, r.activity.as_ref()))
            .collect(),
        dry_run,
    }
}

fn archive_text(removed: &[RemovedEntry], now: DateTime<Utc>) -> String {
    let mut out = String::new();
    for r in removed {
        let last = r
            .activity
            .as_ref()
            .map(|a| a.last_activity().to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string());
        let count = r.activity.as_ref().map_or(0, |a| a.match_count);
        out.push_str(&format!(
            "# purged {} last activity {} matches {}\n{}\n",
            now.to_rfc3339(),
            last,
            count,
            render_entry(&r.entry)
        ));
    }
    out
}

/// Periodic purge task.
#[derive(Debug, Clone)]
pub struct PurgeScheduler {
    store: Arc<ListStore>,
    policy: PurgePolicy,
    every: Duration,
    archive: Option<PathBuf>,
}

impl PurgeScheduler {
    pub fn new(
        store: Arc<ListStore>,
        policy: PurgePolicy,
        every: Duration,
        archive: Option<PathBuf>,
    ) -> Self {
        Self {
            store,
            policy,
            every,
            archive,
        }
    }

    /// Purge now and then every interval until shutdown.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(every_secs = self.every.as_secs(), "purge scheduler started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    let report = purge_stale(
                        &self.store,
                        &self.policy,
                        Utc::now(),
                        self.archive.as_deref(),
                        false,
                    );
                    debug!(checked = report.checked, removed = report.removed.len(), "purge pass done");
                }
            }
        }
        debug!("purge scheduler stopped");
    }
}
