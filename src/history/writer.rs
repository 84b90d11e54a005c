//! Background persistence of history records.
//!
//! Appends run as tracked tasks so the response never waits on disk, while
//! shutdown can still wait for every record already handed over.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::config::HistoryConfig;
use crate::history::records::{AuditRecord, VisitRecord};
use crate::history::store::DailyLog;
use crate::observability::metrics;

/// Owns the audit and visit logs and the tasks writing to them.
#[derive(Clone, Debug)]
pub struct HistoryWriter {
    audit: Arc<DailyLog<AuditRecord>>,
    visits: Arc<DailyLog<VisitRecord>>,
    tracker: TaskTracker,
}

impl HistoryWriter {
    pub fn new(audit: DailyLog<AuditRecord>, visits: DailyLog<VisitRecord>) -> Self {
        Self {
            audit: Arc::new(audit),
            visits: Arc::new(visits),
            tracker: TaskTracker::new(),
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(
            DailyLog::new(&config.data_dir, config.audit_prefix.clone()),
            DailyLog::new(&config.data_dir, config.visit_prefix.clone()),
        )
    }

    pub fn audit_log(&self) -> &DailyLog<AuditRecord> {
        &self.audit
    }

    pub fn visit_log(&self) -> &DailyLog<VisitRecord> {
        &self.visits
    }

    /// Run `task` on the writer's tracker.
    ///
    /// The task keeps running when the returned handle is dropped, and
    /// `flush`/`drain` wait for it along with the writes it schedules.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(task)
    }

    /// Schedule an audit record for persistence.
    pub fn record_audit(&self, record: AuditRecord) {
        self.spawn_append(self.audit.clone(), record);
    }

    /// Schedule a visit record for persistence.
    pub fn record_visit(&self, record: VisitRecord) {
        self.spawn_append(self.visits.clone(), record);
    }

    fn spawn_append<T>(&self, log: Arc<DailyLog<T>>, record: T)
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.tracker.spawn(async move {
            match log.append(record).await {
                Ok(day) => {
                    metrics::record_history_write(log.prefix(), true);
                    tracing::debug!(log = log.prefix(), %day, "History record persisted");
                }
                Err(e) => {
                    metrics::record_history_write(log.prefix(), false);
                    tracing::error!(log = log.prefix(), error = %e, "Failed to persist history record");
                }
            }
        });
    }

    /// Writes scheduled but not yet finished.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every write scheduled so far has finished. New writes may
    /// still be scheduled afterwards.
    pub async fn flush(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Close the tracker and wait for in-flight writes. Called once on shutdown.
    ///
    /// Returns `false` if the timeout elapsed first.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            tracing::info!(pending, "Draining history writes");
        }
        match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(pending = self.tracker.len(), "History drain timed out, records lost");
                false
            }
        }
    }
}
