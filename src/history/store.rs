//! Append-only, date-partitioned JSON array files.
//!
//! One file per calendar day, `<prefix>-YYYY-MM-DD.json`, holding a pretty-printed
//! JSON array. Every append rewrites the whole file under a single lock:
//!
//! ```text
//! lock → read day (absent = []) → push → serialize → write tmp → rename → unlock
//! ```
//!
//! The rename keeps the visible file a complete array at all times. Reads take
//! the same lock, so they never interleave with a write.

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;

/// Date format used in file names and URLs.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Errors raised by the history store.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("history file {path} is not a JSON array: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// Parse a `YYYY-MM-DD` day.
pub fn parse_day(raw: &str) -> HistoryResult<NaiveDate> {
    if raw.len() != 10 {
        return Err(HistoryError::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, DAY_FORMAT).map_err(|_| HistoryError::InvalidDate(raw.to_string()))
}

/// A JSON-array log partitioned by local calendar day.
pub struct DailyLog<T> {
    dir: PathBuf,
    prefix: String,
    lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T> DailyLog<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the records of `day`.
    pub fn path_for(&self, day: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}-{}.json", self.prefix, day.format(DAY_FORMAT)))
    }

    /// Append to the file of the day that is current when the lock is taken.
    pub async fn append(&self, record: T) -> HistoryResult<NaiveDate> {
        let _guard = self.lock.lock().await;
        let today = Local::now().date_naive();
        self.append_locked(today, record).await?;
        Ok(today)
    }

    /// Append to the file of a specific day.
    pub async fn append_on(&self, day: NaiveDate, record: T) -> HistoryResult<()> {
        let _guard = self.lock.lock().await;
        self.append_locked(day, record).await
    }

    async fn append_locked(&self, day: NaiveDate, record: T) -> HistoryResult<()> {
        let path = self.path_for(day);

        let mut records = match self.read_file(&path).await {
            Ok(records) => records,
            Err(HistoryError::Corrupt { reason, .. }) => {
                let aside = self.set_aside(&path).await;
                tracing::warn!(
                    path = %path.display(),
                    moved_to = ?aside,
                    reason = %reason,
                    "History file unreadable, starting a fresh array"
                );
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "History read failed, starting a fresh array");
                Vec::new()
            }
        };
        records.push(record);

        let bytes = serde_json::to_vec_pretty(&records)?;
        fs::create_dir_all(&self.dir).await.map_err(|source| HistoryError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).await.map_err(|source| HistoryError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).await.map_err(|source| HistoryError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::trace!(path = %path.display(), count = records.len(), "History appended");
        Ok(())
    }

    /// Move an unreadable file out of the way so its contents are kept.
    async fn set_aside(&self, path: &Path) -> Option<PathBuf> {
        let stamp = Local::now().format("%H%M%S%3f");
        let aside = path.with_extension(format!("json.corrupt-{}", stamp));
        fs::rename(path, &aside).await.ok().map(|_| aside)
    }

    /// All records of `day`; an absent file is an empty day.
    pub async fn read_day(&self, day: NaiveDate) -> HistoryResult<Vec<T>> {
        let _guard = self.lock.lock().await;
        self.read_file(&self.path_for(day)).await
    }

    async fn read_file(&self, path: &Path) -> HistoryResult<Vec<T>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| HistoryError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Days that have a file, newest first.
    pub async fn list_days(&self) -> HistoryResult<Vec<NaiveDate>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut days = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|source| HistoryError::Io {
            path: self.dir.clone(),
            source,
        })? {
            let name = entry.file_name();
            if let Some(day) = name.to_str().and_then(|n| self.day_from_file_name(n)) {
                days.push(day);
            }
        }

        days.sort_unstable_by(|a, b| b.cmp(a));
        Ok(days)
    }

    fn day_from_file_name(&self, name: &str) -> Option<NaiveDate> {
        let rest = name.strip_prefix(self.prefix.as_str())?.strip_prefix('-')?;
        let raw = rest.strip_suffix(".json")?;
        parse_day(raw).ok()
    }
}

impl<T> std::fmt::Debug for DailyLog<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyLog")
            .field("dir", &self.dir)
            .field("prefix", &self.prefix)
            .finish()
    }
}
