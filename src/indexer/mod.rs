//! Background inference indexing.
//!
//! Each source file gets its own cache slot holding the declarations the
//! inference tool reported for it. Jobs run on a small fixed pool; the
//! interactive path only ever reads the cache.
//!
//! # File states
//!
//! ```text
//! Unindexed -> Indexing -> Indexed
//!                 ^           |
//!                 +-- save ---+
//! ```
//!
//! A failed run, including one with empty output, leaves the previous
//! snapshot (or the lack of one) untouched. Readers that find no snapshot wait
//! up to `tries × delay` for one to be published for their file.

mod oracle;

pub use oracle::{parse_inference_output, InferenceRecord, InferenceTool, OracleCommand};
pub(crate) use oracle::capture_output;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use chrono::{DateTime, Local};
use dashmap::DashMap;
use tokio::{
    sync::{Notify, Semaphore},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::{config::Settings, error::ToolError, matcher::Similarity};

/// Declarations of one file, as of one completed inference run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCacheEntry {
    pub file_path: PathBuf,
    pub declarations: Vec<InferenceRecord>,
    pub timestamp: DateTime<Local>,
}

impl IndexCacheEntry {
    /// The declaration whose bare name is the last segment of `query`.
    ///
    /// Several candidates are ranked by how closely their full name matches
    /// the whole query; ties go to the earlier record.
    pub fn best_match(&self, query: &str) -> Option<&InferenceRecord> {
        let name = query.rsplit('.').next().unwrap_or(query);
        let mut similarity = Similarity::new(query);

        let mut best: Option<(&InferenceRecord, u32)> = None;
        for record in self.declarations.iter().filter(|record| record.name == name) {
            let score = similarity.score(&record.full_name);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((record, score));
            }
        }
        best.map(|(record, _)| record)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Unindexed,
    Indexing,
    Indexed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub tries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            tries: 10,
            delay: Duration::from_millis(100),
        }
    }
}

impl From<&Settings> for RetryPolicy {
    fn from(settings: &Settings) -> Self {
        RetryPolicy {
            tries: settings.lookup_retries,
            delay: Duration::from_millis(settings.lookup_retry_delay_ms),
        }
    }
}

/// Cheap to clone; clones share the cache and the worker pool.
#[derive(Clone)]
pub struct BackgroundIndexer {
    inner: Arc<Inner>,
}

struct Inner {
    tool: Arc<dyn InferenceTool>,
    cache: DashMap<PathBuf, Arc<IndexCacheEntry>>,
    /// Jobs requested but not yet finished, per file.
    in_flight: DashMap<PathBuf, usize>,
    workers: Arc<Semaphore>,
    /// Woken on every publication for the keyed file.
    published: DashMap<PathBuf, Arc<Notify>>,
    retry: RetryPolicy,
}

impl BackgroundIndexer {
    pub fn new(tool: Arc<dyn InferenceTool>, workers: usize, retry: RetryPolicy) -> BackgroundIndexer {
        BackgroundIndexer {
            inner: Arc::new(Inner {
                tool,
                cache: DashMap::new(),
                in_flight: DashMap::new(),
                workers: Arc::new(Semaphore::new(workers.max(1))),
                published: DashMap::new(),
                retry,
            }),
        }
    }

    pub fn from_settings(settings: &Settings) -> BackgroundIndexer {
        BackgroundIndexer::new(
            Arc::new(OracleCommand::new(settings.oracle_command.clone())),
            settings.indexer_workers,
            RetryPolicy::from(settings),
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.inner.retry
    }

    /// Queue an inference run for `file`. Must be called inside a tokio runtime.
    ///
    /// The returned handle completes once the run has published or failed;
    /// callers are free to drop it.
    pub fn request_index(&self, file: impl Into<PathBuf>) -> JoinHandle<()> {
        let file = file.into();
        *self.inner.in_flight.entry(file.clone()).or_insert(0) += 1;
        debug!(file = %file.display(), "queued inference run");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.index(&file).await;
            inner.finish(&file);
        })
    }

    pub fn state(&self, file: &Path) -> IndexState {
        if self.inner.in_flight.get(file).is_some_and(|count| *count > 0) {
            IndexState::Indexing
        } else if self.inner.cache.contains_key(file) {
            IndexState::Indexed
        } else {
            IndexState::Unindexed
        }
    }

    /// The current snapshot for `file`, without waiting.
    pub fn entry(&self, file: &Path) -> Option<Arc<IndexCacheEntry>> {
        self.inner
            .cache
            .get(file)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// The snapshot for `file`, waiting up to `tries` retry delays for one to appear.
    ///
    /// Only a publication for `file` itself wakes the waiter early. The
    /// overall wait never exceeds `tries × delay`; with `tries == 0` this
    /// never waits.
    pub async fn wait_for_entry(&self, file: &Path, tries: u32) -> Option<Arc<IndexCacheEntry>> {
        let published = self.inner.publication(file);
        let deadline = Instant::now() + self.inner.retry.delay * tries;
        loop {
            let notified = published.notified();

            if let Some(entry) = self.entry(file) {
                return Some(entry);
            }
            let now = Instant::now();
            if now >= deadline {
                debug!(file = %file.display(), tries, "no inference data");
                return None;
            }

            let _ = tokio::time::timeout(deadline - now, notified).await;
        }
    }

    /// The best declaration for `query` in `file`, or `None` when nothing matches.
    pub async fn lookup(&self, file: &Path, query: &str, tries: u32) -> Option<InferenceRecord> {
        if query.is_empty() {
            return None;
        }
        let entry = self.wait_for_entry(file, tries).await?;
        entry.best_match(query).cloned()
    }

    pub fn indexed_files(&self) -> Vec<PathBuf> {
        self.inner
            .cache
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }
}

impl Inner {
    fn publication(&self, file: &Path) -> Arc<Notify> {
        let notify = self.published.entry(file.to_path_buf()).or_default();
        Arc::clone(notify.value())
    }

    async fn index(&self, file: &Path) {
        let Ok(_permit) = Arc::clone(&self.workers).acquire_owned().await else {
            return;
        };

        let tool = Arc::clone(&self.tool);
        let job_file = file.to_path_buf();
        let result = tokio::task::spawn_blocking(move || {
            let output = tool.run(&job_file)?;
            if output.trim().is_empty() {
                return Err(ToolError::EmptyOutput {
                    program: tool.name().to_string(),
                });
            }
            parse_inference_output(&output)
        })
        .await;

        match result {
            Ok(Ok(declarations)) => {
                info!(
                    file = %file.display(),
                    declarations = declarations.len(),
                    "indexed"
                );
                let entry = IndexCacheEntry {
                    file_path: file.to_path_buf(),
                    declarations,
                    timestamp: Local::now(),
                };
                self.cache.insert(file.to_path_buf(), Arc::new(entry));
                if let Some(published) = self.published.get(file) {
                    published.notify_waiters();
                }
            }
            Ok(Err(err)) => {
                warn!(file = %file.display(), tool = self.tool.name(), "inference failed: {err}");
            }
            Err(err) => {
                warn!(file = %file.display(), "inference job aborted: {err}");
            }
        }
    }

    fn finish(&self, file: &Path) {
        if let Some(mut count) = self.in_flight.get_mut(file) {
            *count = count.saturating_sub(1);
        }
        self.in_flight.remove_if(file, |_, count| *count == 0);
    }
}
