// Sequential multi-item mutation driver.
//
// Items run strictly one at a time: a single in-flight mutation bounds
// backend load and keeps the progress callback meaningful and monotonic.
// One item failing never aborts the batch; per-item retry happens a layer
// down in ResilientRequestClient, never here.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Snapshot emitted after each processed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkProgress {
    pub current: usize,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct FailedItem<T> {
    pub item: T,
    pub message: String,
}

/// Partial-failure accounting for one bulk run. Both lists preserve
/// submission order; `successful.len() + failed.len()` equals the number of
/// items actually attempted.
#[derive(Debug, Clone)]
pub struct BulkResult<T> {
    pub successful: Vec<T>,
    pub failed: Vec<FailedItem<T>>,
    pub cancelled: bool,
}

impl<T> BulkResult<T> {
    pub fn attempted(&self) -> usize {
        self.successful.len() + self.failed.len()
    }
}

/// Cooperative cancellation for a bulk run, checked before each item. A
/// cancelled run returns whatever it accumulated; unattempted items are
/// neither reported nor progressed.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub async fn run_bulk<T, V, E, F, Fut, P>(
    items: Vec<T>,
    mut perform: F,
    mut on_progress: P,
    cancel: &CancelFlag,
) -> BulkResult<T>
where
    T: Clone,
    E: std::fmt::Display,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<V, E>>,
    P: FnMut(BulkProgress),
{
    let total = items.len();
    let mut result = BulkResult { successful: Vec::new(), failed: Vec::new(), cancelled: false };

    for (index, item) in items.into_iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::info!(
                attempted = result.attempted(),
                total,
                "bulk run cancelled before item {}",
                index + 1
            );
            result.cancelled = true;
            break;
        }

        match perform(item.clone()).await {
            Ok(_) => result.successful.push(item),
            Err(err) => {
                result.failed.push(FailedItem { item, message: err.to_string() });
            }
        }

        on_progress(BulkProgress {
            current: index + 1,
            total,
            successful: result.successful.len(),
            failed: result.failed.len(),
        });
    }

    result
}
