//! Batch coordinator: fans per-record work across a fixed-size worker pool.
//!
//! Each item runs to completion on the blocking pool. A failing or panicking
//! item becomes a [`BatchFailure`]; it never cancels its siblings. The
//! coordinator returns only after every submitted item has finished.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{error, warn};

use catalogc_shared::{ProductId, Result};

/// Progress callback for long-running batches.
pub trait BatchProgress: Send + Sync {
    /// Called when a pipeline enters a new phase.
    fn phase(&self, name: &str, total: usize);
    /// Called after each item finishes, successfully or not.
    fn item_done(&self, done: usize, total: usize);
}

/// No-op progress for headless and test usage.
pub struct SilentProgress;

impl BatchProgress for SilentProgress {
    fn phase(&self, _name: &str, _total: usize) {}
    fn item_done(&self, _done: usize, _total: usize) {}
}

/// One item that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub id: ProductId,
    pub error: String,
}

/// Aggregate of a batch. Both lists are sorted by id.
#[derive(Debug, Clone)]
pub struct BatchReport<O> {
    pub outcomes: Vec<(ProductId, O)>,
    pub failures: Vec<BatchFailure>,
}

impl<O> BatchReport<O> {
    pub fn succeeded(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len() + self.failures.len()
    }
}

/// What one spawned item resolves to.
type Joined<O> = (ProductId, std::result::Result<O, String>);

/// Run `task` over every `(id, item)` with at most `workers` in flight.
pub async fn run_batch<T, O, F>(
    items: Vec<(ProductId, T)>,
    workers: usize,
    task: F,
    progress: &dyn BatchProgress,
) -> BatchReport<O>
where
    T: Send + 'static,
    O: Send + 'static,
    F: Fn(T) -> Result<O> + Send + Sync + 'static,
{
    let total = items.len();
    let task = Arc::new(task);
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut set = JoinSet::new();
    let mut in_flight = HashMap::with_capacity(total);

    for (id, item) in items {
        let task = Arc::clone(&task);
        let semaphore = Arc::clone(&semaphore);
        let handle = set.spawn(async move {
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return (id, Err("worker pool closed".to_string())),
            };
            let joined = tokio::task::spawn_blocking(move || {
                std::panic::catch_unwind(AssertUnwindSafe(|| task(item)))
            })
            .await;
            drop(permit);

            let outcome = match joined {
                Ok(Ok(Ok(output))) => Ok(output),
                Ok(Ok(Err(e))) => Err(e.to_string()),
                Ok(Err(payload)) => Err(format!("worker panicked: {}", panic_message(&*payload))),
                Err(e) => Err(format!("worker task failed: {e}")),
            };
            (id, outcome)
        });
        in_flight.insert(handle.id(), id);
    }

    collect(set, in_flight, progress).await
}

/// Drain `set`, attributing tasks that died before reporting to the id they
/// were spawned for.
async fn collect<O: Send + 'static>(
    mut set: JoinSet<Joined<O>>,
    mut in_flight: HashMap<task::Id, ProductId>,
    progress: &dyn BatchProgress,
) -> BatchReport<O> {
    let total = in_flight.len();
    let mut outcomes = Vec::with_capacity(total);
    let mut failures = Vec::new();
    let mut done = 0;

    while let Some(joined) = set.join_next_with_id().await {
        done += 1;
        match joined {
            Ok((task_id, (id, Ok(output)))) => {
                in_flight.remove(&task_id);
                outcomes.push((id, output));
            }
            Ok((task_id, (id, Err(error)))) => {
                in_flight.remove(&task_id);
                warn!(product_id = id, %error, "item failed");
                failures.push(BatchFailure { id, error });
            }
            Err(e) => match in_flight.remove(&e.id()) {
                Some(id) => {
                    let error = format!("batch task aborted: {e}");
                    warn!(product_id = id, %error, "item failed");
                    failures.push(BatchFailure { id, error });
                }
                None => error!(error = %e, "batch task aborted"),
            },
        }
        progress.item_done(done, total);
    }

    outcomes.sort_by_key(|(id, _)| *id);
    failures.sort_by_key(|f| f.id);

    BatchReport { outcomes, failures }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
