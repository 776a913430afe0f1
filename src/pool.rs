use crate::barrier::CompletionBarrier;
use crate::error::LoopError;
use crate::item::{ItemOutcome, PoolReport, WorkItem};
use crate::limiter::ConcurrencyLimiter;
use crate::signal::CancellationSignal;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use tracing::{debug, error, info_span, trace, trace_span, warn, Instrument};

lazy_static::lazy_static! {
  static ref NEXT_POOL_RUN_ID_COUNTER: AtomicU64 = AtomicU64::new(0);
}

const DEFAULT_POOL_NAME: &str = "bounded_pool";

/// Iterates a sequence with at most `workers` callbacks in flight, stopping
/// early once any callback asks it to.
///
/// A `BoundedPool` only holds configuration. Every [`run`](Self::run) creates
/// its own admission gate, stop signal and completion barrier, and tears them
/// down before returning, so one pool value can be reused (even concurrently)
/// without runs affecting each other.
///
/// Bounded concurrency is useful when the work should happen concurrently but
/// at a reduced rate, e.g. to stay under an API rate limit or to avoid running
/// out of file descriptors. A single worker gives serial iteration.
#[derive(Debug, Clone)]
pub struct BoundedPool {
  name: Arc<String>,
  workers: usize,
}

impl BoundedPool {
  /// Creates a pool that admits at most `workers` items at once.
  ///
  /// # Errors
  /// Returns `LoopError::ZeroWorkers` if `workers` is zero, since such a pool
  /// could never admit anything.
  pub fn new(workers: usize) -> Result<Self, LoopError> {
    if workers == 0 {
      return Err(LoopError::ZeroWorkers);
    }
    Ok(Self {
      name: Arc::new(DEFAULT_POOL_NAME.to_string()),
      workers,
    })
  }

  /// Sets the name recorded on this pool's tracing spans.
  pub fn with_name(mut self, name: &str) -> Self {
    self.name = Arc::new(name.to_string());
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn workers(&self) -> usize {
    self.workers
  }

  /// Calls `callback(index, value)` for each item, with no more than
  /// [`workers`](Self::workers) calls running at the same time.
  ///
  /// Items are offered in input order. The dispatch loop waits for a free slot
  /// before starting the next item, so items past the first `workers` do not
  /// start until an earlier one finishes. Completion order is unconstrained.
  ///
  /// The callback resolves to `true` to continue or `false` to stop. After a
  /// `false`, no item that has not yet started will run; it is counted as
  /// skipped instead. Callbacks already running are left to finish.
  ///
  /// Resolves once every started callback has finished. No callback side
  /// effect happens after this returns.
  ///
  /// # Errors
  /// Returns `LoopError::CallbackPanicked` with the lowest panicking index if
  /// any callback panicked. All other items are still run or skipped and the
  /// pool is fully drained first. Returns `LoopError::Join` if an item task
  /// could not be joined, e.g. because the runtime is shutting down.
  pub async fn run<T, I, F, Fut>(&self, items: I, callback: F) -> Result<PoolReport, LoopError>
  where
    I: IntoIterator<Item = T>,
    T: Send + 'static,
    F: Fn(usize, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
  {
    let run_id = NEXT_POOL_RUN_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
    let span = info_span!("bounded_pool", name = %*self.name, run_id, workers = self.workers);
    self.dispatch(items.into_iter(), Arc::new(callback)).instrument(span).await
  }

  async fn dispatch<T, F, Fut>(&self, items: impl Iterator<Item = T>, callback: Arc<F>) -> Result<PoolReport, LoopError>
  where
    T: Send + 'static,
    F: Fn(usize, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
  {
    let limiter = ConcurrencyLimiter::new(self.workers);
    let signal = CancellationSignal::new();
    let mut barrier = CompletionBarrier::new();
    debug!("Dispatching items.");

    let mut items = items.enumerate();
    while let Some((index, value)) = items.next() {
      let item = WorkItem::new(index, value);

      let admitted = tokio::select! {
        biased;

        _ = signal.raised() => None,

        acquired = limiter.acquire() => match acquired {
          Ok(slot) => Some(slot),
          Err(closed) => {
            error!(%index, "Admission gate closed while dispatching. Draining admitted items.");
            return Err(drain_after_gate_closed(barrier, closed).await);
          }
        },
      };

      let Some(slot) = admitted else {
        let remaining = 1 + items.by_ref().count();
        debug!(first_unadmitted = index, remaining, "Stop requested. Not admitting remaining items.");
        barrier.record_unadmitted(remaining);
        break;
      };
      trace!(%index, available = limiter.available(), capacity = limiter.capacity(), "Admitted item.");

      let item_signal = signal.clone();
      let item_callback = callback.clone();
      barrier.spawn(
        index,
        async move {
          // Dropped last: a stop request must be raised before the slot frees.
          let _slot = slot;
          let WorkItem { index, value } = item;

          if item_signal.is_raised() {
            trace!("Stop already requested. Skipping item.");
            return ItemOutcome::Skipped { index };
          }

          let proceed = item_callback(index, value).await;
          if !proceed && item_signal.raise() {
            debug!("Callback requested stop. No further items will start.");
          }
          ItemOutcome::Executed { index, proceed }
        }
        .instrument(trace_span!("pool_item", %index)),
      );

      barrier.reap_finished();
    }

    debug!(outstanding = barrier.outstanding(), "All items offered. Draining.");
    let outcome = barrier.drain().await;
    match &outcome {
      Ok(report) => debug!(
        executed = report.executed,
        skipped = report.skipped,
        cancelled = report.cancelled,
        "Run finished."
      ),
      Err(e) => error!("Run finished with error: {}", e),
    }
    outcome
  }
}

/// Waits for already admitted items before surfacing `closed`, logging what
/// the drain itself produced so a panic or join failure is not lost.
async fn drain_after_gate_closed(barrier: CompletionBarrier, closed: LoopError) -> LoopError {
  match barrier.drain().await {
    Ok(report) => warn!(
      executed = report.executed,
      skipped = report.skipped,
      cancelled = report.cancelled,
      "Drained admitted items after the admission gate closed."
    ),
    Err(e) => error!("Draining after the admission gate closed also failed: {}", e),
  }
  closed
}

/// Runs `callback` over `items` on a fresh [`BoundedPool`] with `workers`
/// slots. See [`BoundedPool::run`].
///
/// # Errors
/// Returns `LoopError::ZeroWorkers` if `workers` is zero, otherwise whatever
/// [`BoundedPool::run`] returns.
pub async fn pool<T, I, F, Fut>(items: I, workers: usize, callback: F) -> Result<PoolReport, LoopError>
where
  I: IntoIterator<Item = T>,
  T: Send + 'static,
  F: Fn(usize, T) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = bool> + Send + 'static,
{
  BoundedPool::new(workers)?.run(items, callback).await
}
