use crate::error::LoopError;
use crate::item::ItemOutcome;
use crate::item::PoolReport;

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, trace};

/// Join barrier over every unit of work spawned by one iteration call.
///
/// Each spawned unit contributes exactly one [`ItemOutcome`], whether its
/// callback ran, was skipped, or panicked. Panics are caught at the task
/// boundary so that one faulting callback cannot leave the barrier waiting
/// forever or stop the others from being joined.
#[derive(Debug)]
pub(crate) struct CompletionBarrier {
  tasks: JoinSet<ItemOutcome>,
  report: PoolReport,
  first_panic: Option<usize>,
  join_failure: Option<String>,
}

impl CompletionBarrier {
  pub(crate) fn new() -> Self {
    Self {
      tasks: JoinSet::new(),
      report: PoolReport::default(),
      first_panic: None,
      join_failure: None,
    }
  }

  /// Spawns a unit of work on the current runtime and tracks it.
  pub(crate) fn spawn<F>(&mut self, index: usize, unit: F)
  where
    F: Future<Output = ItemOutcome> + Send + 'static,
  {
    self.tasks.spawn(AssertUnwindSafe(unit).catch_unwind().map(move |caught| match caught {
      Ok(outcome) => outcome,
      Err(_panic_payload) => {
        error!(%index, "Callback panicked during execution.");
        ItemOutcome::Panicked { index }
      }
    }));
  }

  /// Accounts for `count` items the dispatch loop skipped without admitting.
  pub(crate) fn record_unadmitted(&mut self, count: usize) {
    self.report.skipped += count;
  }

  /// Number of spawned units not yet joined.
  pub(crate) fn outstanding(&self) -> usize {
    self.tasks.len()
  }

  /// Collects outcomes of units that already finished, without waiting.
  pub(crate) fn reap_finished(&mut self) {
    while let Some(joined) = self.tasks.try_join_next() {
      self.absorb(joined);
    }
  }

  /// Waits for every spawned unit and returns the accumulated report.
  pub(crate) async fn drain(mut self) -> Result<PoolReport, LoopError> {
    trace!(outstanding = self.tasks.len(), "Draining completion barrier.");
    while let Some(joined) = self.tasks.join_next().await {
      self.absorb(joined);
    }

    if let Some(reason) = self.join_failure {
      return Err(LoopError::Join(reason));
    }
    if let Some(index) = self.first_panic {
      return Err(LoopError::CallbackPanicked { index });
    }
    Ok(self.report)
  }

  fn absorb(&mut self, joined: Result<ItemOutcome, JoinError>) {
    match joined {
      Ok(outcome) => {
        if let ItemOutcome::Panicked { index } = outcome {
          self.first_panic = Some(self.first_panic.map_or(index, |seen| seen.min(index)));
        }
        if let ItemOutcome::Executed { proceed: false, .. } = outcome {
          self.report.cancelled = true;
        }
        trace!(index = outcome.index(), ?outcome, "Item accounted for.");
        self.report.record(outcome);
      }
      Err(join_error) => {
        error!("Item task failed to join: {:?}", join_error);
        if self.join_failure.is_none() {
          self.join_failure = Some(join_error.to_string());
        }
      }
    }
  }
}
