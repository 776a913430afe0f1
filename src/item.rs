/// An element of the input sequence together with its position.
///
/// The index is preserved so that callbacks can correlate their work with the
/// input even though completion order is unconstrained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorkItem<T> {
  pub(crate) index: usize,
  pub(crate) value: T,
}

impl<T> WorkItem<T> {
  pub(crate) fn new(index: usize, value: T) -> Self {
    Self { index, value }
  }
}

/// What happened to a single dispatched item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemOutcome {
  /// The callback ran to completion. `proceed` is the value it returned.
  Executed { index: usize, proceed: bool },
  /// The item was admitted after cancellation had been raised.
  Skipped { index: usize },
  /// The callback panicked. Its slot was still released.
  Panicked { index: usize },
}

impl ItemOutcome {
  pub(crate) fn index(&self) -> usize {
    match *self {
      ItemOutcome::Executed { index, .. } | ItemOutcome::Skipped { index } | ItemOutcome::Panicked { index } => index,
    }
  }
}

/// Summary of a [`BoundedPool::run`](crate::BoundedPool::run) call.
///
/// `executed + skipped` always equals the number of input items. A panicking
/// callback is not counted here; it makes `run` return
/// [`LoopError::CallbackPanicked`](crate::LoopError::CallbackPanicked) instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
  /// Items whose callback was invoked.
  pub executed: usize,
  /// Items that were offered to the pool but not executed because a callback
  /// had already asked to stop.
  pub skipped: usize,
  /// Whether any callback returned `false`.
  pub cancelled: bool,
}

impl PoolReport {
  /// Total number of items accounted for.
  pub fn total(&self) -> usize {
    self.executed + self.skipped
  }

  pub(crate) fn record(&mut self, outcome: ItemOutcome) {
    match outcome {
      ItemOutcome::Executed { .. } => self.executed += 1,
      ItemOutcome::Skipped { .. } => self.skipped += 1,
      ItemOutcome::Panicked { .. } => {}
    }
  }
}
