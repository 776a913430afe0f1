use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// A single-shot stop request shared by every unit of a run.
///
/// Once raised it stays raised. Raising it more than once has no further
/// effect, but [`raise`](Self::raise) tells the caller whether it was the one
/// that flipped it so the transition is logged exactly once.
#[derive(Debug, Clone, Default)]
pub(crate) struct CancellationSignal {
  token: CancellationToken,
  raised: Arc<AtomicBool>,
}

impl CancellationSignal {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Requests that no further items begin. Returns `true` on the first call.
  pub(crate) fn raise(&self) -> bool {
    let first = !self.raised.swap(true, Ordering::AcqRel);
    self.token.cancel();
    first
  }

  pub(crate) fn is_raised(&self) -> bool {
    self.token.is_cancelled()
  }

  /// Resolves once the signal has been raised.
  pub(crate) async fn raised(&self) {
    self.token.cancelled().await
  }
}
