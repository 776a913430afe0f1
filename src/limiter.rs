use crate::error::LoopError;

use std::fmt;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A counting admission gate bounding how many items run at once.
///
/// Capacity is fixed at construction. Each successful [`acquire`](Self::acquire)
/// hands out a [`Slot`]; the capacity it holds goes back to the gate when the
/// slot is dropped, whichever path the holder takes (including unwinding).
#[derive(Debug, Clone)]
pub(crate) struct ConcurrencyLimiter {
  semaphore: Arc<Semaphore>,
  capacity: usize,
}

/// One unit of the concurrency ceiling. Dropping it releases the unit.
pub(crate) struct Slot {
  _permit: OwnedSemaphorePermit,
}

impl fmt::Debug for Slot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Slot").finish_non_exhaustive()
  }
}

impl ConcurrencyLimiter {
  /// Creates a gate with `capacity` slots. Callers validate `capacity > 0`.
  pub(crate) fn new(capacity: usize) -> Self {
    Self {
      semaphore: Arc::new(Semaphore::new(capacity)),
      capacity,
    }
  }

  /// Waits until a slot is free and takes it.
  pub(crate) async fn acquire(&self) -> Result<Slot, LoopError> {
    match self.semaphore.clone().acquire_owned().await {
      Ok(permit) => Ok(Slot { _permit: permit }),
      Err(_) => Err(LoopError::SemaphoreClosed),
    }
  }

  pub(crate) fn capacity(&self) -> usize {
    self.capacity
  }

  /// Number of slots not currently held.
  pub(crate) fn available(&self) -> usize {
    self.semaphore.available_permits()
  }
}
