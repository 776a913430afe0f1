use crate::barrier::CompletionBarrier;
use crate::error::LoopError;
use crate::item::ItemOutcome;

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, debug_span, Instrument};

/// Calls `callback(index, value)` for every item, each on its own task, and
/// waits for all of them.
///
/// Every item starts immediately; there is no concurrency ceiling and no
/// early exit. Use [`BoundedPool`](crate::BoundedPool) when either is needed.
/// This only pays off when the callback spends most of its time waiting
/// (I/O, timers); spawning a task per element is not free.
///
/// # Errors
/// Returns `LoopError::CallbackPanicked` with the lowest panicking index once
/// every other callback has finished.
pub async fn for_each<T, I, F, Fut>(items: I, callback: F) -> Result<(), LoopError>
where
  I: IntoIterator<Item = T>,
  T: Send + 'static,
  F: Fn(usize, T) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = ()> + Send + 'static,
{
  let callback = Arc::new(callback);
  async move {
    let mut barrier = CompletionBarrier::new();
    for (index, value) in items.into_iter().enumerate() {
      let callback = callback.clone();
      barrier.spawn(index, async move {
        callback(index, value).await;
        ItemOutcome::Executed { index, proceed: true }
      });
    }

    debug!(spawned = barrier.outstanding(), "Fan-out spawned. Waiting for completion.");
    barrier.drain().await.map(|_| ())
  }
  .instrument(debug_span!("for_each"))
  .await
}

/// Calls `callback(i)` for every `i` in `0..n`, each on its own task, and waits
/// for all of them. `n == 0` does nothing.
///
/// # Errors
/// See [`for_each`].
pub async fn for_each_n<F, Fut>(n: usize, callback: F) -> Result<(), LoopError>
where
  F: Fn(usize) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = ()> + Send + 'static,
{
  for_each(0..n, move |_, i| callback(i)).await
}
