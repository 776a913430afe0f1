use crate::error::LoopError;
use crate::fan_out::for_each;

use std::future::Future;

use tracing::{debug_span, warn, Instrument};

/// Splits `items` into consecutive batches of `size` and calls
/// `callback(batch_index, batch)` for every batch concurrently.
///
/// The last batch holds the remainder and may be shorter. Handy for breaking
/// one large request into several smaller ones. A `size` of zero iterates
/// nothing. There is no early stop: every batch runs once started, so use
/// [`BoundedPool`](crate::BoundedPool) over pre-chunked input when a batch
/// must be able to cancel the rest.
///
/// # Errors
/// Returns `LoopError::CallbackPanicked` where `index` is the batch index.
pub async fn batch<T, I, F, Fut>(items: I, size: usize, callback: F) -> Result<(), LoopError>
where
  I: IntoIterator<Item = T>,
  T: Send + 'static,
  F: Fn(usize, Vec<T>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = ()> + Send + 'static,
{
  if size == 0 {
    warn!("Batch size of zero requested. Nothing will be iterated.");
    return Ok(());
  }

  let batches = into_batches(items, size);
  for_each(batches, callback)
    .instrument(debug_span!("batch", size))
    .await
}

fn into_batches<T>(items: impl IntoIterator<Item = T>, size: usize) -> Vec<Vec<T>> {
  let mut items = items.into_iter().peekable();
  let mut batches = Vec::new();
  while items.peek().is_some() {
    batches.push(items.by_ref().take(size).collect());
  }
  batches
}
