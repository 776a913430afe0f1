use crate::error::LoopError;
use crate::fan_out::for_each;

use std::future::Future;

use tracing::{debug_span, trace, Instrument};

/// Calls `callback(value)` concurrently for every value in `start..stop`.
///
/// Equivalent to [`range_with_step`] with a step of 1.
pub async fn range<F, Fut>(start: i64, stop: i64, callback: F) -> Result<(), LoopError>
where
  F: Fn(i64) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = ()> + Send + 'static,
{
  range_with_step(start, stop, 1, callback).await
}

/// Calls `callback(value)` concurrently for `start, start + step, ...`, up to
/// but excluding `stop`, and waits for all calls.
///
/// `step` may be negative to count down. A zero step, or a step pointing away
/// from `stop`, iterates nothing.
///
/// # Errors
/// Returns `LoopError::CallbackPanicked` where `index` is the position of the
/// panicking value in the generated sequence.
pub async fn range_with_step<F, Fut>(start: i64, stop: i64, step: i64, callback: F) -> Result<(), LoopError>
where
  F: Fn(i64) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = ()> + Send + 'static,
{
  let values = stepped_values(start, stop, step);
  trace!(start, stop, step, count = values.len(), "Expanding range.");
  for_each(values, move |_, value| callback(value))
    .instrument(debug_span!("range", start, stop, step))
    .await
}

fn step_count(start: i64, stop: i64, step: i64) -> usize {
  if step == 0 {
    return 0;
  }
  let span = i128::from(stop) - i128::from(start);
  let step = i128::from(step);
  if span == 0 || (span > 0) != (step > 0) {
    return 0;
  }
  let count = (span.abs() + step.abs() - 1) / step.abs();
  usize::try_from(count).unwrap_or(usize::MAX)
}

/// The values visited by [`range_with_step`], in order.
pub(crate) fn stepped_values(start: i64, stop: i64, step: i64) -> impl ExactSizeIterator<Item = i64> {
  (0..step_count(start, stop, step)).map(move |i| {
    // Every visited value lies between `start` and `stop`, so it fits an i64.
    (i128::from(start) + i as i128 * i128::from(step)) as i64
  })
}
