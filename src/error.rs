use thiserror::Error;

/// Errors that can occur while fanning out work with `futures_fanout`.
///
/// Early termination requested by a callback is not an error; it is reported
/// through [`PoolReport`](crate::PoolReport) instead.
#[derive(Error, Debug, PartialEq)]
pub enum LoopError {
  #[error("Bounded pool requires at least one worker")]
  ZeroWorkers,

  #[error("Callback for item {index} panicked")]
  CallbackPanicked { index: usize },

  #[error("Pool's admission semaphore was closed unexpectedly")]
  SemaphoreClosed,

  #[error("Spawned item task could not be joined (runtime shutting down?): {0}")]
  Join(String),
}
