//! Tokio-based structured fan-out over collections and integer ranges:
//! unbounded per-element tasks, batched iteration, and a bounded pool with
//! cooperative early cancellation.

mod barrier;
mod batch;
mod error;
mod fan_out;
mod item;
mod limiter;
mod pool;
mod range;
mod signal;

pub use batch::batch;
pub use error::LoopError;
pub use fan_out::{for_each, for_each_n};
pub use item::PoolReport;
pub use pool::{pool, BoundedPool};
pub use range::{range, range_with_step};
