use futures_fanout::{batch, for_each, for_each_n, range, range_with_step, LoopError};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

fn setup_tracing_for_test() {
  use std::sync::Once;
  use tracing_subscriber::{fmt, EnvFilter};
  static TRACING_INIT: Once = Once::new();

  TRACING_INIT.call_once(|| {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,futures_fanout=debug"));

    fmt::Subscriber::builder()
      .with_env_filter(filter)
      .with_test_writer()
      .try_init()
      .ok();
  });
}

fn assert_ran_concurrently(elapsed: Duration) {
  assert!(
    elapsed >= Duration::from_millis(100) && elapsed <= Duration::from_millis(200),
    "Expected elapsed time to be between 100ms and 200ms, but got {:?}",
    elapsed
  );
}

#[tokio::test]
async fn test_for_each_runs_every_item_concurrently() {
  setup_tracing_for_test();
  let sum = Arc::new(AtomicI32::new(0));

  let started_at = Instant::now();
  {
    let sum = sum.clone();
    for_each(vec![1, 2, 3, 4, 5], move |_, v| {
      let sum = sum.clone();
      async move {
        sleep(Duration::from_millis(100)).await;
        sum.fetch_add(v * 2, Ordering::SeqCst);
      }
    })
    .await
    .unwrap();
  }

  assert_ran_concurrently(started_at.elapsed());
  assert_eq!(sum.load(Ordering::SeqCst), 2 + 4 + 6 + 8 + 10);
}

#[tokio::test]
async fn test_for_each_passes_input_positions() {
  setup_tracing_for_test();
  let pairs = Arc::new(Mutex::new(Vec::new()));

  {
    let pairs = pairs.clone();
    for_each(vec!["a", "b", "c"], move |i, v| {
      let pairs = pairs.clone();
      async move {
        pairs.lock().push((i, v));
      }
    })
    .await
    .unwrap();
  }

  let mut pairs = pairs.lock().clone();
  pairs.sort_unstable();
  assert_eq!(pairs, vec![(0, "a"), (1, "b"), (2, "c")]);
}

#[tokio::test]
async fn test_for_each_n_counts_from_zero() {
  setup_tracing_for_test();
  let sum = Arc::new(AtomicUsize::new(0));

  let started_at = Instant::now();
  {
    let sum = sum.clone();
    for_each_n(5, move |i| {
      let sum = sum.clone();
      async move {
        sleep(Duration::from_millis(100)).await;
        sum.fetch_add(i * 2, Ordering::SeqCst);
      }
    })
    .await
    .unwrap();
  }

  assert_ran_concurrently(started_at.elapsed());
  assert_eq!(sum.load(Ordering::SeqCst), 2 + 4 + 6 + 8);
}

#[tokio::test]
async fn test_for_each_n_zero_is_noop() {
  setup_tracing_for_test();
  let calls = Arc::new(AtomicUsize::new(0));
  {
    let calls = calls.clone();
    for_each_n(0, move |_| {
      calls.fetch_add(1, Ordering::SeqCst);
      async {}
    })
    .await
    .unwrap();
  }
  assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_range_visits_half_open_interval() {
  setup_tracing_for_test();
  let out = Arc::new(Mutex::new(Vec::new()));

  let started_at = Instant::now();
  {
    let out = out.clone();
    range(0, 5, move |i| {
      let out = out.clone();
      async move {
        sleep(Duration::from_millis(100)).await;
        out.lock().push(i);
      }
    })
    .await
    .unwrap();
  }

  assert_ran_concurrently(started_at.elapsed());
  let seen: HashSet<i64> = out.lock().iter().copied().collect();
  assert_eq!(seen, HashSet::from([0, 1, 2, 3, 4]));
  assert_eq!(out.lock().len(), 5);
}

#[tokio::test]
async fn test_range_with_step() {
  setup_tracing_for_test();
  let out = Arc::new(Mutex::new(Vec::new()));

  let started_at = Instant::now();
  {
    let out = out.clone();
    range_with_step(0, 10, 2, move |i| {
      let out = out.clone();
      async move {
        sleep(Duration::from_millis(100)).await;
        out.lock().push(i);
      }
    })
    .await
    .unwrap();
  }

  assert_ran_concurrently(started_at.elapsed());
  let mut seen = out.lock().clone();
  seen.sort_unstable();
  assert_eq!(seen, vec![0, 2, 4, 6, 8]);
}

#[tokio::test]
async fn test_range_with_negative_and_zero_step() {
  setup_tracing_for_test();
  let total = Arc::new(AtomicI64::new(0));
  let calls = Arc::new(AtomicUsize::new(0));

  {
    let total = total.clone();
    let calls = calls.clone();
    range_with_step(5, -5, -3, move |i| {
      total.fetch_add(i, Ordering::SeqCst);
      calls.fetch_add(1, Ordering::SeqCst);
      async {}
    })
    .await
    .unwrap();
  }
  // 5, 2, -1, -4
  assert_eq!(calls.load(Ordering::SeqCst), 4);
  assert_eq!(total.load(Ordering::SeqCst), 2);

  {
    let calls = calls.clone();
    range_with_step(0, 10, 0, move |_| {
      calls.fetch_add(1, Ordering::SeqCst);
      async {}
    })
    .await
    .unwrap();
  }
  assert_eq!(calls.load(Ordering::SeqCst), 4, "A zero step should not iterate");
}

#[tokio::test]
async fn test_batch_splits_into_chunks() {
  setup_tracing_for_test();
  let batches = Arc::new(Mutex::new(Vec::new()));

  let started_at = Instant::now();
  {
    let batches = batches.clone();
    batch((1..=10).collect::<Vec<i32>>(), 3, move |index, chunk| {
      let batches = batches.clone();
      async move {
        sleep(Duration::from_millis(100)).await;
        batches.lock().push((index, chunk));
      }
    })
    .await
    .unwrap();
  }

  assert_ran_concurrently(started_at.elapsed());
  let mut batches = batches.lock().clone();
  batches.sort_unstable();
  assert_eq!(
    batches,
    vec![
      (0, vec![1, 2, 3]),
      (1, vec![4, 5, 6]),
      (2, vec![7, 8, 9]),
      (3, vec![10]),
    ]
  );
}

#[tokio::test]
async fn test_batch_size_zero_is_noop() {
  setup_tracing_for_test();
  let calls = Arc::new(AtomicUsize::new(0));
  {
    let calls = calls.clone();
    batch(vec![1, 2, 3], 0, move |_, _| {
      calls.fetch_add(1, Ordering::SeqCst);
      async {}
    })
    .await
    .unwrap();
  }
  assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_panicking_callback_does_not_abandon_others() {
  setup_tracing_for_test();
  let finished = Arc::new(AtomicUsize::new(0));

  let result = {
    let finished = finished.clone();
    for_each_n(6, move |i| {
      let finished = finished.clone();
      async move {
        sleep(Duration::from_millis(20)).await;
        if i == 2 {
          panic!("Iteration {} intentionally panicked!", i);
        }
        finished.fetch_add(1, Ordering::SeqCst);
      }
    })
    .await
  };

  assert_eq!(result, Err(LoopError::CallbackPanicked { index: 2 }));
  assert_eq!(finished.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_batch_runs_every_batch_without_early_stop() {
  setup_tracing_for_test();
  let ran = Arc::new(Mutex::new(Vec::new()));

  {
    let ran = ran.clone();
    batch((0..9).collect::<Vec<i32>>(), 3, move |index, _| {
      let ran = ran.clone();
      async move {
        // Batch 0 finishes first and has nothing that could cancel the rest.
        if index > 0 {
          sleep(Duration::from_millis(30)).await;
        }
        ran.lock().push(index);
      }
    })
    .await
    .unwrap();
  }

  let mut ran = ran.lock().clone();
  ran.sort_unstable();
  assert_eq!(ran, vec![0, 1, 2]);
}
