use futures_fanout::batch;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false)
    .init();

  info!("--- Batch Requests Example (Batch size: 4) ---");

  let user_ids: Vec<u32> = (1000..1010).collect();
  let result = batch(user_ids, 4, |index, ids| async move {
    info!("Request {}: looking up {} users {:?}", index, ids.len(), ids);
    tokio::time::sleep(Duration::from_millis(100)).await;
    info!("Request {} done.", index);
  })
  .await;

  if let Err(e) = result {
    tracing::error!("Batch iteration failed: {}", e);
  }
  info!("--- Batch Requests Example End ---");
}
