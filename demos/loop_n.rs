use futures_fanout::for_each_n;
use tracing::info;

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::INFO)
    .with_target(false)
    .init();

  if let Err(e) = for_each_n(3, |i| async move {
    println!("{}", i);
  })
  .await
  {
    tracing::error!("Iteration failed: {}", e);
    return;
  }
  info!("All iterations finished.");
}
