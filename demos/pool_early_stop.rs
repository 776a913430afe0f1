use futures_fanout::BoundedPool;
use std::time::{Duration, Instant};
use tracing::info;

async fn fetch_page(page: usize, url: String) -> bool {
  info!("Fetching page {} ({})", page, url);
  tokio::time::sleep(Duration::from_millis(200)).await;
  // Pretend the listing ends after page 4.
  let has_more = page < 4;
  info!("Page {} fetched. More pages: {}", page, has_more);
  has_more
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false)
    .init();

  info!("--- Bounded Pool Early Stop Example (Workers: 2) ---");

  let urls: Vec<String> = (0..10).map(|page| format!("https://example.com/items?page={}", page)).collect();
  let pool = BoundedPool::new(2).expect("Two workers is a valid pool size").with_name("page_fetcher");

  let started_at = Instant::now();
  match pool.run(urls, fetch_page).await {
    Ok(report) => info!(
      "Fetched {} pages, skipped {} (stopped early: {}) in {:?}",
      report.executed,
      report.skipped,
      report.cancelled,
      started_at.elapsed()
    ),
    Err(e) => tracing::error!("Pool run failed: {}", e),
  }

  info!("--- Bounded Pool Early Stop Example End ---");
}
