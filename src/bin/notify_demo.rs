//! Sends a sample digest through the configured notifier (SMTP smoke test).

use chrono::Utc;
use listing_watch::config::AppConfig;
use listing_watch::{notify, Digest, Listing};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    listing_watch::init_tracing();

    let cfg = AppConfig::from_env();
    let notifier = notify::from_config(&cfg)?;

    let digest = Digest::new(
        vec![
            Listing::new("demo-1", "Coin Laundromat - Broward", "https://example.com/listing/demo-1", "Demo (Broward)"),
            Listing::new("demo-2", "Established Dry Cleaner", "https://example.com/listing/demo-2", "Demo (Palm Beach)"),
        ],
        vec!["laundromat".into(), "dry clean".into()],
        vec!["Demo".into()],
        Utc::now(),
    );

    notifier.send(&digest).await?;
    println!("notify-demo done via {}", notifier.name());
    Ok(())
}
