use anyhow::{bail, Context};
use pump_alert_bot::holders::{HolderClient, DEFAULT_HOLDER_COUNT};
use std::env;

/// Usage: holders <token-address> [count]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = env::args().skip(1);
    let Some(token) = args.next() else {
        bail!("usage: holders <token-address> [count]");
    };
    let count = match args.next() {
        Some(n) => n.parse().context("count must be a positive integer")?,
        None => DEFAULT_HOLDER_COUNT,
    };

    let base_url = env::var("HOLDER_API_BASE_URL").context("HOLDER_API_BASE_URL is not set")?;
    let client = HolderClient::new(base_url)?;

    println!("Fetching top {} holders of {}...", count, token);
    match client.holders_with_winrates(&token, count).await {
        Some(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
        None => println!("No holders found for {}", token),
    }

    Ok(())
}
