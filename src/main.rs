use std::sync::Arc;
use eyre::eyre;
use pump_alert_bot::{
    api::{self, AppState},
    commands::CommandHandler,
    config,
    fetcher::TokenFetcher,
    holders::HolderClient,
    monitor::{Monitor, MonitorSupervisor},
    notifier::DiscordNotifier,
    store::PersistentSet,
};
use tokio::{signal, sync::watch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();

    info!("Pump alert bot starting...");

    let cfg = config::load()?;

    // Durable state
    let seen = PersistentSet::open(&cfg.seen_addresses_path);
    let subscribers = PersistentSet::open(&cfg.subscribed_users_path);
    info!("  Seen addresses: {} ({})", seen.len(), cfg.seen_addresses_path);
    info!("  Subscribers: {} ({})", subscribers.len(), cfg.subscribed_users_path);

    // Collaborators, built once and handed down
    let fetcher = TokenFetcher::from_config(&cfg)?;
    let notifier = DiscordNotifier::from_config(&cfg)?;
    let commands = CommandHandler::new(subscribers);
    let holders = match &cfg.holder_api_base_url {
        Some(url) => Some(Arc::new(HolderClient::new(url.clone())?)),
        None => None,
    };

    // Phase one: the chat connection must work before polling starts
    notifier.connect().await?;

    // Phase two: supervised polling loop
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let supervisor = MonitorSupervisor::new();
    let mut monitor_handle = supervisor
        .start(Monitor::new(fetcher, notifier, seen), shutdown_rx)
        .ok_or_else(|| eyre!("monitor was already started"))?;

    let api_handle = tokio::spawn({
        let cfg = cfg.clone();
        let state = AppState {
            commands: commands.clone(),
            holders,
        };
        async move { api::serve(cfg, state).await }
    });

    let mut monitor_done = None;
    tokio::select! {
        res = api_handle => match res {
            Ok(Ok(_)) => info!("API exited cleanly"),
            Ok(Err(e)) => error!("API error: {:?}", e),
            Err(e) => error!("API task panicked: {:?}", e),
        },
        res = &mut monitor_handle => {
            warn!("Monitor exited unexpectedly");
            monitor_done = Some(res);
        },
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, stopping...");
        }
    }

    let _ = shutdown_tx.send(true);
    let monitor = match monitor_done {
        Some(res) => res,
        None => monitor_handle.await,
    };

    // Final flush of both sets
    match monitor {
        Ok(monitor) => {
            if let Err(e) = monitor.flush() {
                error!("Failed to persist seen addresses: {}", e);
            }
        }
        Err(e) => error!("Monitor task panicked: {:?}", e),
    }
    if let Err(e) = commands.flush().await {
        error!("Failed to persist subscribers: {}", e);
    }

    info!("Pump alert bot stopped.");
    Ok(())
}
