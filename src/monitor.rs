// src/monitor.rs
use crate::config::{BANNED_SUFFIX, CHECK_INTERVAL, ERROR_BACKOFF, REQUIRED_SUFFIX};
use crate::error::StoreError;
use crate::fetcher::TokenSource;
use crate::notifier::Notifier;
use crate::store::PersistentSet;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// What a single tick decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Fetcher had nothing this tick
    Idle,
    AlreadySeen(String),
    MissingSuffix(String),
    BannedSuffix(String),
    Alerted(String),
    /// Delivery failed; the address stays unseen so a later tick retries it
    DeliveryFailed(String),
}

/// Polls the token source and alerts on first sight of qualifying addresses
pub struct Monitor<S, N> {
    source: S,
    notifier: N,
    seen: PersistentSet,
    required_suffix: String,
    banned_suffix: String,
    interval: Duration,
    backoff: Duration,
}

impl<S: TokenSource, N: Notifier> Monitor<S, N> {
    pub fn new(source: S, notifier: N, seen: PersistentSet) -> Self {
        Self {
            source,
            notifier,
            seen,
            required_suffix: REQUIRED_SUFFIX.to_string(),
            banned_suffix: BANNED_SUFFIX.to_string(),
            interval: CHECK_INTERVAL,
            backoff: ERROR_BACKOFF,
        }
    }

    /// Override the pause lengths (tests use millisecond intervals)
    pub fn with_intervals(mut self, interval: Duration, backoff: Duration) -> Self {
        self.interval = interval;
        self.backoff = backoff;
        self
    }

    pub fn with_suffixes(mut self, required: impl Into<String>, banned: impl Into<String>) -> Self {
        self.required_suffix = required.into();
        self.banned_suffix = banned.into();
        self
    }

    pub fn seen(&self) -> &PersistentSet {
        &self.seen
    }

    /// One fetch, filter and dispatch pass. Checks short-circuit in order.
    pub async fn tick(&mut self) -> Result<TickOutcome, StoreError> {
        let Some(token) = self.source.fetch().await else {
            return Ok(TickOutcome::Idle);
        };
        let address = token.address.clone();

        if self.seen.contains(&address) {
            info!("Skipping already processed address: {}", address);
            return Ok(TickOutcome::AlreadySeen(address));
        }

        if !address.ends_with(&self.required_suffix) {
            info!("Skipping non-{} token: {}", self.required_suffix, address);
            self.seen.insert(address.clone())?;
            return Ok(TickOutcome::MissingSuffix(address));
        }

        if address.ends_with(&self.banned_suffix) {
            info!("Skipping {} token: {}", self.banned_suffix, address);
            self.seen.insert(address.clone())?;
            return Ok(TickOutcome::BannedSuffix(address));
        }

        match self.notifier.send_alert(&token).await {
            Ok(()) => {
                self.seen.insert(address.clone())?;
                info!(address = %address, "New pump alert sent for {}", token.symbol);
                Ok(TickOutcome::Alerted(address))
            }
            Err(e) => {
                warn!(address = %address, "Alert delivery failed, will retry: {}", e);
                Ok(TickOutcome::DeliveryFailed(address))
            }
        }
    }

    /// Tick until `shutdown` flips to true. In-flight work is dropped on shutdown.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Monitor started (interval {:?}, {} addresses already seen)",
            self.interval,
            self.seen.len()
        );

        while !*shutdown.borrow() {
            // a panicking tick is treated like any other unexpected error
            let pause = tokio::select! {
                res = AssertUnwindSafe(self.tick()).catch_unwind() => match res {
                    Ok(Ok(_)) => self.interval,
                    Ok(Err(e)) => {
                        error!("Monitoring loop error: {}", e);
                        self.backoff
                    }
                    Err(panic) => {
                        error!("Monitoring loop error: tick panicked: {}", panic_message(&*panic));
                        self.backoff
                    }
                },
                _ = shutdown.changed() => break,
            };

            tokio::select! {
                _ = sleep(pause) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("Monitor stopped");
    }

    /// Persist the seen set one last time
    pub fn flush(&self) -> Result<(), StoreError> {
        self.seen.flush()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

/// Spawns the monitor at most once
#[derive(Debug, Default)]
pub struct MonitorSupervisor {
    started: AtomicBool,
}

impl MonitorSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Spawn the loop; the task hands the monitor back when it stops.
    /// Returns `None` if a monitor was already spawned.
    pub fn start<S, N>(
        &self,
        mut monitor: Monitor<S, N>,
        shutdown: watch::Receiver<bool>,
    ) -> Option<JoinHandle<Monitor<S, N>>>
    where
        S: TokenSource + 'static,
        N: Notifier + 'static,
    {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Monitor already running, not spawning another");
            return None;
        }

        Some(tokio::spawn(async move {
            monitor.run(shutdown).await;
            monitor
        }))
    }
}
