//! Background refresh of the configuration summary and gateway list
//!
//! Runs only while authenticated: one immediate fetch, then a fixed
//! interval. The task is torn down deterministically through a
//! cancellation token when authentication ends, so no timer outlives the
//! authenticated view. It shares no mutable state with the search engine;
//! each cycle delivers a complete snapshot over the channel.

use crate::api::types::{ConfigSnapshot, Gateway};
use crate::api::{ApiClient, ApiError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One complete refresh cycle's worth of data.
#[derive(Debug, Clone)]
pub struct RefreshSnapshot {
    pub config: ConfigSnapshot,
    pub gateways: Vec<Gateway>,
}

/// Outcome of a refresh cycle, delivered to the console loop.
#[derive(Debug)]
pub enum PollerEvent {
    Snapshot(Box<RefreshSnapshot>),
    /// Non-fatal failure; shown as a scoped banner, the view stays up.
    Failed(String),
}

/// Background service refreshing the domain summary.
pub struct Poller {
    client: Arc<ApiClient>,
    interval: Duration,
    tx: mpsc::Sender<PollerEvent>,
}

impl Poller {
    pub fn new(client: Arc<ApiClient>, interval: Duration, tx: mpsc::Sender<PollerEvent>) -> Self {
        Self {
            client,
            interval,
            tx,
        }
    }

    /// Start the refresh task. The first tick fires immediately; the task
    /// stops on cancellation or when the session expires mid-cycle.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_seconds = self.interval.as_secs(),
                "refresh poller started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("refresh poller shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        if !self.refresh_once().await {
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Run one cycle. Returns false when the task should stop (session
    /// expired or nobody is listening anymore).
    async fn refresh_once(&self) -> bool {
        let result = self.fetch_snapshot().await;
        match result {
            Ok(snapshot) => self
                .tx
                .send(PollerEvent::Snapshot(Box::new(snapshot)))
                .await
                .is_ok(),
            Err(e) if e.is_session_expired() => {
                // The gateway already cleared the session; the console's
                // session watch drives the return to the login view.
                tracing::info!("refresh poller stopping: session expired");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "refresh cycle failed");
                self.tx.send(PollerEvent::Failed(e.to_string())).await.is_ok()
            }
        }
    }

    async fn fetch_snapshot(&self) -> Result<RefreshSnapshot, ApiError> {
        let config = self.client.fetch_config_summary().await?;
        let gateways = self.client.fetch_gateways().await?;
        Ok(RefreshSnapshot { config, gateways })
    }
}
