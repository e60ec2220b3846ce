//! Refresh loop: fetch, normalize, persist, repeat
//!
//! One pass runs at a time; the next is scheduled only after the previous
//! finishes. Before the server starts, the pass is retried on a short fixed
//! delay so the server never serves without a snapshot. Afterwards it
//! repeats on the refresh interval in the background, and failures leave
//! the previous snapshot authoritative.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{error, info};

use crate::catalog::NormalizerOptions;
use crate::error::Result;
use crate::portal::PortalClient;
use crate::snapshot;

/// Delay between attempts before the first successful pass
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Interval between background refresh passes
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Everything one refresh pass needs
#[derive(Clone)]
pub struct Refresher {
    client: Arc<PortalClient>,
    assets_dir: PathBuf,
    options: NormalizerOptions,
}

impl Refresher {
    pub fn new(client: PortalClient, assets_dir: PathBuf, options: NormalizerOptions) -> Self {
        Self {
            client: Arc::new(client),
            assets_dir,
            options,
        }
    }

    /// Run a single fetch, normalize, write pass.
    pub async fn run_once(&self) -> Result<()> {
        let catalog = self.client.fetch_catalog(self.options).await?;
        snapshot::write_snapshot(&self.assets_dir, &catalog).await
    }

    /// Retry [`Self::run_once`] on a fixed delay until it succeeds.
    pub async fn run_until_success(&self) {
        loop {
            info!("generating {}...", snapshot::SNAPSHOT_FILE);
            match self.run_once().await {
                Ok(()) => {
                    info!("generated {}", snapshot::SNAPSHOT_FILE);
                    return;
                }
                Err(e) => {
                    error!(
                        "error while generating {}: {e}; trying again in {:?}",
                        snapshot::SNAPSHOT_FILE,
                        RETRY_DELAY
                    );
                    time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }
}

/// Handle to the running background refresh task.
///
/// Retry and periodic timers live behind this handle so the background
/// cadence can be stopped independently of the HTTP server.
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Signal the task to stop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// Spawn the periodic background refresh.
pub fn spawn_periodic(refresher: Refresher, interval: Duration) -> RefreshHandle {
    let (shutdown, mut stopped) = watch::channel(false);
    let task = tokio::spawn(async move {
        info!("background refresh task started ({:?} interval)", interval);
        loop {
            tokio::select! {
                _ = time::sleep(interval) => {}
                _ = stopped.changed() => {
                    info!("background refresh task stopping");
                    return;
                }
            }
            match refresher.run_once().await {
                Ok(()) => info!("snapshot refreshed"),
                // The previous snapshot stays authoritative until the next
                // successful pass.
                Err(e) => error!("background refresh failed: {e}"),
            }
        }
    });
    RefreshHandle { shutdown, task }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_periodic_task_stops_on_shutdown() {
        let refresher = Refresher::new(
            PortalClient::with_url("http://127.0.0.1:9/unreachable").unwrap(),
            std::env::temp_dir(),
            NormalizerOptions::default(),
        );

        let handle = spawn_periodic(refresher, Duration::from_secs(3600));
        // The first tick is an hour out; shutdown must not wait for it.
        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .expect("shutdown should complete promptly");
    }
}
