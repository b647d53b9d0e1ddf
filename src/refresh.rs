//! Background metadata refresh
//!
//! Refresh requests are fire-and-forget: callers enqueue and move on, a
//! single worker drains the high priority lane before the normal one.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::Result;

/// Queue lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPriority {
    High,
    Normal,
}

/// What a refresh should re-read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOptions {
    pub full_refresh: bool,
    pub replace_all_metadata: bool,
    pub replace_all_images: bool,
}

impl RefreshOptions {
    /// Full metadata refresh that keeps existing metadata and images.
    pub fn full() -> Self {
        Self {
            full_refresh: true,
            replace_all_metadata: false,
            replace_all_images: false,
        }
    }
}

/// Accepts refresh requests without waiting for them.
pub trait RefreshScheduler: Send + Sync {
    fn queue_refresh(&self, item_id: Uuid, options: RefreshOptions, priority: RefreshPriority);
}

/// Performs a refresh.
#[async_trait]
pub trait ItemRefresher: Send + Sync {
    async fn refresh_item(&self, item_id: Uuid, options: &RefreshOptions) -> Result<()>;
}

#[derive(Debug)]
struct RefreshJob {
    item_id: Uuid,
    options: RefreshOptions,
}

/// Bounded two-lane refresh queue.
pub struct RefreshQueue {
    high: mpsc::Sender<RefreshJob>,
    normal: mpsc::Sender<RefreshJob>,
}

impl RefreshQueue {
    /// Create the queue and spawn its worker. The worker exits when
    /// `shutdown` fires or every queue handle is dropped.
    pub fn start(
        capacity: usize,
        refresher: Arc<dyn ItemRefresher>,
        shutdown: CancellationToken,
    ) -> Self {
        let capacity = capacity.max(1);
        let (high, high_rx) = mpsc::channel(capacity);
        let (normal, normal_rx) = mpsc::channel(capacity);

        tokio::spawn(process_jobs(high_rx, normal_rx, refresher, shutdown));

        Self { high, normal }
    }
}

impl RefreshScheduler for RefreshQueue {
    fn queue_refresh(&self, item_id: Uuid, options: RefreshOptions, priority: RefreshPriority) {
        let lane = match priority {
            RefreshPriority::High => &self.high,
            RefreshPriority::Normal => &self.normal,
        };

        match lane.try_send(RefreshJob { item_id, options }) {
            Ok(()) => tracing::debug!(item_id = %item_id, ?priority, "Queued refresh"),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(item_id = %item_id, ?priority, "Refresh queue full; dropping request")
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(item_id = %item_id, "Refresh worker stopped; dropping request")
            }
        }
    }
}

async fn process_jobs(
    mut high: mpsc::Receiver<RefreshJob>,
    mut normal: mpsc::Receiver<RefreshJob>,
    refresher: Arc<dyn ItemRefresher>,
    shutdown: CancellationToken,
) {
    tracing::info!("Refresh worker started");

    loop {
        let job = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            Some(job) = high.recv() => job,
            Some(job) = normal.recv() => job,
            else => break,
        };

        match refresher.refresh_item(job.item_id, &job.options).await {
            Ok(()) => tracing::info!(item_id = %job.item_id, "Refresh succeeded"),
            Err(e) => tracing::error!(item_id = %job.item_id, error = %e, "Refresh failed"),
        }
    }

    tracing::info!("Refresh worker stopped");
}
