//! Projection processor for feeding committed changes to projections.

use std::sync::Arc;

use entity_store::{ChangeEnvelope, EntityStore};
use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};

/// Processes changes from an entity store and delivers them to projections.
///
/// The processor supports:
/// - Catch-up: replays the change log past the lowest projection position
/// - Single change delivery: delivers one change to every projection
/// - Rebuild: resets all projections and replays from scratch
/// - Live delivery: follows the store's subscription in a background task
///
/// Deliveries are serialized, and a projection never sees a change its
/// position already covers. A projection that fails on a change is logged
/// and counted, and delivery moves on to the next change. Catch-up and
/// live delivery share this policy.
pub struct ProjectionProcessor<S: EntityStore> {
    store: S,
    projections: Vec<Box<dyn Projection>>,
    delivery: Mutex<()>,
}

impl<S: EntityStore> ProjectionProcessor<S> {
    /// Creates a new processor with the given entity store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
            delivery: Mutex::new(()),
        }
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Runs catch-up processing: reads every change past the lowest
    /// projection position and delivers it to each projection that hasn't
    /// already applied it.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<()> {
        let _delivery = self.delivery.lock().await;
        self.catch_up().await
    }

    /// Delivers a single change to all registered projections.
    #[tracing::instrument(skip(self, change), fields(key = %change.key, sequence = change.sequence))]
    pub async fn process_change(&self, change: &ChangeEnvelope) -> Result<()> {
        let _delivery = self.delivery.lock().await;
        self.deliver(change).await
    }

    /// Resets all projections and replays all changes from the store.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<()> {
        let _delivery = self.delivery.lock().await;
        for projection in &self.projections {
            projection.reset().await?;
        }
        self.catch_up().await
    }

    async fn catch_up(&self) -> Result<()> {
        let mut from = u64::MAX;
        for projection in &self.projections {
            from = from.min(projection.position().await.last_sequence);
        }
        if from == u64::MAX {
            return Ok(());
        }

        let changes = self.store.changes_after(from).await?;
        for change in &changes {
            self.deliver(change).await?;
        }

        tracing::info!(
            from_sequence = from,
            changes_read = changes.len(),
            "catch-up complete"
        );

        Ok(())
    }

    async fn deliver(&self, change: &ChangeEnvelope) -> Result<()> {
        for projection in &self.projections {
            let pos: ProjectionPosition = projection.position().await;
            if pos.covers(change.sequence) {
                continue;
            }
            match projection.handle(change).await {
                Ok(()) => {
                    metrics::counter!(
                        "projections_changes_processed",
                        "projection" => projection.name()
                    )
                    .increment(1);
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        projection = projection.name(),
                        key = %change.key,
                        sequence = change.sequence,
                        "projection failed to apply change, skipping"
                    );
                    metrics::counter!(
                        "projections_changes_skipped",
                        "projection" => projection.name()
                    )
                    .increment(1);
                }
            }
        }
        Ok(())
    }
}

impl<S: EntityStore + 'static> ProjectionProcessor<S> {
    /// Starts following the store in a background task.
    ///
    /// The subscription is taken before the initial catch-up, so no commit
    /// falls between the two. If the subscription lags behind, the task
    /// catches up from the change log and continues. The task runs until
    /// the store's subscription closes or the handle is aborted.
    pub fn spawn_live(self: Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.store.subscribe();

        tokio::spawn(async move {
            if let Err(e) = self.run_catch_up().await {
                tracing::error!(error = %e, "initial catch-up failed");
            }

            loop {
                match changes.recv().await {
                    Ok(change) => {
                        if let Err(e) = self.process_change(&change).await {
                            tracing::error!(
                                error = %e,
                                key = %change.key,
                                sequence = change.sequence,
                                "failed to apply change"
                            );
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscription lagged, catching up");
                        if let Err(e) = self.run_catch_up().await {
                            tracing::error!(error = %e, "catch-up after lag failed");
                        }
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("change subscription closed");
                        break;
                    }
                }
            }
        })
    }
}
