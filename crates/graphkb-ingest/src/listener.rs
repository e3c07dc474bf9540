//! Event bus carrying source updates to the graph updater

use crate::updater::GraphUpdater;
use graphkb_core::{GraphUpdatesBulk, SchemaGraph};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Everything a source publishes in one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSubGraphUpdates {
    pub source: String,
    pub updates: GraphUpdatesBulk,
    pub schema: SchemaGraph,
}

#[derive(Debug, Error)]
#[error("event bus closed, update of source {0} dropped")]
pub struct BusClosed(pub String);

/// Publishing half of the ingestion channel. Cloning it adds a producer.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: mpsc::Sender<SourceSubGraphUpdates>,
}

impl EventBus {
    /// Bounded FIFO channel. Publishers wait once `capacity` updates are queued.
    pub fn channel(capacity: usize) -> (EventBus, mpsc::Receiver<SourceSubGraphUpdates>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (EventBus { sender }, receiver)
    }

    pub async fn publish(&self, update: SourceSubGraphUpdates) -> Result<(), BusClosed> {
        let source = update.source.clone();
        debug!("Publishing {} updates from {}", update.updates.len(), source);
        self.sender.send(update).await.map_err(|_| BusClosed(source))
    }
}

impl GraphUpdater {
    /// Apply updates in arrival order until every publisher is dropped and the
    /// queue is drained. Failed updates are logged and skipped. The task
    /// yields the number of updates applied successfully.
    pub fn listen(self: Arc<Self>, mut receiver: mpsc::Receiver<SourceSubGraphUpdates>) -> JoinHandle<usize> {
        tokio::spawn(async move {
            info!("Graph updater listening");
            let mut applied = 0;
            while let Some(update) = receiver.recv().await {
                match self.apply(&update).await {
                    Ok(()) => applied += 1,
                    Err(e) => error!("Failed to apply updates of {}: {}", update.source, e),
                }
            }
            info!("Graph updater stopped after {} updates", applied);
            applied
        })
    }
}
