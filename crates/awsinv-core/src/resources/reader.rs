//! Asynchronous collector for one provider run

use awsinv_common::{AccountId, Entity, Region, ResourceType};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, watch};
use tracing::trace;

/// A gateway fetch that contributed nothing to a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub account_id: AccountId,
    pub region: Region,
    pub error: String,
}

/// Failures and drops observed while producing one reader's entities
///
/// A run with no failures and no drops is complete; anything else means the
/// reader's result may be missing entities.
#[derive(Debug, Default)]
pub struct FetchReport {
    failures: Mutex<Vec<FetchFailure>>,
    dropped: AtomicU64,
}

impl FetchReport {
    pub fn failures(&self) -> Vec<FetchFailure> {
        self.failures.lock().clone()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn is_degraded(&self) -> bool {
        self.dropped() > 0 || !self.failures.lock().is_empty()
    }

    pub(crate) fn record_failure(&self, failure: FetchFailure) {
        self.failures.lock().push(failure);
    }

    pub(crate) fn record_drops(&self, count: u64) {
        self.dropped.fetch_add(count, Ordering::Relaxed);
    }
}

/// Drains a stream of entities into a replayable list
///
/// Draining starts at construction. [`ResourceReader::read`] waits for the
/// stream to close and returns a copy of everything received.
pub struct ResourceReader {
    resource_type: ResourceType,
    done: watch::Receiver<Option<Arc<Vec<Entity>>>>,
    report: Arc<FetchReport>,
}

impl ResourceReader {
    pub fn new(resource_type: ResourceType, stream: mpsc::Receiver<Entity>) -> Self {
        Self::with_report(resource_type, stream, Arc::default())
    }

    /// Reader sharing `report` with the producer side.
    pub fn with_report(
        resource_type: ResourceType,
        mut stream: mpsc::Receiver<Entity>,
        report: Arc<FetchReport>,
    ) -> Self {
        let (done_tx, done) = watch::channel(None);

        let drained_type = resource_type.clone();
        tokio::spawn(async move {
            let mut values = Vec::new();
            while let Some(entity) = stream.recv().await {
                values.push(entity);
            }
            trace!(resource_type = %drained_type, count = values.len(), "Stream closed");
            done_tx.send_replace(Some(Arc::new(values)));
        });

        Self {
            resource_type,
            done,
            report,
        }
    }

    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    pub fn report(&self) -> &FetchReport {
        &self.report
    }

    /// Whether the stream has closed and the result is final.
    pub fn is_complete(&self) -> bool {
        self.done.borrow().is_some()
    }

    /// Every entity received, once the stream has closed.
    ///
    /// Returns an empty list if the drain task died before completing.
    pub async fn read(&self) -> Vec<Entity> {
        let mut done = self.done.clone();
        let snapshot = match done.wait_for(Option::is_some).await {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        };
        snapshot.map(|items| items.to_vec()).unwrap_or_default()
    }
}

impl std::fmt::Debug for ResourceReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceReader")
            .field("resource_type", &self.resource_type)
            .field("complete", &self.is_complete())
            .finish_non_exhaustive()
    }
}
