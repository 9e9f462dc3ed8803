//! Fan-out fetch of one resource type across gateways

use super::reader::{FetchFailure, FetchReport, ResourceReader};
use crate::gateway::Gateway;
use awsinv_common::defaults::{DEFAULT_STAGGER, DEFAULT_STREAM_CAPACITY};
use awsinv_common::metrics::{labels, names};
use awsinv_common::{Entity, ResourceType};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Tunables for a provider run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Entities the stream buffers before new ones are dropped
    pub capacity: usize,
    /// Delay between launching consecutive gateway fetches
    pub stagger: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_STREAM_CAPACITY,
            stagger: DEFAULT_STAGGER,
        }
    }
}

/// Fetches one resource type from a fixed set of gateways
///
/// Each [`Provider::run`] launches one fetch per gateway and returns a
/// [`ResourceReader`] immediately. The stream is bounded and never applies
/// backpressure: entities that do not fit are dropped and counted.
pub struct Provider<G> {
    resource_type: ResourceType,
    gateways: Vec<Arc<G>>,
    config: ProviderConfig,
    dropped: Arc<AtomicU64>,
}

impl<G: Gateway> Provider<G> {
    pub fn new(resource_type: ResourceType, gateways: Vec<Arc<G>>) -> Self {
        Self {
            resource_type,
            gateways,
            config: ProviderConfig::default(),
            dropped: Arc::default(),
        }
    }

    pub fn with_config(mut self, config: ProviderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    pub fn gateway_count(&self) -> usize {
        self.gateways.len()
    }

    /// Entities dropped on a full stream over every run of this provider.
    pub fn dropped_total(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Start a fetch and return its reader without waiting for any gateway.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run(&self) -> Arc<ResourceReader> {
        let resource_type = self.resource_type.clone();
        metrics::counter!(
            names::OBSERVER_EXECUTION,
            labels::RESOURCE_TYPE => resource_type.to_string()
        )
        .increment(1);

        let (tx, rx) = mpsc::channel(self.config.capacity.max(1));
        let report = Arc::new(FetchReport::default());
        let reader = Arc::new(ResourceReader::with_report(
            resource_type.clone(),
            rx,
            Arc::clone(&report),
        ));

        let gateways = self.gateways.clone();
        let stagger = self.config.stagger;
        let dropped = Arc::clone(&self.dropped);

        tokio::spawn(async move {
            let mut tasks = JoinSet::new();

            for (index, gateway) in gateways.into_iter().enumerate() {
                if index > 0 && !stagger.is_zero() {
                    tokio::time::sleep(stagger).await;
                }

                let tx = tx.clone();
                let resource_type = resource_type.clone();
                let report = Arc::clone(&report);
                let dropped = Arc::clone(&dropped);

                tasks.spawn(async move {
                    let fetched = AssertUnwindSafe(gateway.find_all(&resource_type))
                        .catch_unwind()
                        .await;

                    let failure = match fetched {
                        Ok(Ok(items)) => {
                            debug!(
                                resource_type = %resource_type,
                                account_id = %gateway.account_id(),
                                region = %gateway.region(),
                                count = items.len(),
                                "Fetched resources"
                            );
                            flush(&tx, items, &resource_type, &dropped, &report);
                            return;
                        }
                        Ok(Err(e)) => e.to_string(),
                        Err(_) => "fetch task panicked".to_string(),
                    };

                    error!(
                        resource_type = %resource_type,
                        account_id = %gateway.account_id(),
                        region = %gateway.region(),
                        error = %failure,
                        "Failed to fetch resources"
                    );
                    metrics::counter!(
                        names::FETCH_FAILURE,
                        labels::RESOURCE_TYPE => resource_type.to_string(),
                        labels::ACCOUNT_ID => gateway.account_id().to_string(),
                        labels::REGION => gateway.region().to_string()
                    )
                    .increment(1);
                    report.record_failure(FetchFailure {
                        account_id: gateway.account_id().clone(),
                        region: gateway.region().clone(),
                        error: failure,
                    });
                });
            }

            // The stream closes once the last sub-task releases its sender
            drop(tx);

            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    error!(resource_type = %resource_type, error = %e, "Fetch task aborted");
                }
            }
        });

        reader
    }
}

/// Offer every entity to the stream without waiting for room.
///
/// Returns the number accepted.
pub(crate) fn flush(
    tx: &mpsc::Sender<Entity>,
    items: Vec<Entity>,
    resource_type: &ResourceType,
    dropped: &AtomicU64,
    report: &FetchReport,
) -> usize {
    let offered = items.len();
    let mut accepted = 0;

    for item in items {
        match tx.try_send(item) {
            Ok(()) => accepted += 1,
            Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Closed(_)) => break,
        }
    }

    let lost = (offered - accepted) as u64;
    if lost > 0 {
        dropped.fetch_add(lost, Ordering::Relaxed);
        report.record_drops(lost);
        metrics::counter!(
            names::QUEUE_FULL,
            labels::RESOURCE_TYPE => resource_type.to_string()
        )
        .increment(lost);
        warn!(
            resource_type = %resource_type,
            dropped = lost,
            capacity = tx.max_capacity(),
            "Resource stream full, dropping entities"
        );
    }

    accepted
}
