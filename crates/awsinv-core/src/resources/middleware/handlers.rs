use crate::resources::observer::{Handler, handler_fn};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Terminal handler that logs a per-account count for each resource type.
pub fn summary_handler() -> Handler {
    handler_fn(|reader| async move {
        let items = reader.read().await;
        let mut per_account: BTreeMap<String, usize> = BTreeMap::new();
        for entity in &items {
            *per_account.entry(entity.account_id.to_string()).or_default() += 1;
        }

        let report = reader.report();
        for failure in report.failures() {
            warn!(
                resource_type = %reader.resource_type(),
                account_id = %failure.account_id,
                region = %failure.region,
                error = %failure.error,
                "Missing resources from failed fetch"
            );
        }

        info!(
            resource_type = %reader.resource_type(),
            total = items.len(),
            accounts = ?per_account,
            dropped = report.dropped(),
            degraded = report.is_degraded(),
            "Resource summary"
        );
        Ok(())
    })
}

/// Terminal handler that logs each entity's id and name.
pub fn logger_handler() -> Handler {
    handler_fn(|reader| async move {
        for entity in reader.read().await {
            info!(
                resource_type = %reader.resource_type(),
                account_id = %entity.account_id,
                id = %entity.id,
                name = %entity.name,
                "Resource"
            );
        }
        Ok(())
    })
}

/// Terminal handler that waits for the read, pauses, then signals `done`.
///
/// A closed `done` channel is not an error.
pub fn wait_handler(pause: Duration, done: mpsc::Sender<()>) -> Handler {
    handler_fn(move |reader| {
        let done = done.clone();
        async move {
            reader.read().await;
            tokio::time::sleep(pause).await;
            let _ = done.send(()).await;
            Ok(())
        }
    })
}

/// Terminal handler that does nothing.
pub fn null_handler() -> Handler {
    handler_fn(|_| async { Ok(()) })
}
