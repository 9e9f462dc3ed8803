//! Entity-level logging middleware

use crate::resources::observer::{Handler, Middleware};
use crate::resources::reader::ResourceReader;
use futures::FutureExt;
use std::sync::Arc;
use tracing::{info, trace};

/// Logs each entity and a per-type count before delegating
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggerMiddleware;

impl Middleware for LoggerMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        Arc::new(move |reader: Arc<ResourceReader>| {
            let next = Arc::clone(&next);
            async move {
                let items = reader.read().await;
                for entity in &items {
                    trace!(
                        resource_type = %entity.resource_type,
                        account_id = %entity.account_id,
                        region = %entity.region,
                        id = %entity.id,
                        arn = entity.arn.as_deref().unwrap_or_default(),
                        tags = ?entity.tags,
                        "Resource"
                    );
                }
                info!(
                    resource_type = %reader.resource_type(),
                    count = items.len(),
                    degraded = reader.report().is_degraded(),
                    "Resources loaded"
                );
                next(reader).await
            }
            .boxed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::handler_fn;
    use awsinv_common::ResourceType;
    use awsinv_test_utils::entities;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn passes_reader_through_unchanged() {
        let (tx, rx) = mpsc::channel(8);
        for e in entities("1", "eu-west-1", ResourceType::EC2_VPC, "v", 3) {
            tx.send(e).await.unwrap();
        }
        drop(tx);
        let reader = Arc::new(ResourceReader::new(ResourceType::EC2_VPC, rx));

        let terminal = handler_fn(|reader| async move {
            assert_eq!(reader.read().await.len(), 3);
            Ok(())
        });
        LoggerMiddleware.wrap(terminal)(reader).await.unwrap();
    }
}
