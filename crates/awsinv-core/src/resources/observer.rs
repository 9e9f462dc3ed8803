//! Resource-type driver with a composable handler chain

use super::provider::{Provider, ProviderConfig};
use super::reader::ResourceReader;
use crate::gateway::{Gateway, GatewayPool};
use anyhow::Context;
use awsinv_common::ResourceType;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Asynchronous consumer of a resource reader
pub type Handler =
    Arc<dyn Fn(Arc<ResourceReader>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Wrap an async closure as a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Arc<ResourceReader>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |reader| f(reader).boxed())
}

/// Decorates the next handler in the chain
///
/// A middleware may act before or after delegating to `next`, or skip it.
/// An error from any link aborts the rest of the chain.
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: Handler) -> Handler;
}

/// Middleware built from a closure over the next handler
pub struct MiddlewareFn<F>(pub F);

impl<F> Middleware for MiddlewareFn<F>
where
    F: Fn(Handler) -> Handler + Send + Sync,
{
    fn wrap(&self, next: Handler) -> Handler {
        (self.0)(next)
    }
}

/// Runs one provider per resource type through a middleware chain
///
/// Resource types are served in order. Providers are created on first use
/// and reused on later calls to [`ResourceObserver::serve`].
pub struct ResourceObserver<G> {
    pool: GatewayPool<G>,
    terminal: Handler,
    middlewares: Vec<Arc<dyn Middleware>>,
    providers: HashMap<ResourceType, Provider<G>>,
    config: ProviderConfig,
}

impl<G: Gateway> ResourceObserver<G> {
    pub fn new(pool: GatewayPool<G>, terminal: Handler) -> Self {
        Self {
            pool,
            terminal,
            middlewares: Vec::new(),
            providers: HashMap::new(),
            config: ProviderConfig::default(),
        }
    }

    /// Applies to providers created after this call.
    pub fn with_provider_config(mut self, config: ProviderConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a middleware; the first registered runs outermost.
    pub fn use_middleware(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn has_provider(&self, resource_type: &ResourceType) -> bool {
        self.providers.contains_key(resource_type)
    }

    pub fn provider(&self, resource_type: &ResourceType) -> Option<&Provider<G>> {
        self.providers.get(resource_type)
    }

    fn chain(&self) -> Handler {
        self.middlewares
            .iter()
            .rev()
            .fold(Arc::clone(&self.terminal), |next, middleware| {
                middleware.wrap(next)
            })
    }

    /// Serve each resource type in turn, stopping at the first chain error.
    pub async fn serve(&mut self, resource_types: &[ResourceType]) -> anyhow::Result<()> {
        let handler = self.chain();

        for resource_type in resource_types {
            let provider = self.providers.entry(resource_type.clone()).or_insert_with(|| {
                let gateways = self.pool.list(resource_type);
                debug!(
                    resource_type = %resource_type,
                    gateways = gateways.len(),
                    "Creating provider"
                );
                Provider::new(resource_type.clone(), gateways).with_config(self.config.clone())
            });

            info!(resource_type = %resource_type, "Observing resources");
            let reader = provider.run();

            handler(reader)
                .await
                .with_context(|| format!("Handler chain failed for {resource_type}"))?;
        }

        Ok(())
    }
}
