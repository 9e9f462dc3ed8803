//! Concurrent fetch pipeline
//!
//! A [`Provider`] fans one resource type's fetch out over a set of gateways
//! and streams entities into a [`ResourceReader`]. A [`ResourceObserver`]
//! drives providers for a list of resource types and hands each reader to a
//! middleware chain ending in a terminal [`Handler`].

pub mod middleware;
pub mod observer;
pub mod provider;
pub mod reader;

pub use observer::{Handler, Middleware, MiddlewareFn, ResourceObserver, handler_fn};
pub use provider::{Provider, ProviderConfig};
pub use reader::{FetchFailure, FetchReport, ResourceReader};
