//! Stock middlewares and terminal handlers

mod handlers;
mod logger;
mod pool;

pub use handlers::{logger_handler, null_handler, summary_handler, wait_handler};
pub use logger::LoggerMiddleware;
pub use pool::ResourcePoolMiddleware;
