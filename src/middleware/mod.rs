//! # Middleware Module
//!
//! A middleware turns one [`Handler`](crate::dispatcher::Handler) into another.
//! [`WebApi`](crate::WebApi) composes the global list followed by the route's own
//! list around each resource handler with [`compose`], so the last middleware in
//! that combined list is the outermost wrapper.
//!
//! Built-in middleware:
//! - [`TracingMiddleware`] - request span with status and latency
//! - [`MetricsMiddleware`] - request count, latency and error counters
//! - [`AuthMiddleware`] - static `Authorization` token check
//! - [`StatusOverride`] - forces the reply status

mod auth;
mod core;
mod metrics;
mod status;
mod tracing;

pub use auth::AuthMiddleware;
pub use self::core::{apply, compose, handlers, next, Middleware};
pub use metrics::MetricsMiddleware;
pub use status::StatusOverride;
pub use self::tracing::TracingMiddleware;
