//! # Dispatcher Module
//!
//! Ties the router, the resource capability tables and the middleware chain
//! together.
//!
//! ## Request Flow
//!
//! 1. The router matches the path against the patterns in registration order.
//!    No match answers 404 and nothing else runs.
//! 2. The matched resource's capability table is consulted for the method.
//!    GET, POST, PUT and DELETE are the only methods that can resolve. A miss
//!    answers 405 and no middleware or handler runs.
//! 3. A [`RequestContext`](crate::server::RequestContext) is built with the path
//!    parameters and the handler (already wrapped in its middleware chain) is
//!    invoked.
//! 4. The reply envelope is encoded as JSON. An encoding failure answers a bare
//!    500.
//!
//! ## Error Handling
//!
//! - Missing routes return 404 responses
//! - Unsupported methods return 405 responses
//! - Handler panics are caught and return 500 responses

mod core;

pub use self::core::{handler_fn, DispatchError, Endpoint, Handler, Reply, WebApi};
