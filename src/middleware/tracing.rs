use std::sync::Arc;
use std::time::Instant;

use tracing::{field, info, info_span};

use super::Middleware;
use crate::dispatcher::Handler;
use crate::server::RequestContext;

/// Opens a `request` span around the wrapped handler and records the status
/// and latency when it returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        Arc::new(move |ctx: &RequestContext| {
            let span = info_span!(
                "request",
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = %ctx.path(),
                status = field::Empty,
                latency_us = field::Empty,
            );
            let _guard = span.enter();
            let start = Instant::now();

            let reply = next(ctx);

            let latency = start.elapsed();
            span.record("status", reply.status);
            span.record("latency_us", latency.as_micros() as u64);
            info!(
                status = reply.status,
                latency_us = latency.as_micros() as u64,
                "Request handled"
            );
            reply
        })
    }
}
