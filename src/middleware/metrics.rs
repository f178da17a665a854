use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::Middleware;
use crate::dispatcher::Handler;
use crate::server::RequestContext;

#[derive(Default)]
struct Counters {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    client_errors: AtomicUsize,
    server_errors: AtomicUsize,
}

/// Request counters shared by every handler the middleware wraps.
///
/// All counters use atomic operations for thread-safe updates without locks.
/// Clones share the same counters.
///
/// Metrics collected:
/// - Total request count
/// - Average latency of the wrapped handler
/// - Replies with a 4xx status
/// - Replies with a 5xx status
#[derive(Clone, Default)]
pub struct MetricsMiddleware {
    counters: Arc<Counters>,
}

impl MetricsMiddleware {
    /// Create a new metrics middleware with all counters initialized to zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    pub fn request_count(&self) -> usize {
        self.counters.request_count.load(Ordering::Relaxed)
    }

    /// Calculate the average request latency
    ///
    /// Returns zero duration if no requests have been processed yet.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count() as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.counters.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    pub fn client_errors(&self) -> usize {
        self.counters.client_errors.load(Ordering::Relaxed)
    }

    pub fn server_errors(&self) -> usize {
        self.counters.server_errors.load(Ordering::Relaxed)
    }

    fn record(&self, status: u16, latency: Duration) {
        let c = &self.counters;
        c.request_count.fetch_add(1, Ordering::Relaxed);
        c.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        match status {
            400..=499 => {
                c.client_errors.fetch_add(1, Ordering::Relaxed);
            }
            500..=599 => {
                c.server_errors.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }
}

impl Middleware for MetricsMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        let metrics = self.clone();
        Arc::new(move |ctx: &RequestContext| {
            let start = Instant::now();
            let reply = next(ctx);
            metrics.record(reply.status, start.elapsed());
            reply
        })
    }
}
