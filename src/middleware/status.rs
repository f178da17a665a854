use std::sync::Arc;

use super::Middleware;
use crate::dispatcher::Handler;
use crate::server::RequestContext;

/// Forces the status of every reply that passes through it, keeping the
/// envelope. `StatusOverride(418)` turns any answer into a teapot.
#[derive(Debug, Clone, Copy)]
pub struct StatusOverride(pub u16);

impl Middleware for StatusOverride {
    fn wrap(&self, next: Handler) -> Handler {
        let status = self.0;
        Arc::new(move |ctx: &RequestContext| {
            let mut reply = next(ctx);
            reply.status = status;
            reply
        })
    }
}
